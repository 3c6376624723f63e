//! Lynx network definitions
//!
//! Fork heights and rule tunables for mainnet, testnet and regtest. The values
//! mirror the node's consensus parameters and must not be changed independently.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Base units per coin
pub const COIN: u64 = 100_000_000;

/// Parameter selection errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("incorrect network '{0}', choose one of mainnet/testnet/regtest")]
    InvalidNetwork(String),
}

/// Network type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// Mainnet
    Mainnet,
    /// Testnet
    Testnet,
    /// Regtest (local development)
    Regtest,
}

impl NetworkType {
    pub const fn name(&self) -> &'static str {
        match self {
            NetworkType::Mainnet => "mainnet",
            NetworkType::Testnet => "testnet",
            NetworkType::Regtest => "regtest",
        }
    }

    /// Section name used by the node config file for this network
    pub const fn config_section(&self) -> &'static str {
        match self {
            NetworkType::Mainnet => "main",
            NetworkType::Testnet => "test",
            NetworkType::Regtest => "regtest",
        }
    }
}

impl FromStr for NetworkType {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(NetworkType::Mainnet),
            "testnet" => Ok(NetworkType::Testnet),
            "regtest" => Ok(NetworkType::Regtest),
            other => Err(ParamsError::InvalidNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coinbase maturity schedule: a single step at hard fork 2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinbaseMaturity {
    /// Confirmations required up to and including the fork 2 height
    pub before_fork: u64,
    /// Confirmations required after the fork 2 height
    pub after_fork: u64,
    /// `None` when every height counts as past fork 2
    pub hard_fork2_height: Option<u64>,
}

impl CoinbaseMaturity {
    /// Depth a coinbase output created at `height` needs before it is spendable
    pub const fn at(&self, height: u64) -> u64 {
        match self.hard_fork2_height {
            Some(fork) if height <= fork => self.before_fork,
            _ => self.after_fork,
        }
    }

    /// Whether an output created at `height` is mature at `current_height`
    pub const fn is_mature(&self, height: u64, current_height: u64) -> bool {
        current_height.saturating_sub(height) >= self.at(height)
            && current_height >= height
    }
}

/// Consensus parameters relevant to the hard-fork rule audit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkParams {
    /// Network type
    pub network_type: NetworkType,
    /// Rule 1 (address reuse) activates above this height
    pub hard_fork4_height: u64,
    /// Rule 2 (coin-age eligibility) activates above this height
    pub hard_fork5_height: u64,
    /// Rule 3 (address/hash affinity) activates above this height
    pub hard_fork6_height: u64,
    /// Rule 1 lookback window in blocks
    pub hard_fork4_address_prev_block_count: u64,
    /// Rule 2 exponent applied to difficulty
    pub hard_fork5_coin_age_pow: i32,
    /// Rule 2 reads difficulty this many blocks (plus one) back
    pub hard_fork5_difficulty_prev_block_count: u64,
    /// Rule 2 lower bound, base units
    pub hard_fork5_lower_limit_min_balance: u64,
    /// Rule 2 upper bound, base units
    pub hard_fork5_upper_limit_min_balance: u64,
    /// Rule 3 hex suffix length
    pub hard_fork6_check_last_chars_count: usize,
    /// Coinbase maturity schedule
    pub coinbase_maturity: CoinbaseMaturity,
    /// Default JSON-RPC port of the node
    pub rpc_port: u16,
    /// Sub-directory of the node data directory holding this network's files
    pub data_subdir: &'static str,
}

impl NetworkParams {
    /// Get mainnet parameters
    pub const fn mainnet() -> Self {
        Self {
            network_type: NetworkType::Mainnet,
            hard_fork4_height: 99_999_999,
            hard_fork5_height: 99_999_999,
            hard_fork6_height: 99_999_999,
            hard_fork4_address_prev_block_count: 60,
            hard_fork5_coin_age_pow: 4,
            hard_fork5_difficulty_prev_block_count: 10,
            hard_fork5_lower_limit_min_balance: 1_000 * COIN,
            hard_fork5_upper_limit_min_balance: 100_000_000 * COIN,
            hard_fork6_check_last_chars_count: 2,
            coinbase_maturity: CoinbaseMaturity {
                before_fork: 30,
                after_fork: 20_160,
                hard_fork2_height: Some(1_711_675),
            },
            rpc_port: 9332,
            data_subdir: "",
        }
    }

    /// Get testnet parameters
    pub const fn testnet() -> Self {
        Self {
            network_type: NetworkType::Testnet,
            hard_fork4_height: 400,
            hard_fork5_height: 500,
            hard_fork6_height: 600,
            hard_fork4_address_prev_block_count: 10,
            hard_fork5_coin_age_pow: 2,
            hard_fork5_difficulty_prev_block_count: 10,
            hard_fork5_lower_limit_min_balance: COIN,
            hard_fork5_upper_limit_min_balance: 100_000_000 * COIN,
            hard_fork6_check_last_chars_count: 1,
            coinbase_maturity: CoinbaseMaturity {
                before_fork: 30,
                after_fork: 30,
                hard_fork2_height: Some(200),
            },
            rpc_port: 19332,
            data_subdir: "testnet4",
        }
    }

    /// Get regtest parameters
    pub const fn regtest() -> Self {
        Self {
            network_type: NetworkType::Regtest,
            hard_fork4_height: 35,
            hard_fork5_height: 40,
            hard_fork6_height: 45,
            hard_fork4_address_prev_block_count: 2,
            hard_fork5_coin_age_pow: 1,
            hard_fork5_difficulty_prev_block_count: 10,
            hard_fork5_lower_limit_min_balance: COIN,
            hard_fork5_upper_limit_min_balance: 100_000_000 * COIN,
            hard_fork6_check_last_chars_count: 1,
            coinbase_maturity: CoinbaseMaturity {
                before_fork: 2,
                after_fork: 2,
                hard_fork2_height: None,
            },
            rpc_port: 19443,
            data_subdir: "regtest",
        }
    }

    /// Get network by type
    pub const fn from_type(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Testnet => Self::testnet(),
            NetworkType::Regtest => Self::regtest(),
        }
    }

    /// Select parameters by network name
    pub fn from_name(name: &str) -> Result<Self, ParamsError> {
        name.parse().map(Self::from_type)
    }

    pub const fn name(&self) -> &'static str {
        self.network_type.name()
    }

    /// Coinbase maturity for an output created at `height`
    pub const fn maturity(&self, height: u64) -> u64 {
        self.coinbase_maturity.at(height)
    }

    pub const fn is_rule1_active(&self, height: u64) -> bool {
        height > self.hard_fork4_height
    }

    pub const fn is_rule2_active(&self, height: u64) -> bool {
        height > self.hard_fork5_height
    }

    pub const fn is_rule3_active(&self, height: u64) -> bool {
        height > self.hard_fork6_height
    }
}

/// Formats a base-unit amount as coins with eight decimals
pub fn format_coins(amount: u64) -> String {
    format!("{}.{:08}", amount / COIN, amount % COIN)
}
