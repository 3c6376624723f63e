//! Per-address balance ledger with coinbase maturity
//!
//! Coinbase rewards are credited as immature, keyed by the height that created
//! them, and folded into the mature balance lazily: every read or debit of an
//! address first moves whatever has matured by the current height. Maturity
//! depends on the creation height, so it cannot be swept once up front.

use crate::params::{format_coins, CoinbaseMaturity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

/// Destination of an output, as decoded by the node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Key for an output the node could not map to a single address
    pub fn from_script_hex(script_hex: &str) -> Self {
        Self(format!("script:{}", script_hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Debit failures. The ledger is left unchanged when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("can't debit {}: address {address} is unknown", coins(.amount))]
    UnknownAddress { address: Address, amount: u64 },
    #[error(
        "can't debit {}: not enough coins on address {address}, balance {}",
        coins(.required),
        coins(.available)
    )]
    InsufficientBalance {
        address: Address,
        available: u64,
        required: u64,
    },
}

fn coins(amount: &u64) -> String {
    format_coins(*amount)
}

/// Mature and immature balances per address
#[derive(Debug, Clone)]
pub struct BalanceLedger {
    maturity: CoinbaseMaturity,
    mature: HashMap<Address, u64>,
    /// address -> creation height -> amount
    immature: HashMap<Address, BTreeMap<u64, u64>>,
}

impl BalanceLedger {
    pub fn new(maturity: CoinbaseMaturity) -> Self {
        Self {
            maturity,
            mature: HashMap::new(),
            immature: HashMap::new(),
        }
    }

    /// Record a coinbase output created at `height`.
    /// Several credits to one address at one height add up.
    pub fn credit_immature(&mut self, address: &Address, amount: u64, height: u64) {
        if amount == 0 {
            return;
        }
        *self
            .immature
            .entry(address.clone())
            .or_default()
            .entry(height)
            .or_insert(0) += amount;
    }

    /// Record a spendable output
    pub fn credit_mature(&mut self, address: &Address, amount: u64) {
        if amount == 0 {
            return;
        }
        *self.mature.entry(address.clone()).or_insert(0) += amount;
    }

    /// Move every immature entry of `address` that has matured by `current_height`.
    /// Returns the amount moved.
    pub fn fold_matured(&mut self, address: &Address, current_height: u64) -> u64 {
        let Some(pending) = self.immature.get_mut(address) else {
            return 0;
        };

        let maturity = self.maturity;
        let mut moved = 0u64;
        pending.retain(|&height, &mut amount| {
            if maturity.is_mature(height, current_height) {
                moved += amount;
                false
            } else {
                true
            }
        });

        if pending.is_empty() {
            self.immature.remove(address);
        }
        if moved > 0 {
            *self.mature.entry(address.clone()).or_insert(0) += moved;
        }
        moved
    }

    /// Fold every address at `current_height`
    pub fn fold_all(&mut self, current_height: u64) {
        let addresses: Vec<Address> = self.immature.keys().cloned().collect();
        for address in &addresses {
            self.fold_matured(address, current_height);
        }
    }

    /// Spend `amount` from the mature balance of `address`
    pub fn debit(
        &mut self,
        address: &Address,
        amount: u64,
        current_height: u64,
    ) -> Result<(), LedgerError> {
        self.fold_matured(address, current_height);

        let Some(balance) = self.mature.get_mut(address) else {
            return Err(LedgerError::UnknownAddress {
                address: address.clone(),
                amount,
            });
        };

        if *balance < amount {
            return Err(LedgerError::InsufficientBalance {
                address: address.clone(),
                available: *balance,
                required: amount,
            });
        }

        *balance -= amount;
        if *balance == 0 {
            self.mature.remove(address);
        }
        Ok(())
    }

    /// Mature balance of `address` as of `current_height`
    pub fn balance_of(&mut self, address: &Address, current_height: u64) -> u64 {
        self.fold_matured(address, current_height);
        self.mature.get(address).copied().unwrap_or(0)
    }

    /// Mature balance without folding
    pub fn mature_balance(&self, address: &Address) -> u64 {
        self.mature.get(address).copied().unwrap_or(0)
    }

    /// Sum of unfolded immature amounts for `address`
    pub fn immature_balance(&self, address: &Address) -> u64 {
        self.immature
            .get(address)
            .map(|pending| pending.values().sum::<u64>())
            .unwrap_or(0)
    }

    pub fn total_mature(&self) -> u64 {
        self.mature.values().sum()
    }

    pub fn total_immature(&self) -> u64 {
        self.immature.values().flat_map(|p| p.values()).sum()
    }

    /// Mature balances sorted by address
    pub fn mature_balances(&self) -> Vec<(&Address, u64)> {
        let mut balances: Vec<_> = self.mature.iter().map(|(a, v)| (a, *v)).collect();
        balances.sort();
        balances
    }

    /// Immature totals sorted by address
    pub fn immature_balances(&self) -> Vec<(&Address, u64)> {
        let mut balances: Vec<_> = self
            .immature
            .iter()
            .map(|(a, pending)| (a, pending.values().sum::<u64>()))
            .collect();
        balances.sort();
        balances
    }

    /// Number of addresses holding mature coins
    pub fn address_count(&self) -> usize {
        self.mature.len()
    }
}
