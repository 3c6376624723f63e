//! Hard-fork mining rules
//!
//! Each rule applies strictly above its fork height:
//! - Rule 1: a block's reward addresses must not have been rewarded in the
//!   previous `HardFork4AddressPrevBlockCount` blocks
//! - Rule 2: the reward address must hold a mature balance of at least
//!   `difficulty ^ HardFork5CoinAgePow` coins, clamped to the configured bounds
//! - Rule 3: the SHA-256 of the reward address and the block hash must end
//!   with the same `HardFork6CheckLastCharsCount` hex characters
//!
//! Violations are findings, not errors; they never alter the walk.

use super::history::RewardHistory;
use super::ledger::{Address, BalanceLedger};
use super::walker::WalkedBlock;
use crate::crypto::{hex_suffix, sha256_hex};
use crate::params::{format_coins, NetworkParams, COIN};
use std::collections::BTreeSet;
use std::fmt;

/// The rule a violation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rule {
    AddressReuse,
    CoinAge,
    HashAffinity,
}

impl Rule {
    pub fn number(&self) -> u8 {
        match self {
            Rule::AddressReuse => 1,
            Rule::CoinAge => 2,
            Rule::HashAffinity => 3,
        }
    }
}

/// A block that breaks one of the rules
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    AddressReuse {
        height: u64,
        address: Address,
        previous_height: u64,
    },
    InsufficientCoinAge {
        height: u64,
        address: Address,
        balance: u64,
        required: u64,
    },
    HashAffinity {
        height: u64,
        address_hash: String,
        block_hash: String,
        chars: usize,
    },
    /// A rule 2/3 block whose coinbase pays nothing
    MissingRewardAddress { height: u64, rule: Rule },
}

impl Violation {
    pub fn rule(&self) -> Rule {
        match self {
            Violation::AddressReuse { .. } => Rule::AddressReuse,
            Violation::InsufficientCoinAge { .. } => Rule::CoinAge,
            Violation::HashAffinity { .. } => Rule::HashAffinity,
            Violation::MissingRewardAddress { rule, .. } => *rule,
        }
    }

    pub fn height(&self) -> u64 {
        match self {
            Violation::AddressReuse { height, .. }
            | Violation::InsufficientCoinAge { height, .. }
            | Violation::HashAffinity { height, .. }
            | Violation::MissingRewardAddress { height, .. } => *height,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::AddressReuse {
                height,
                address,
                previous_height,
            } => write!(
                f,
                "Block {} RULE 1! address {} was already rewarded in block {}",
                height, address, previous_height
            ),
            Violation::InsufficientCoinAge {
                height,
                address,
                balance,
                required,
            } => write!(
                f,
                "Block {} RULE 2! Not enough coins for mining on address {}. Got {}, required {}",
                height,
                address,
                format_coins(*balance),
                format_coins(*required)
            ),
            Violation::HashAffinity {
                height,
                address_hash,
                block_hash,
                chars,
            } => write!(
                f,
                "Block {} RULE 3! Address hash {} and block hash {} don't end on the same {} chars",
                height, address_hash, block_hash, chars
            ),
            Violation::MissingRewardAddress { height, rule } => write!(
                f,
                "Block {} RULE {}! coinbase has no significant output to check",
                height,
                rule.number()
            ),
        }
    }
}

/// Applies the fork-gated rules to walked blocks
#[derive(Debug, Clone)]
pub struct RuleChecker {
    params: NetworkParams,
}

impl RuleChecker {
    pub fn new(params: NetworkParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    /// Check one block. `history` holds every earlier block; `ledger` reflects
    /// all earlier blocks' transactions but none of this block's.
    pub fn check_block(
        &self,
        block: &WalkedBlock,
        history: &RewardHistory,
        ledger: &mut BalanceLedger,
    ) -> Vec<Violation> {
        let height = block.height;
        let mut violations = Vec::new();

        if self.params.is_rule1_active(height) {
            let current: BTreeSet<Address> = block.reward_addresses().cloned().collect();
            violations.extend(self.check_address_reuse(height, &current, history));
        }

        if self.params.is_rule2_active(height) {
            match block.reward_address() {
                Some(address) => {
                    let balance = ledger.balance_of(address, height);
                    let difficulty = self.reference_difficulty(height, history);
                    violations.extend(self.check_coin_age(height, address, balance, difficulty));
                }
                None => violations.push(Violation::MissingRewardAddress {
                    height,
                    rule: Rule::CoinAge,
                }),
            }
        }

        if self.params.is_rule3_active(height) {
            match block.reward_address() {
                Some(address) => {
                    violations.extend(self.check_hash_affinity(height, address, &block.hash))
                }
                None => violations.push(Violation::MissingRewardAddress {
                    height,
                    rule: Rule::HashAffinity,
                }),
            }
        }

        violations
    }

    /// Rule 1: one violation per earlier block in the window sharing an address
    pub fn check_address_reuse(
        &self,
        height: u64,
        current: &BTreeSet<Address>,
        history: &RewardHistory,
    ) -> Vec<Violation> {
        history
            .window_before(height, self.params.hard_fork4_address_prev_block_count)
            .filter_map(|(previous_height, record)| {
                current
                    .intersection(&record.reward_addresses)
                    .next()
                    .map(|address| Violation::AddressReuse {
                        height,
                        address: address.clone(),
                        previous_height,
                    })
            })
            .collect()
    }

    /// Difficulty rule 2 reads for a block at `height`
    pub fn reference_difficulty(&self, height: u64, history: &RewardHistory) -> f64 {
        let offset = self.params.hard_fork5_difficulty_prev_block_count + 1;
        match height.checked_sub(offset) {
            Some(reference) => history.difficulty_at(reference).unwrap_or_else(|| {
                log::warn!("no difficulty recorded for block {}, using 1.0", reference);
                1.0
            }),
            None => 1.0,
        }
    }

    /// Minimum mature balance required to mine at `difficulty`, in base units
    pub fn min_balance_for_mining(&self, difficulty: f64) -> u64 {
        let lower = self.params.hard_fork5_lower_limit_min_balance;
        let upper = self.params.hard_fork5_upper_limit_min_balance;

        let required = difficulty.powi(self.params.hard_fork5_coin_age_pow) * COIN as f64;
        if !required.is_finite() || required > upper as f64 {
            return upper;
        }
        (required as u64).max(lower)
    }

    /// Rule 2
    pub fn check_coin_age(
        &self,
        height: u64,
        address: &Address,
        balance: u64,
        difficulty: f64,
    ) -> Option<Violation> {
        let required = self.min_balance_for_mining(difficulty);
        (balance < required).then(|| Violation::InsufficientCoinAge {
            height,
            address: address.clone(),
            balance,
            required,
        })
    }

    /// Rule 3
    pub fn check_hash_affinity(
        &self,
        height: u64,
        address: &Address,
        block_hash: &str,
    ) -> Option<Violation> {
        let chars = self.params.hard_fork6_check_last_chars_count;
        let address_hash = sha256_hex(address.as_str().as_bytes());
        let block_hash = block_hash.to_ascii_lowercase();

        (hex_suffix(&address_hash, chars) != hex_suffix(&block_hash, chars)).then(|| {
            Violation::HashAffinity {
                height,
                address_hash,
                block_hash,
                chars,
            }
        })
    }
}
