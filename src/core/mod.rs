//! Core audit components
//!
//! This module contains the audit pipeline:
//! - Chain walker (sequential block fetch with input resolution)
//! - Balance ledger (mature/immature balances per address)
//! - Reward history (per-block reward addresses and difficulty)
//! - Rule checker (the three hard-fork mining rules)
//! - Auditor (drives one pass over the chain)

pub mod audit;
pub mod history;
pub mod ledger;
pub mod rules;
pub mod walker;

#[cfg(test)]
pub(crate) mod mock;

pub use audit::{
    AuditConfig, AuditError, AuditSummary, Auditor, Finding, DEFAULT_PROGRESS_INTERVAL,
};
pub use history::{BlockRecord, RewardHistory};
pub use ledger::{Address, BalanceLedger, LedgerError};
pub use rules::{Rule, RuleChecker, Violation};
pub use walker::{ChainWalker, TxOut, WalkedBlock, WalkedTransaction};
