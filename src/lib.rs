//! Lynx-audit: checks a Lynx chain's history against its hard-fork mining rules
//!
//! The audit walks every block of a running node over JSON-RPC and:
//! - Rebuilds per-address balances, holding coinbase rewards as immature until
//!   they reach the network's coinbase maturity
//! - Rule 1: flags reward addresses reused within the lookback window
//! - Rule 2: flags miners whose mature balance is below the difficulty-derived minimum
//! - Rule 3: flags blocks whose hash does not share a hex suffix with the
//!   SHA-256 of the reward address
//!
//! # Example
//!
//! ```rust,no_run
//! use lynx_audit::core::{AuditConfig, Auditor};
//! use lynx_audit::params::NetworkParams;
//! use lynx_audit::rpc::{NodeClient, NodeConfig};
//! use std::path::Path;
//!
//! let params = NetworkParams::from_name("regtest").unwrap();
//! let config = NodeConfig::load(Path::new("lynx.conf"), &params).unwrap();
//! let client = NodeClient::new(&config).unwrap();
//!
//! let mut auditor = Auditor::new(params, AuditConfig::default());
//! let summary = auditor.run(&client, |finding| println!("{}", finding)).unwrap();
//! println!("{} violations", summary.total_violations());
//! ```

pub mod cli;
pub mod core;
pub mod crypto;
pub mod params;
pub mod rpc;
pub mod storage;

// Re-export commonly used types
pub use crate::core::{
    Address, AuditConfig, AuditError, AuditSummary, Auditor, BalanceLedger, ChainWalker, Finding,
    LedgerError, RewardHistory, Rule, RuleChecker, Violation,
};
pub use crate::params::{NetworkParams, NetworkType, ParamsError, COIN};
pub use crate::rpc::{ChainSource, NodeClient, NodeConfig, RpcError};
pub use crate::storage::OutputCache;
