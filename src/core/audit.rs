//! Audit driver
//!
//! Walks the chain once, checks each block against the rules, then applies the
//! block's transactions to the ledger. Findings are handed to a callback as
//! they happen so the caller can print them without buffering the run.

use super::history::{BlockRecord, RewardHistory};
use super::ledger::{BalanceLedger, LedgerError};
use super::rules::{Rule, RuleChecker, Violation};
use super::walker::{ChainWalker, WalkedBlock};
use crate::params::NetworkParams;
use crate::rpc::{ChainSource, RpcError};
use crate::storage::{CacheStats, OutputCache, DEFAULT_CACHE_SIZE};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default number of blocks between progress log lines
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000;

/// Audit run errors. Any of them ends the run.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("RPC failure: {0}")]
    Rpc(#[from] RpcError),
    #[error("block {height} tx {txid}: {error}")]
    Ledger {
        height: u64,
        txid: String,
        error: LedgerError,
    },
}

/// Audit configuration
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Treat ledger debit failures as fatal
    pub strict: bool,
    /// Output cache capacity, 0 disables it
    pub cache_size: usize,
    /// Blocks between progress log lines, 0 disables them
    pub progress_every: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            strict: false,
            cache_size: DEFAULT_CACHE_SIZE,
            progress_every: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Something the audit reports
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    Violation(Violation),
    /// A spend the ledger could not apply; the ledger is stale for this address from here on
    LedgerError {
        height: u64,
        txid: String,
        error: LedgerError,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::Violation(v) => write!(f, "Error! {}", v),
            Finding::LedgerError {
                height,
                txid,
                error,
            } => write!(f, "Error! Block {} tx {}: {}", height, txid, error),
        }
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, Default)]
pub struct AuditSummary {
    pub blocks_checked: u64,
    pub tip: u64,
    pub violations: BTreeMap<Rule, u64>,
    pub ledger_errors: u64,
    pub cache: CacheStats,
    pub elapsed: Duration,
}

impl AuditSummary {
    pub fn total_violations(&self) -> u64 {
        self.violations.values().sum()
    }

    pub fn violations_for(&self, rule: Rule) -> u64 {
        self.violations.get(&rule).copied().unwrap_or(0)
    }
}

/// Owns the ledger and reward history for one pass over the chain
pub struct Auditor {
    checker: RuleChecker,
    ledger: BalanceLedger,
    history: RewardHistory,
    config: AuditConfig,
}

impl Auditor {
    pub fn new(params: NetworkParams, config: AuditConfig) -> Self {
        Self {
            ledger: BalanceLedger::new(params.coinbase_maturity),
            checker: RuleChecker::new(params),
            history: RewardHistory::new(),
            config,
        }
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut BalanceLedger {
        &mut self.ledger
    }

    pub fn history(&self) -> &RewardHistory {
        &self.history
    }

    /// Walk `source` from genesis to its current tip
    pub fn run<S, F>(&mut self, source: &S, mut on_finding: F) -> Result<AuditSummary, AuditError>
    where
        S: ChainSource,
        F: FnMut(&Finding),
    {
        let started = Instant::now();
        let mut walker = ChainWalker::new(source, OutputCache::with_capacity(self.config.cache_size))?;
        let mut summary = AuditSummary {
            tip: walker.tip(),
            ..Default::default()
        };
        log::info!("Auditing {} blocks on {}", walker.tip() + 1, self.checker.params().name());

        for block in walker.by_ref() {
            let block = block?;

            for finding in self.process_block(&block)? {
                match &finding {
                    Finding::Violation(v) => *summary.violations.entry(v.rule()).or_insert(0) += 1,
                    Finding::LedgerError { .. } => summary.ledger_errors += 1,
                }
                on_finding(&finding);
            }
            summary.blocks_checked += 1;

            if self.config.progress_every > 0 && block.height % self.config.progress_every == 0 {
                log_progress(&block, summary.tip);
            }
        }

        summary.cache = walker.cache_stats().clone();
        summary.elapsed = started.elapsed();
        log::debug!(
            "output cache: {} hits, {} misses, {} evictions",
            summary.cache.hits,
            summary.cache.misses,
            summary.cache.evictions
        );
        Ok(summary)
    }

    /// Check one block, then apply it to the ledger and history.
    /// Blocks must arrive in height order starting at genesis.
    pub fn process_block(&mut self, block: &WalkedBlock) -> Result<Vec<Finding>, AuditError> {
        let mut findings: Vec<Finding> = self
            .checker
            .check_block(block, &self.history, &mut self.ledger)
            .into_iter()
            .map(Finding::Violation)
            .collect();

        self.history.push(BlockRecord {
            reward_addresses: block.reward_addresses().cloned().collect(),
            difficulty: block.difficulty,
        });

        for out in block.coinbase.iter().filter(|o| o.is_significant()) {
            self.ledger.credit_immature(&out.address, out.amount, block.height);
        }

        for tx in &block.transactions {
            for input in tx.inputs.iter().filter(|i| i.is_significant()) {
                if let Err(error) = self.ledger.debit(&input.address, input.amount, block.height) {
                    if self.config.strict {
                        return Err(AuditError::Ledger {
                            height: block.height,
                            txid: tx.txid.clone(),
                            error,
                        });
                    }
                    log::debug!("block {} tx {}: {}", block.height, tx.txid, error);
                    findings.push(Finding::LedgerError {
                        height: block.height,
                        txid: tx.txid.clone(),
                        error,
                    });
                }
            }

            for out in tx.outputs.iter().filter(|o| o.is_significant()) {
                self.ledger.credit_mature(&out.address, out.amount);
            }
        }

        Ok(findings)
    }
}

fn log_progress(block: &WalkedBlock, tip: u64) {
    let time = DateTime::<Utc>::from_timestamp(block.time, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| block.time.to_string());
    log::info!("Checked block {}/{} ({})", block.height, tip, time);
}
