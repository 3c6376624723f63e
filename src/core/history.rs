//! Per-block reward history
//!
//! One record per walked block, indexed by height. The address-reuse rule
//! looks back over reward address sets; the coin-age rule reads difficulty
//! of an earlier block, which has always been walked already.

use super::ledger::Address;
use std::collections::BTreeSet;

/// What the audit remembers about a walked block
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRecord {
    /// Addresses of all significant coinbase outputs
    pub reward_addresses: BTreeSet<Address>,
    pub difficulty: f64,
}

/// Append-only history of walked blocks
#[derive(Debug, Clone, Default)]
pub struct RewardHistory {
    blocks: Vec<BlockRecord>,
}

impl RewardHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the record for the next height; returns that height
    pub fn push(&mut self, record: BlockRecord) -> u64 {
        self.blocks.push(record);
        self.blocks.len() as u64 - 1
    }

    pub fn get(&self, height: u64) -> Option<&BlockRecord> {
        usize::try_from(height).ok().and_then(|h| self.blocks.get(h))
    }

    pub fn difficulty_at(&self, height: u64) -> Option<f64> {
        self.get(height).map(|record| record.difficulty)
    }

    /// Records of the `count` blocks before `height`, oldest first, with heights.
    /// The window is clamped at height 0.
    pub fn window_before(&self, height: u64, count: u64) -> impl Iterator<Item = (u64, &BlockRecord)> {
        let start = height.saturating_sub(count);
        (start..height).filter_map(move |h| self.get(h).map(|record| (h, record)))
    }

    /// Number of recorded blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
