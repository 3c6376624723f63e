//! In-memory chain for walker and audit tests

use crate::crypto::sha256_hex;
use crate::params::COIN;
use crate::rpc::{ChainSource, RpcBlock, RpcError, RpcInput, RpcOutput, RpcTransaction, ScriptPubKey};
use std::cell::Cell;
use std::collections::HashMap;

/// Coinbase value paid by `MockChain::mine`
pub const MOCK_REWARD: u64 = 50 * COIN;

/// A spending transaction to include in a mock block
pub struct MockTx {
    inputs: Vec<(String, u32)>,
    outputs: Vec<(String, u64)>,
}

impl MockTx {
    pub fn spend(inputs: &[(&str, u32)], outputs: &[(&str, u64)]) -> Self {
        Self {
            inputs: inputs.iter().map(|(t, n)| (t.to_string(), *n)).collect(),
            outputs: outputs.iter().map(|(a, v)| (a.to_string(), *v)).collect(),
        }
    }
}

#[derive(Default)]
pub struct MockChain {
    blocks: Vec<RpcBlock>,
    transactions: HashMap<String, RpcTransaction>,
    difficulty: f64,
    raw_calls: Cell<usize>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            difficulty: 1.0,
            ..Default::default()
        }
    }

    /// Difficulty recorded on blocks mined from now on
    pub fn set_difficulty(&mut self, difficulty: f64) {
        self.difficulty = difficulty;
    }

    /// Mine a block paying `MOCK_REWARD` to `miner`; returns the coinbase txid
    pub fn mine(&mut self, miner: &str, txs: Vec<MockTx>) -> String {
        self.mine_with_coinbase(&[(miner, MOCK_REWARD)], txs)
    }

    pub fn mine_with_coinbase(&mut self, rewards: &[(&str, u64)], txs: Vec<MockTx>) -> String {
        let height = self.blocks.len() as u64;

        let coinbase_id = format!("cb{}", height);
        let coinbase = RpcTransaction {
            txid: coinbase_id.clone(),
            vin: vec![RpcInput {
                coinbase: Some(format!("{:02x}", height)),
                txid: None,
                vout: None,
            }],
            vout: outputs(rewards.iter().map(|(a, v)| (a.to_string(), *v))),
        };

        let mut block_txs = vec![coinbase];
        for (i, tx) in txs.into_iter().enumerate() {
            block_txs.push(RpcTransaction {
                txid: format!("tx{}_{}", height, i),
                vin: tx
                    .inputs
                    .into_iter()
                    .map(|(txid, vout)| RpcInput {
                        coinbase: None,
                        txid: Some(txid),
                        vout: Some(vout),
                    })
                    .collect(),
                vout: outputs(tx.outputs.into_iter()),
            });
        }

        for tx in &block_txs {
            self.transactions.insert(tx.txid.clone(), tx.clone());
        }

        self.blocks.push(RpcBlock {
            hash: sha256_hex(format!("block{}", height).as_bytes()),
            height,
            difficulty: self.difficulty,
            time: 1_500_000_000 + height as i64 * 60,
            tx: block_txs,
        });
        coinbase_id
    }

    pub fn hash_at(&self, height: u64) -> &str {
        &self.blocks[height as usize].hash
    }

    /// Number of `raw_transaction` calls served so far
    pub fn raw_transaction_calls(&self) -> usize {
        self.raw_calls.get()
    }
}

fn outputs(values: impl Iterator<Item = (String, u64)>) -> Vec<RpcOutput> {
    values
        .enumerate()
        .map(|(n, (address, amount))| RpcOutput {
            value: amount as f64 / COIN as f64,
            n: n as u32,
            script_pub_key: ScriptPubKey {
                hex: String::new(),
                address: Some(address),
                addresses: Vec::new(),
            },
        })
        .collect()
}

fn not_found(what: &str) -> RpcError {
    RpcError::Node {
        code: -5,
        message: format!("{} not found", what),
    }
}

impl ChainSource for MockChain {
    fn block_count(&self) -> Result<u64, RpcError> {
        match self.blocks.len() {
            0 => Err(not_found("genesis block")),
            n => Ok(n as u64 - 1),
        }
    }

    fn block_hash(&self, height: u64) -> Result<String, RpcError> {
        self.blocks
            .get(height as usize)
            .map(|b| b.hash.clone())
            .ok_or_else(|| not_found("block height"))
    }

    fn block(&self, hash: &str) -> Result<RpcBlock, RpcError> {
        self.blocks
            .iter()
            .find(|b| b.hash == hash)
            .cloned()
            .ok_or_else(|| not_found("block"))
    }

    fn raw_transaction(&self, txid: &str) -> Result<RpcTransaction, RpcError> {
        self.raw_calls.set(self.raw_calls.get() + 1);
        self.transactions
            .get(txid)
            .cloned()
            .ok_or_else(|| not_found("transaction"))
    }
}
