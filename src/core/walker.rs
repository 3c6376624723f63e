//! Sequential chain walker
//!
//! Yields every block from genesis to the tip observed at construction, with
//! each spending input resolved to the output it consumes. Resolution goes
//! through the output cache first and falls back to `getrawtransaction`.

use super::ledger::Address;
use crate::rpc::{ChainSource, RpcError, RpcOutput, RpcTransaction};
use crate::storage::{CacheStats, OutputCache};

/// A resolved transaction output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    pub address: Address,
    pub amount: u64,
}

impl TxOut {
    /// Zero-value outputs never move coins and are ignored by the audit
    pub fn is_significant(&self) -> bool {
        self.amount > 0
    }

    fn from_rpc(output: &RpcOutput) -> Result<Self, RpcError> {
        let address = match output.script_pub_key.single_address() {
            Some(address) => Address::new(address),
            None => Address::from_script_hex(&output.script_pub_key.hex),
        };
        Ok(Self {
            address,
            amount: output.amount()?,
        })
    }
}

/// A non-coinbase transaction with its inputs resolved
#[derive(Debug, Clone)]
pub struct WalkedTransaction {
    pub txid: String,
    /// Outputs consumed by this transaction's inputs, in input order
    pub inputs: Vec<TxOut>,
    pub outputs: Vec<TxOut>,
}

/// One block as seen by the audit
#[derive(Debug, Clone)]
pub struct WalkedBlock {
    pub height: u64,
    /// Display-order hex hash
    pub hash: String,
    pub difficulty: f64,
    /// Block timestamp, seconds since the epoch
    pub time: i64,
    pub coinbase: Vec<TxOut>,
    pub transactions: Vec<WalkedTransaction>,
}

impl WalkedBlock {
    /// Addresses of significant coinbase outputs, in output order
    pub fn reward_addresses(&self) -> impl Iterator<Item = &Address> {
        self.coinbase
            .iter()
            .filter(|out| out.is_significant())
            .map(|out| &out.address)
    }

    /// Address of the first significant coinbase output
    pub fn reward_address(&self) -> Option<&Address> {
        self.reward_addresses().next()
    }
}

/// Forward-only iterator over blocks `0..=tip`
pub struct ChainWalker<'a, S: ChainSource> {
    source: &'a S,
    next_height: u64,
    tip: u64,
    cache: OutputCache,
    failed: bool,
}

impl<'a, S: ChainSource> ChainWalker<'a, S> {
    /// Read the current tip and prepare to walk from genesis
    pub fn new(source: &'a S, cache: OutputCache) -> Result<Self, RpcError> {
        let tip = source.block_count()?;
        Ok(Self {
            source,
            next_height: 0,
            tip,
            cache,
            failed: false,
        })
    }

    /// Height of the last block this walk will yield
    pub fn tip(&self) -> u64 {
        self.tip
    }

    pub fn cache_stats(&self) -> &CacheStats {
        self.cache.stats()
    }

    fn fetch(&mut self, height: u64) -> Result<WalkedBlock, RpcError> {
        let hash = self.source.block_hash(height)?;
        let block = self.source.block(&hash)?;
        if block.height != height {
            return Err(RpcError::InvalidData(format!(
                "block {} was returned for height {}",
                block.height, height
            )));
        }

        let mut txs = block.tx.iter();
        let coinbase_tx = txs
            .next()
            .filter(|tx| tx.is_coinbase())
            .ok_or_else(|| {
                RpcError::InvalidData(format!("block {} has no coinbase transaction", height))
            })?;

        let coinbase = self.outputs_of(coinbase_tx)?;

        let mut transactions = Vec::with_capacity(block.tx.len().saturating_sub(1));
        for tx in txs {
            let mut inputs = Vec::with_capacity(tx.vin.len());
            for input in &tx.vin {
                let (txid, vout) = input.outpoint().ok_or_else(|| {
                    RpcError::InvalidData(format!(
                        "transaction {} in block {} has an input without outpoint",
                        tx.txid, height
                    ))
                })?;
                inputs.push(self.resolve(txid, vout)?);
            }
            let outputs = self.outputs_of(tx)?;
            transactions.push(WalkedTransaction {
                txid: tx.txid.clone(),
                inputs,
                outputs,
            });
        }

        Ok(WalkedBlock {
            height,
            hash,
            difficulty: block.difficulty,
            time: block.time,
            coinbase,
            transactions,
        })
    }

    /// Decode a transaction's outputs and remember them for later spends
    fn outputs_of(&mut self, tx: &RpcTransaction) -> Result<Vec<TxOut>, RpcError> {
        let mut outputs = Vec::with_capacity(tx.vout.len());
        for output in &tx.vout {
            let out = TxOut::from_rpc(output)?;
            if out.is_significant() {
                self.cache.insert(&tx.txid, output.n, out.clone());
            }
            outputs.push(out);
        }
        Ok(outputs)
    }

    fn resolve(&mut self, txid: &str, vout: u32) -> Result<TxOut, RpcError> {
        if let Some(out) = self.cache.take(txid, vout) {
            return Ok(out);
        }

        let prev = self.source.raw_transaction(txid)?;
        let mut resolved = None;
        for output in &prev.vout {
            let out = TxOut::from_rpc(output)?;
            if output.n == vout {
                resolved = Some(out);
            } else if out.is_significant() {
                self.cache.insert(txid, output.n, out);
            }
        }

        resolved.ok_or_else(|| {
            RpcError::InvalidData(format!("transaction {} has no output {}", txid, vout))
        })
    }
}

impl<'a, S: ChainSource> Iterator for ChainWalker<'a, S> {
    type Item = Result<WalkedBlock, RpcError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next_height > self.tip {
            return None;
        }

        let height = self.next_height;
        self.next_height += 1;

        let result = self.fetch(height);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock::{MockChain, MockTx};
    use crate::params::COIN;

    #[test]
    fn test_walks_every_block_in_order() {
        let mut chain = MockChain::new();
        for i in 0..4 {
            chain.mine(&format!("miner{}", i), vec![]);
        }

        let walker = ChainWalker::new(&chain, OutputCache::new()).unwrap();
        assert_eq!(walker.tip(), 3);

        let heights: Vec<u64> = walker.map(|b| b.unwrap().height).collect();
        assert_eq!(heights, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_reward_addresses_skip_zero_outputs() {
        let mut chain = MockChain::new();
        chain.mine_with_coinbase(&[("zero", 0), ("first", 10), ("second", 5)], vec![]);

        let block = ChainWalker::new(&chain, OutputCache::new())
            .unwrap()
            .next()
            .unwrap()
            .unwrap();

        let addrs: Vec<&str> = block.reward_addresses().map(|a| a.as_str()).collect();
        assert_eq!(addrs, vec!["first", "second"]);
        assert_eq!(block.reward_address().unwrap().as_str(), "first");
    }

    #[test]
    fn test_inputs_resolved_with_and_without_cache() {
        let mut chain = MockChain::new();
        let cb = chain.mine("alice", vec![]);
        chain.mine("bob", vec![]);
        chain.mine(
            "carol",
            vec![MockTx::spend(&[(cb.as_str(), 0)], &[("dave", 20 * COIN), ("alice", 30 * COIN)])],
        );

        for capacity in [0, 16] {
            let blocks: Vec<WalkedBlock> = ChainWalker::new(&chain, OutputCache::with_capacity(capacity))
                .unwrap()
                .collect::<Result<_, _>>()
                .unwrap();

            let tx = &blocks[2].transactions[0];
            assert_eq!(tx.inputs.len(), 1);
            assert_eq!(tx.inputs[0].address.as_str(), "alice");
            assert_eq!(tx.inputs[0].amount, 50 * COIN);
            assert_eq!(tx.outputs.len(), 2);
        }
    }

    #[test]
    fn test_cache_saves_round_trips() {
        let mut chain = MockChain::new();
        let cb = chain.mine("alice", vec![]);
        chain.mine("bob", vec![MockTx::spend(&[(cb.as_str(), 0)], &[("dave", 50 * COIN)])]);

        let mut walker = ChainWalker::new(&chain, OutputCache::new()).unwrap();
        for block in walker.by_ref() {
            block.unwrap();
        }
        assert_eq!(walker.cache_stats().hits, 1);
        assert_eq!(chain.raw_transaction_calls(), 0);

        let uncached = ChainWalker::new(&chain, OutputCache::with_capacity(0)).unwrap();
        for block in uncached {
            block.unwrap();
        }
        assert_eq!(chain.raw_transaction_calls(), 1);
    }

    #[test]
    fn test_unknown_outpoint_ends_walk() {
        let mut chain = MockChain::new();
        chain.mine("alice", vec![]);
        chain.mine("bob", vec![MockTx::spend(&[("missing", 0)], &[("dave", 1)])]);
        chain.mine("carol", vec![]);

        let results: Vec<_> = ChainWalker::new(&chain, OutputCache::new()).unwrap().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    /// Serves `MockChain` blocks with their height shifted by one
    struct ShiftedHeights(MockChain);

    impl ChainSource for ShiftedHeights {
        fn block_count(&self) -> Result<u64, RpcError> {
            self.0.block_count()
        }

        fn block_hash(&self, height: u64) -> Result<String, RpcError> {
            self.0.block_hash(height)
        }

        fn block(&self, hash: &str) -> Result<crate::rpc::RpcBlock, RpcError> {
            let mut block = self.0.block(hash)?;
            block.height += 1;
            Ok(block)
        }

        fn raw_transaction(&self, txid: &str) -> Result<RpcTransaction, RpcError> {
            self.0.raw_transaction(txid)
        }
    }

    #[test]
    fn test_block_at_wrong_height_ends_walk() {
        let mut chain = MockChain::new();
        chain.mine("alice", vec![]);
        chain.mine("bob", vec![]);
        let source = ShiftedHeights(chain);

        let results: Vec<_> = ChainWalker::new(&source, OutputCache::new()).unwrap().collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(RpcError::InvalidData(_))));
    }

    #[test]
    fn test_unaddressable_output_keyed_by_script() {
        let out = RpcOutput {
            value: 1.0,
            n: 0,
            script_pub_key: crate::rpc::ScriptPubKey {
                hex: "6a00".into(),
                address: None,
                addresses: vec![],
            },
        };
        let tx_out = TxOut::from_rpc(&out).unwrap();
        assert_eq!(tx_out.address.as_str(), "script:6a00");
        assert_eq!(tx_out.amount, COIN);
    }
}
