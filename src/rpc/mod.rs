//! JSON-RPC access to the node
//!
//! `ChainSource` is the seam between the chain walker and the node; the
//! walker only ever talks to the node through it.

pub mod client;
pub mod config;
pub mod types;

pub use client::NodeClient;
pub use config::{ConfigError, NodeConfig, DEFAULT_RPC_TIMEOUT_SECS};
pub use types::{amount_from_coins, RpcBlock, RpcInput, RpcOutput, RpcTransaction, ScriptPubKey};

use thiserror::Error;

/// RPC errors. All of them abort the audit.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("authentication rejected by node (HTTP {0})")]
    Unauthorized(u16),
    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },
    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Read access to the chain the audit walks
pub trait ChainSource {
    /// Height of the best block
    fn block_count(&self) -> Result<u64, RpcError>;

    /// Display-order hex hash of the block at `height`
    fn block_hash(&self, height: u64) -> Result<String, RpcError>;

    /// Block with fully decoded transactions
    fn block(&self, hash: &str) -> Result<RpcBlock, RpcError>;

    /// Decoded transaction by id
    fn raw_transaction(&self, txid: &str) -> Result<RpcTransaction, RpcError>;
}
