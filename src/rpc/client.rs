//! Blocking JSON-RPC 1.0 client for the node
//!
//! One HTTP POST per call, no retries. Node-side errors arrive as a JSON body
//! with an `error` object, usually alongside a non-2xx status.

use super::config::NodeConfig;
use super::types::{RpcBlock, RpcTransaction};
use super::{ChainSource, RpcError};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Verbosity level asking the node for fully decoded transactions
const BLOCK_VERBOSITY_FULL: u8 = 2;

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Node JSON-RPC client
pub struct NodeClient {
    url: String,
    user: String,
    password: String,
    client: Client,
    next_id: AtomicU64,
}

impl NodeClient {
    /// Create a client for the configured endpoint
    pub fn new(config: &NodeConfig) -> Result<Self, RpcError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            url: config.url(),
            user: config.user.clone(),
            password: config.password.clone(),
            client,
            next_id: AtomicU64::new(0),
        })
    }

    /// Call an RPC method and decode its result
    pub fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        log::trace!("rpc #{} {} {}", id, method, params);

        let request = RpcRequest {
            jsonrpc: "1.0",
            id,
            method,
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&request)
            .send()?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RpcError::Unauthorized(status.as_u16()));
        }

        let body: Value = response.json()?;
        decode_response(body)
    }
}

/// Extracts `result` from a JSON-RPC response body, surfacing the node's error object
fn decode_response<R: DeserializeOwned>(body: Value) -> Result<R, RpcError> {
    let response: RpcResponse = serde_json::from_value(body)?;
    if let Some(error) = response.error {
        return Err(RpcError::Node {
            code: error.code,
            message: error.message,
        });
    }
    Ok(serde_json::from_value(response.result)?)
}

impl ChainSource for NodeClient {
    fn block_count(&self) -> Result<u64, RpcError> {
        self.call("getblockcount", json!([]))
    }

    fn block_hash(&self, height: u64) -> Result<String, RpcError> {
        self.call("getblockhash", json!([height]))
    }

    fn block(&self, hash: &str) -> Result<RpcBlock, RpcError> {
        self.call("getblock", json!([hash, BLOCK_VERBOSITY_FULL]))
    }

    fn raw_transaction(&self, txid: &str) -> Result<RpcTransaction, RpcError> {
        self.call("getrawtransaction", json!([txid, true]))
    }
}
