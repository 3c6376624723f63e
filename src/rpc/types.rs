//! Decoded block and transaction shapes returned by the node
//!
//! Only the fields the audit reads are modelled; serde ignores the rest.

use crate::params::COIN;
use serde::Deserialize;

use super::RpcError;

/// `getblock <hash> 2`
#[derive(Debug, Clone, Deserialize)]
pub struct RpcBlock {
    pub hash: String,
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub difficulty: f64,
    #[serde(default)]
    pub time: i64,
    pub tx: Vec<RpcTransaction>,
}

/// `getrawtransaction <txid> 1`, also embedded in verbose blocks
#[derive(Debug, Clone, Deserialize)]
pub struct RpcTransaction {
    pub txid: String,
    pub vin: Vec<RpcInput>,
    pub vout: Vec<RpcOutput>,
}

impl RpcTransaction {
    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].coinbase.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcInput {
    /// Present only on the coinbase input
    pub coinbase: Option<String>,
    pub txid: Option<String>,
    pub vout: Option<u32>,
}

impl RpcInput {
    /// The spent outpoint, if this is not a coinbase input
    pub fn outpoint(&self) -> Option<(&str, u32)> {
        match (&self.txid, self.vout) {
            (Some(txid), Some(vout)) => Some((txid.as_str(), vout)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcOutput {
    /// Value in coins
    pub value: f64,
    pub n: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
}

impl RpcOutput {
    /// Value in base units
    pub fn amount(&self) -> Result<u64, RpcError> {
        amount_from_coins(self.value)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptPubKey {
    #[serde(default)]
    pub hex: String,
    /// Newer nodes report a single `address`
    pub address: Option<String>,
    /// Older nodes report an `addresses` array
    #[serde(default)]
    pub addresses: Vec<String>,
}

impl ScriptPubKey {
    /// The single address paying to this script, if the node could decode one
    pub fn single_address(&self) -> Option<&str> {
        if let Some(address) = &self.address {
            return Some(address.as_str());
        }
        match self.addresses.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}

/// Converts a JSON coin value to base units, rejecting negative or non-finite values
pub fn amount_from_coins(value: f64) -> Result<u64, RpcError> {
    if !value.is_finite() || value < 0.0 {
        return Err(RpcError::InvalidData(format!("invalid output value {}", value)));
    }
    Ok((value * COIN as f64).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_verbose_block() {
        let block: RpcBlock = serde_json::from_value(json!({
            "hash": "00ab",
            "height": 7,
            "difficulty": 2.5,
            "time": 1_500_000_000,
            "confirmations": 3,
            "tx": [{
                "txid": "cb",
                "vin": [{ "coinbase": "0107", "sequence": 4294967295u32 }],
                "vout": [{
                    "value": 50.0,
                    "n": 0,
                    "scriptPubKey": { "hex": "76a9", "addresses": ["KAddr"] }
                }]
            }]
        }))
        .unwrap();

        assert_eq!(block.height, 7);
        assert!(block.tx[0].is_coinbase());
        assert_eq!(block.tx[0].vout[0].amount().unwrap(), 50 * COIN);
        assert_eq!(block.tx[0].vout[0].script_pub_key.single_address(), Some("KAddr"));
    }

    #[test]
    fn test_spending_input_outpoint() {
        let input: RpcInput =
            serde_json::from_value(json!({ "txid": "aa", "vout": 3, "scriptSig": {} })).unwrap();
        assert_eq!(input.outpoint(), Some(("aa", 3)));
    }

    #[test]
    fn test_single_address_prefers_address_field() {
        let spk = ScriptPubKey {
            hex: String::new(),
            address: Some("new".into()),
            addresses: vec!["old".into()],
        };
        assert_eq!(spk.single_address(), Some("new"));

        let multisig = ScriptPubKey {
            hex: "51".into(),
            address: None,
            addresses: vec!["a".into(), "b".into()],
        };
        assert_eq!(multisig.single_address(), None);
    }

    #[test]
    fn test_amount_from_coins() {
        assert_eq!(amount_from_coins(0.1).unwrap(), 10_000_000);
        assert_eq!(amount_from_coins(12.34567891).unwrap(), 1_234_567_891);
        assert!(amount_from_coins(-1.0).is_err());
        assert!(amount_from_coins(f64::NAN).is_err());
    }
}
