//! Network parameters for the Lynx hard-fork rules
//!
//! One immutable parameter set per network, selected once at startup.

pub mod network;

pub use network::{
    format_coins, CoinbaseMaturity, NetworkParams, NetworkType, ParamsError, COIN,
};
