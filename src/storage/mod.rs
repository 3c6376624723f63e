//! In-run storage for resolved transaction outputs

pub mod output_cache;

pub use output_cache::{CacheStats, OutputCache, DEFAULT_CACHE_SIZE};
