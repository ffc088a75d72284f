//! Result caching
//!
//! - `Fingerprint`: deterministic request keys
//! - `ResultCache`: TTL + LRU cache of opaque JSON values

mod fingerprint;
mod result_cache;

pub use fingerprint::Fingerprint;
pub use result_cache::{CacheStats, ResultCache};
