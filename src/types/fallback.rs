//! Explicit fallback markers
//!
//! Operations that degrade instead of failing record which fallback fired,
//! so callers and tests can tell a genuinely empty answer from a degraded one.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fallback {
    /// The scanner failed outright; results are empty
    ScanFailed { reason: String },
    /// The scanner skipped some inputs; results may be incomplete
    PartialScan { skipped: usize },
    /// Enhancement backend failed; unenhanced output was kept
    EnhancementSkipped { reason: String },
    /// A cached value could not be decoded and was ignored
    CacheEntryUnreadable { key: String },
}

impl std::fmt::Display for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScanFailed { reason } => write!(f, "scan failed: {}", reason),
            Self::PartialScan { skipped } => write!(f, "partial scan ({} inputs skipped)", skipped),
            Self::EnhancementSkipped { reason } => write!(f, "enhancement skipped: {}", reason),
            Self::CacheEntryUnreadable { key } => write!(f, "cache entry {} unreadable", key),
        }
    }
}
