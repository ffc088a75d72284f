//! Evidence scanning
//!
//! Turns a project directory into framework signals for the detector.
//! The [`EvidenceScanner`] trait is the seam; [`FileEvidenceScanner`] is the
//! built-in implementation driven by [`FrameworkSignatures`].

mod evidence_scanner;
pub mod file_scanner;
pub mod manifests;
pub mod signatures;

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;

use crate::types::{FrameworkSignal, Result};

pub use evidence_scanner::FileEvidenceScanner;
pub use file_scanner::{FileScanner, ScannedFile};
pub use signatures::{Ecosystem, FrameworkSignature, FrameworkSignatures};

/// Output of one scan. Partial scans show up as fewer signals plus warnings.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub signals: Vec<FrameworkSignal>,
    pub warnings: Vec<String>,
    /// Variable names declared in dotenv files (never values)
    pub env_var_names: BTreeSet<String>,
    pub files_examined: usize,
}

/// Produces framework evidence for a project path.
///
/// Returns `Err` only when the project cannot be scanned at all.
#[async_trait]
pub trait EvidenceScanner: Send + Sync {
    async fn scan(&self, project_path: &Path) -> Result<ScanReport>;
}
