//! Project Analyzer Module
//!
//! - Evidence scanning with gitignore support
//! - Evidence-weighted framework detection and ranking

pub mod detector;
pub mod scanner;

pub use detector::FrameworkDetector;
pub use scanner::{EvidenceScanner, FileEvidenceScanner, ScanReport};
