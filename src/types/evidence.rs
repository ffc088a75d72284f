//! Evidence model
//!
//! A single observed project signal (a file present, a dependency declared,
//! a config key found) and its attribution to a candidate framework.

use serde::{Deserialize, Serialize};

/// Where a piece of evidence was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceType {
    File,
    Dependency,
    Config,
    Content,
}

impl std::fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Dependency => write!(f, "dependency"),
            Self::Config => write!(f, "config"),
            Self::Content => write!(f, "content"),
        }
    }
}

/// One observed signal with its weight.
///
/// The weight is clamped to `[0, 1]` at construction; NaN becomes 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub evidence_type: EvidenceType,
    pub value: String,
    pub confidence_weight: f32,
    pub source: String,
}

impl Evidence {
    pub fn new(
        evidence_type: EvidenceType,
        value: impl Into<String>,
        confidence_weight: f32,
        source: impl Into<String>,
    ) -> Self {
        Self {
            evidence_type,
            value: value.into(),
            confidence_weight: sanitize_weight(confidence_weight),
            source: source.into(),
        }
    }

    pub fn file(value: impl Into<String>, weight: f32) -> Self {
        let value = value.into();
        Self::new(EvidenceType::File, value.clone(), weight, value)
    }

    pub fn dependency(value: impl Into<String>, weight: f32, source: impl Into<String>) -> Self {
        Self::new(EvidenceType::Dependency, value, weight, source)
    }

    pub fn config(value: impl Into<String>, weight: f32, source: impl Into<String>) -> Self {
        Self::new(EvidenceType::Config, value, weight, source)
    }

    /// Weight usable in arithmetic (non-finite counts as 0, never outside `[0, 1]`)
    pub fn weight(&self) -> f32 {
        sanitize_weight(self.confidence_weight)
    }
}

/// Evidence attributed to one candidate framework key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkSignal {
    pub framework: String,
    pub evidence: Evidence,
    /// Version string observed alongside the evidence (e.g. a dependency range)
    #[serde(default)]
    pub version: Option<String>,
}

impl FrameworkSignal {
    pub fn new(framework: impl Into<String>, evidence: Evidence) -> Self {
        Self {
            framework: framework.into(),
            evidence,
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        if !version.trim().is_empty() {
            self.version = Some(version.trim().to_string());
        }
        self
    }
}

fn sanitize_weight(weight: f32) -> f32 {
    if !weight.is_finite() {
        0.0
    } else {
        weight.clamp(0.0, 1.0)
    }
}
