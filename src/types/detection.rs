//! Framework detection results

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::evidence::Evidence;
use super::fallback::Fallback;

/// Ranked guess that a project uses `framework`.
///
/// `confidence` is derived from `evidence` by the detector; there is no
/// setter, so it cannot drift from the evidence it summarizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkDetectionResult {
    pub framework: String,
    confidence: f32,
    pub evidence: Vec<Evidence>,
    pub version: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl FrameworkDetectionResult {
    /// Build a result whose confidence is the clamped evidence weight sum
    pub(crate) fn from_evidence(
        framework: impl Into<String>,
        evidence: Vec<Evidence>,
        version: Option<String>,
    ) -> Self {
        let confidence = confidence_from(&evidence);
        let mut sources: Vec<String> = evidence.iter().map(|e| e.source.clone()).collect();
        sources.sort();
        sources.dedup();

        let mut metadata = BTreeMap::new();
        metadata.insert("evidence_count".to_string(), evidence.len().into());
        metadata.insert("sources".to_string(), sources.into());

        Self {
            framework: framework.into(),
            confidence,
            evidence,
            version,
            metadata,
        }
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

/// Clamped additive confidence: `min(Σ weight, 1.0)`
pub fn confidence_from(evidence: &[Evidence]) -> f32 {
    let sum: f32 = evidence.iter().map(Evidence::weight).sum();
    sum.clamp(0.0, 1.0)
}

/// Outcome of detecting frameworks for a project path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionReport {
    pub frameworks: Vec<FrameworkDetectionResult>,
    /// Project-level confidence (rewards corroborating frameworks)
    pub overall_confidence: f32,
    /// Non-fatal scan problems (unreadable files, bad manifests)
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Which fallback, if any, produced this report
    #[serde(default)]
    pub fallback: Option<Fallback>,
}

impl DetectionReport {
    pub fn top(&self) -> Option<&FrameworkDetectionResult> {
        self.frameworks.first()
    }

    pub fn framework_names(&self) -> Vec<&str> {
        self.frameworks.iter().map(|f| f.framework.as_str()).collect()
    }
}
