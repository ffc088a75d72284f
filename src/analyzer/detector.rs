//! Framework Detector
//!
//! Aggregates scanner evidence per candidate framework into a confidence
//! score, then filters and ranks the candidates.
//!
//! ## Scoring
//!
//! - Per framework: `confidence = clamp(Σ evidence weight, 0, 1)`
//! - Per project: `min(top + bonus * min(n - 1, cap), 1.0)`
//!
//! Ties break by evidence count (descending), then framework name, so the
//! ranking is fully deterministic. The detector performs no I/O.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::debug;

use crate::config::{DetectionConfig, ScoringWeights};
use crate::types::{Evidence, FrameworkDetectionResult, FrameworkSignal, normalize_key};

/// Ranks framework candidates from attributed evidence
#[derive(Debug, Clone, Default)]
pub struct FrameworkDetector {
    config: DetectionConfig,
}

impl FrameworkDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.config.weights
    }

    /// Group, score, filter, sort and truncate.
    pub fn detect(&self, signals: &[FrameworkSignal]) -> Vec<FrameworkDetectionResult> {
        let mut groups: BTreeMap<String, (Vec<Evidence>, Option<String>)> = BTreeMap::new();

        for signal in signals {
            let key = normalize_key(&signal.framework);
            if key.is_empty() {
                continue;
            }
            let entry = groups.entry(key).or_default();
            entry.0.push(signal.evidence.clone());
            if entry.1.is_none()
                && let Some(version) = signal.version.as_deref()
                && !version.trim().is_empty()
            {
                entry.1 = Some(version.trim().to_string());
            }
        }

        let min = self.config.min_confidence;
        let max = self.config.max_confidence;

        let mut results: Vec<FrameworkDetectionResult> = groups
            .into_iter()
            .map(|(framework, (evidence, version))| {
                FrameworkDetectionResult::from_evidence(framework, evidence, version)
            })
            .filter(|r| r.confidence() >= min && r.confidence() <= max)
            .collect();

        results.sort_by(rank);
        results.truncate(self.config.max_results);

        debug!(
            signals = signals.len(),
            results = results.len(),
            "Framework detection complete"
        );

        results
    }

    /// Project-level confidence across all ranked results
    pub fn overall_confidence(&self, results: &[FrameworkDetectionResult]) -> f32 {
        let Some(top) = results.iter().map(|r| r.confidence()).reduce(f32::max) else {
            return 0.0;
        };
        let weights = &self.config.weights;
        let corroborating = (results.len() - 1).min(weights.corroboration_cap);
        (top + weights.corroboration_bonus * corroborating as f32).clamp(0.0, 1.0)
    }
}

/// Confidence desc, evidence count desc, framework name asc
fn rank(a: &FrameworkDetectionResult, b: &FrameworkDetectionResult) -> Ordering {
    b.confidence()
        .total_cmp(&a.confidence())
        .then_with(|| b.evidence.len().cmp(&a.evidence.len()))
        .then_with(|| a.framework.cmp(&b.framework))
}
