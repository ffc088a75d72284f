//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/apiweave/) and project (.apiweave/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{cache, detection, scanner, scoring, suggestion};
use crate::types::{Result, WeaveError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Framework detection thresholds and scoring weights
    pub detection: DetectionConfig,

    /// Template suggestion settings
    pub suggestion: SuggestionConfig,

    /// Result cache settings
    pub cache: CacheConfig,

    /// Generation orchestrator settings
    pub generation: GenerationConfig,

    /// Evidence scanner settings
    pub scanner: ScannerConfig,

    /// Template catalog source
    pub catalog: CatalogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            detection: DetectionConfig::default(),
            suggestion: SuggestionConfig::default(),
            cache: CacheConfig::default(),
            generation: GenerationConfig::default(),
            scanner: ScannerConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `WeaveError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;

        if !(0.0..=1.0).contains(&self.suggestion.framework_match_bonus) {
            return Err(WeaveError::Config(format!(
                "suggestion.framework_match_bonus must be between 0.0 and 1.0, got {}",
                self.suggestion.framework_match_bonus
            )));
        }

        if self.cache.ttl_secs == 0 {
            return Err(WeaveError::Config(
                "cache.ttl_secs must be greater than 0".to_string(),
            ));
        }

        if self.cache.max_entries == 0 {
            return Err(WeaveError::Config(
                "cache.max_entries must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Detection Configuration
// =============================================================================

/// Kind of match between an observed name and a known pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// Name equals the pattern (case-insensitive)
    Exact,
    /// Pattern occurs inside the name (case-insensitive)
    Substring,
}

/// Heuristic scoring constants.
///
/// Defaults come from `constants::scoring`; they are uncalibrated and meant to
/// be tuned against real project corpora.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub substring_match: f32,
    pub exact_match: f32,
    pub corroboration_bonus: f32,
    pub corroboration_cap: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            substring_match: scoring::SUBSTRING_MATCH_WEIGHT,
            exact_match: scoring::EXACT_MATCH_WEIGHT,
            corroboration_bonus: scoring::CORROBORATION_BONUS,
            corroboration_cap: scoring::CORROBORATION_CAP,
        }
    }
}

impl ScoringWeights {
    pub fn match_weight(&self, kind: MatchKind) -> f32 {
        match kind {
            MatchKind::Exact => self.exact_match,
            MatchKind::Substring => self.substring_match,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Results below this confidence are dropped
    pub min_confidence: f32,
    /// Results above this confidence are dropped
    pub max_confidence: f32,
    /// Maximum number of ranked results
    pub max_results: usize,
    pub weights: ScoringWeights,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_confidence: detection::MIN_CONFIDENCE,
            max_confidence: detection::MAX_CONFIDENCE,
            max_results: detection::MAX_RESULTS,
            weights: ScoringWeights::default(),
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<()> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.min_confidence) || !unit.contains(&self.max_confidence) {
            return Err(WeaveError::Config(format!(
                "detection confidence bounds must be within 0.0-1.0, got {}..{}",
                self.min_confidence, self.max_confidence
            )));
        }
        if self.min_confidence > self.max_confidence {
            return Err(WeaveError::Config(format!(
                "detection.min_confidence ({}) exceeds max_confidence ({})",
                self.min_confidence, self.max_confidence
            )));
        }
        if self.max_results == 0 {
            return Err(WeaveError::Config(
                "detection.max_results must be greater than 0".to_string(),
            ));
        }
        let w = &self.weights;
        for (name, value) in [
            ("substring_match", w.substring_match),
            ("exact_match", w.exact_match),
            ("corroboration_bonus", w.corroboration_bonus),
        ] {
            if !unit.contains(&value) {
                return Err(WeaveError::Config(format!(
                    "detection.weights.{} must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Suggestion Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Maximum suggestions returned
    pub max_suggestions: usize,
    /// Bonus for templates whose framework was detected in the project
    pub framework_match_bonus: f32,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            max_suggestions: suggestion::MAX_SUGGESTIONS,
            framework_match_bonus: suggestion::FRAMEWORK_MATCH_BONUS,
        }
    }
}

// =============================================================================
// Cache Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds (default: 24h)
    pub ttl_secs: u64,
    /// Capacity before least-recently-used eviction
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: cache::CACHE_EXPIRATION_HOURS * 3600,
            max_entries: cache::MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GenerationConfig {
    /// Run the enhancement step when a request does not say otherwise
    pub enhance_by_default: bool,
    /// Default wait limit for CLI callers (None = wait indefinitely)
    pub wait_timeout_secs: Option<u64>,
}

// =============================================================================
// Scanner Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Maximum manifest size to parse in bytes
    pub max_file_size: u64,
    /// Maximum directory depth below the project root
    pub max_depth: usize,
    /// Glob patterns to skip
    pub exclude: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_file_size: scanner::MAX_FILE_SIZE,
            max_depth: scanner::MAX_DEPTH,
            exclude: vec![
                "**/node_modules/**".to_string(),
                "**/dist/**".to_string(),
                "**/.git/**".to_string(),
                "**/target/**".to_string(),
                "**/vendor/**".to_string(),
                "**/__pycache__/**".to_string(),
                "**/.venv/**".to_string(),
                "**/build/**".to_string(),
            ],
        }
    }
}

// =============================================================================
// Catalog Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog file (YAML, or JSON by extension); None = built-in catalog
    pub path: Option<PathBuf>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.cache.ttl(), Duration::from_secs(24 * 3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_weights() {
        let weights = ScoringWeights::default();
        assert_eq!(weights.match_weight(MatchKind::Exact), 0.6);
        assert_eq!(weights.match_weight(MatchKind::Substring), 0.4);
        assert_eq!(weights.corroboration_cap, 3);
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let mut config = Config::default();
        config.detection.min_confidence = 0.9;
        config.detection.max_confidence = 0.5;
        assert!(matches!(config.validate(), Err(WeaveError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_ttl() {
        let mut config = Config::default();
        config.cache.ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_weight_out_of_range() {
        let mut config = Config::default();
        config.detection.weights.exact_match = 1.5;
        assert!(config.validate().is_err());
    }
}
