//! Compatibility model and validation result types

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// How well a framework and provider integrate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityLevel {
    Full,
    Partial,
    Minimal,
    #[default]
    Unsupported,
}

impl CompatibilityLevel {
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl std::fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Partial => write!(f, "partial"),
            Self::Minimal => write!(f, "minimal"),
            Self::Unsupported => write!(f, "unsupported"),
        }
    }
}

impl std::str::FromStr for CompatibilityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "partial" => Ok(Self::Partial),
            "minimal" => Ok(Self::Minimal),
            "unsupported" => Ok(Self::Unsupported),
            _ => Err(format!(
                "Unknown compatibility level: {}. Valid values: full, partial, minimal, unsupported",
                s
            )),
        }
    }
}

/// Compatibility of one framework with one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkCompatibilityInfo {
    pub framework: String,
    pub compatibility_level: CompatibilityLevel,
    #[serde(default = "default_entry_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub supported_features: BTreeSet<String>,
    #[serde(default)]
    pub limitations: Vec<String>,
    #[serde(default)]
    pub additional_dependencies: Vec<String>,
}

fn default_entry_confidence() -> f32 {
    1.0
}

/// Marks a provider feature as mandatory: requesting it on a framework that
/// cannot support it is an error rather than a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRule {
    pub provider_id: String,
    pub feature: String,
    #[serde(default)]
    pub required: bool,
}

/// One (provider, template?, framework, features) tuple to validate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub provider_id: String,
    #[serde(default)]
    pub template_id: Option<String>,
    pub framework: String,
    #[serde(default)]
    pub features: BTreeSet<String>,
}

impl ValidationRequest {
    pub fn new(provider_id: impl Into<String>, framework: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            template_id: None,
            framework: framework.into(),
            features: BTreeSet::new(),
        }
    }

    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features.extend(features.into_iter().map(Into::into));
        self
    }
}

/// Validation verdict with actionable diagnostics.
///
/// `is_valid` is private and recomputed by [`TemplateValidationResult::finish`],
/// so it always equals `errors.is_empty()`. Deserialization recomputes it too;
/// an incoming `is_valid` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawValidationResult")]
pub struct TemplateValidationResult {
    is_valid: bool,
    pub compatibility_level: CompatibilityLevel,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub compatible_frameworks: BTreeSet<String>,
    pub missing_requirements: Vec<String>,
}

impl Default for TemplateValidationResult {
    fn default() -> Self {
        Self {
            is_valid: true,
            compatibility_level: CompatibilityLevel::Unsupported,
            errors: Vec::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
            compatible_frameworks: BTreeSet::new(),
            missing_requirements: Vec::new(),
        }
    }
}

impl TemplateValidationResult {
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.is_valid = false;
    }

    pub(crate) fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Dedupe diagnostics and settle `is_valid`
    pub(crate) fn finish(mut self) -> Self {
        dedup_in_order(&mut self.errors);
        dedup_in_order(&mut self.warnings);
        dedup_in_order(&mut self.missing_requirements);
        self.is_valid = self.errors.is_empty();
        self
    }
}

#[derive(Deserialize)]
struct RawValidationResult {
    compatibility_level: CompatibilityLevel,
    errors: Vec<String>,
    warnings: Vec<String>,
    suggestions: Vec<String>,
    compatible_frameworks: BTreeSet<String>,
    missing_requirements: Vec<String>,
}

impl From<RawValidationResult> for TemplateValidationResult {
    fn from(raw: RawValidationResult) -> Self {
        Self {
            is_valid: true,
            compatibility_level: raw.compatibility_level,
            errors: raw.errors,
            warnings: raw.warnings,
            suggestions: raw.suggestions,
            compatible_frameworks: raw.compatible_frameworks,
            missing_requirements: raw.missing_requirements,
        }
        .finish()
    }
}

fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

/// Aggregate counters for a batch validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_requests: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub warning_count: usize,
    pub error_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchValidationResult {
    pub results: Vec<TemplateValidationResult>,
    pub summary: ValidationSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse_roundtrip() {
        for level in [
            CompatibilityLevel::Full,
            CompatibilityLevel::Partial,
            CompatibilityLevel::Minimal,
            CompatibilityLevel::Unsupported,
        ] {
            assert_eq!(level.to_string().parse::<CompatibilityLevel>().unwrap(), level);
        }
        assert!("excellent".parse::<CompatibilityLevel>().is_err());
    }

    #[test]
    fn test_finish_settles_validity() {
        let mut result = TemplateValidationResult::default();
        assert!(result.is_valid());
        result.error("boom");
        result.error("boom");
        let result = result.finish();
        assert!(!result.is_valid());
        assert_eq!(result.errors, vec!["boom".to_string()]);
    }

    #[test]
    fn test_deserialized_result_recomputes_validity() {
        let json = r#"{"is_valid":true,"compatibility_level":"full","errors":["x"],"warnings":[],
            "suggestions":[],"compatible_frameworks":[],"missing_requirements":[]}"#;
        let result: TemplateValidationResult = serde_json::from_str(json).unwrap();
        assert!(!result.is_valid());

        let json = r#"{"is_valid":false,"compatibility_level":"full","errors":[],"warnings":[],
            "suggestions":[],"compatible_frameworks":[],"missing_requirements":[]}"#;
        let result: TemplateValidationResult = serde_json::from_str(json).unwrap();
        assert!(result.is_valid());

        let round_trip = serde_json::to_value(&result).unwrap();
        assert_eq!(round_trip["is_valid"], serde_json::Value::Bool(true));
    }
}
