//! Generation requests and outputs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::collaborators::GeneratedFile;
use crate::cache::Fingerprint;
use crate::types::{Fallback, ValidationRequest};

/// Kind of AI enhancement applied to rendered files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EnhancementType {
    #[default]
    Documentation,
    ErrorHandling,
    Security,
    BestPractices,
}

impl std::fmt::Display for EnhancementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Documentation => write!(f, "documentation"),
            Self::ErrorHandling => write!(f, "error-handling"),
            Self::Security => write!(f, "security"),
            Self::BestPractices => write!(f, "best-practices"),
        }
    }
}

impl std::str::FromStr for EnhancementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "documentation" | "docs" => Ok(Self::Documentation),
            "error-handling" => Ok(Self::ErrorHandling),
            "security" => Ok(Self::Security),
            "best-practices" => Ok(Self::BestPractices),
            _ => Err(format!(
                "Unknown enhancement: {}. Valid values: documentation, error-handling, security, best-practices",
                s
            )),
        }
    }
}

/// Everything needed to generate integration files for one combination.
///
/// Env vars are carried by name only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub provider_id: String,
    #[serde(default)]
    pub template_id: Option<String>,
    pub framework: String,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(default)]
    pub env_var_names: BTreeSet<String>,
    #[serde(default)]
    pub enhancement: Option<EnhancementType>,
}

impl GenerationRequest {
    pub fn new(provider_id: impl Into<String>, framework: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            framework: framework.into(),
            ..Default::default()
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

    pub fn with_env_vars<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env_var_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_enhancement(mut self, enhancement: EnhancementType) -> Self {
        self.enhancement = Some(enhancement);
        self
    }

    /// Cache key for this request once its template has been resolved
    pub fn fingerprint(&self, template_id: &str) -> Fingerprint {
        let enhancement = self.enhancement.map(|e| e.to_string());
        Fingerprint::for_request(
            &self.provider_id,
            Some(template_id),
            &self.framework,
            &self.features,
            &self.env_var_names,
            enhancement.as_deref(),
        )
    }

    pub fn validation_request(&self, template_id: &str) -> ValidationRequest {
        ValidationRequest::new(self.provider_id.clone(), self.framework.clone())
            .with_template(template_id)
            .with_features(self.features.iter().cloned())
    }
}

/// Final product of a completed session (also the cached value)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub template_id: String,
    pub fingerprint: Fingerprint,
    pub files: Vec<GeneratedFile>,
    #[serde(default)]
    pub enhancement_changes: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub fallbacks: Vec<Fallback>,
    #[serde(default)]
    pub from_cache: bool,
}
