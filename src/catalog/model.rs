//! Catalog records
//!
//! Providers, templates and the (provider × framework) compatibility matrix,
//! in the shape they take in catalog files.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{DifficultyLevel, FeatureRule, FrameworkCompatibilityInfo, normalize_key};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub docs_url: Option<String>,
}

/// A file a template contributes to the generated output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFile {
    pub path: String,
    pub content: String,
    pub file_type: String,
    pub language: String,
    #[serde(default = "default_required")]
    pub is_required: bool,
    #[serde(default)]
    pub category: String,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub id: String,
    pub name: String,
    pub provider_id: String,
    pub framework: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_env_vars: BTreeSet<String>,
    /// Fragments that mark an env var name as belonging to this template's provider
    #[serde(default)]
    pub env_key_patterns: Vec<String>,
    pub estimated_setup_minutes: u32,
    #[serde(default)]
    pub difficulty: DifficultyLevel,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(default)]
    pub files: Vec<TemplateFile>,
}

/// Compatibility row as written in catalog files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityEntry {
    pub provider_id: String,
    #[serde(flatten)]
    pub info: FrameworkCompatibilityInfo,
}

/// On-disk catalog layout (YAML or JSON)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub templates: Vec<TemplateDefinition>,
    #[serde(default)]
    pub compatibility: Vec<CompatibilityEntry>,
    #[serde(default)]
    pub feature_rules: Vec<FeatureRule>,
}

// =============================================================================
// Compatibility Model
// =============================================================================

/// Read-only (provider, framework) → compatibility lookup
#[derive(Debug, Clone, Default)]
pub struct CompatibilityModel {
    entries: BTreeMap<String, BTreeMap<String, FrameworkCompatibilityInfo>>,
    feature_rules: Vec<FeatureRule>,
}

impl CompatibilityModel {
    pub(crate) fn insert(&mut self, provider_id: &str, info: FrameworkCompatibilityInfo) -> bool {
        self.entries
            .entry(normalize_key(provider_id))
            .or_default()
            .insert(info.framework.clone(), info)
            .is_none()
    }

    pub(crate) fn add_rule(&mut self, rule: FeatureRule) {
        self.feature_rules.push(rule);
    }

    pub fn lookup(&self, provider_id: &str, framework: &str) -> Option<&FrameworkCompatibilityInfo> {
        self.entries
            .get(&normalize_key(provider_id))?
            .get(&normalize_key(framework))
    }

    /// All entries for a provider, ordered by framework
    pub fn entries_for(&self, provider_id: &str) -> impl Iterator<Item = &FrameworkCompatibilityInfo> {
        self.entries
            .get(&normalize_key(provider_id))
            .into_iter()
            .flat_map(|m| m.values())
    }

    /// Frameworks the provider supports at any level above `Unsupported`
    pub fn compatible_frameworks(&self, provider_id: &str) -> BTreeSet<String> {
        self.entries_for(provider_id)
            .filter(|info| info.compatibility_level.is_supported())
            .map(|info| info.framework.clone())
            .collect()
    }

    /// Whether a feature rule marks `feature` as mandatory for the provider
    pub fn is_required_feature(&self, provider_id: &str, feature: &str) -> bool {
        let provider_id = normalize_key(provider_id);
        let feature = normalize_key(feature);
        self.feature_rules
            .iter()
            .any(|r| r.required && r.provider_id == provider_id && r.feature == feature)
    }

    pub fn feature_rules(&self) -> &[FeatureRule] {
        &self.feature_rules
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
