//! Template Catalog
//!
//! Explicitly constructed registry of providers, templates and the
//! compatibility model. A [`Catalog`] is immutable once built; a
//! [`CatalogHandle`] lets an administrator swap in a reloaded catalog while
//! readers keep using the snapshot they already hold.
//!
//! ## Sources
//!
//! - Built-in catalog (embedded YAML)
//! - Catalog file: YAML, or JSON when the extension is `.json`

mod model;

pub use model::{
    CatalogFile, CompatibilityEntry, CompatibilityModel, Provider, TemplateDefinition,
    TemplateFile,
};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::info;

use crate::types::{FrameworkCompatibilityInfo, Result, WeaveError, normalize_key};

const BUILTIN_CATALOG: &str = include_str!("builtin.yaml");

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    providers: BTreeMap<String, Provider>,
    templates: BTreeMap<String, TemplateDefinition>,
    compatibility: CompatibilityModel,
}

impl Catalog {
    /// Catalog shipped with the binary
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    /// Load a catalog file (YAML, or JSON by extension)
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            WeaveError::Catalog(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let catalog = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };
        info!(
            path = %path.display(),
            providers = catalog.providers.len(),
            templates = catalog.templates.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Self::from_file(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Self::from_file(serde_json::from_str(content)?)
    }

    /// Normalize ids and check referential integrity
    pub fn from_file(file: CatalogFile) -> Result<Self> {
        let mut catalog = Catalog::default();

        for mut provider in file.providers {
            provider.id = normalize_key(&provider.id);
            if provider.id.is_empty() {
                return Err(WeaveError::Catalog("Provider with empty id".to_string()));
            }
            if catalog.providers.contains_key(&provider.id) {
                return Err(WeaveError::Catalog(format!(
                    "Duplicate provider '{}'",
                    provider.id
                )));
            }
            catalog.providers.insert(provider.id.clone(), provider);
        }

        for mut template in file.templates {
            template.id = normalize_key(&template.id);
            template.provider_id = normalize_key(&template.provider_id);
            template.framework = normalize_key(&template.framework);
            template.features = template.features.iter().map(|f| normalize_key(f)).collect();
            catalog.require_provider(&template.provider_id, &format!("template '{}'", template.id))?;
            if catalog.templates.contains_key(&template.id) {
                return Err(WeaveError::Catalog(format!(
                    "Duplicate template '{}'",
                    template.id
                )));
            }
            catalog.templates.insert(template.id.clone(), template);
        }

        for entry in file.compatibility {
            let provider_id = normalize_key(&entry.provider_id);
            let info = normalize_info(entry.info);
            catalog.require_provider(
                &provider_id,
                &format!("compatibility entry for '{}'", info.framework),
            )?;
            if !(0.0..=1.0).contains(&info.confidence) {
                return Err(WeaveError::Catalog(format!(
                    "Compatibility confidence for {}/{} must be within 0.0-1.0, got {}",
                    provider_id, info.framework, info.confidence
                )));
            }
            let framework = info.framework.clone();
            if !catalog.compatibility.insert(&provider_id, info) {
                return Err(WeaveError::Catalog(format!(
                    "Duplicate compatibility entry {}/{}",
                    provider_id, framework
                )));
            }
        }

        for mut rule in file.feature_rules {
            rule.provider_id = normalize_key(&rule.provider_id);
            rule.feature = normalize_key(&rule.feature);
            catalog.require_provider(&rule.provider_id, &format!("feature rule '{}'", rule.feature))?;
            catalog.compatibility.add_rule(rule);
        }

        Ok(catalog)
    }

    fn require_provider(&self, provider_id: &str, owner: &str) -> Result<()> {
        if self.providers.contains_key(provider_id) {
            Ok(())
        } else {
            Err(WeaveError::Catalog(format!(
                "{} references unknown provider '{}'",
                owner, provider_id
            )))
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn provider(&self, id: &str) -> Option<&Provider> {
        self.providers.get(&normalize_key(id))
    }

    pub fn template(&self, id: &str) -> Option<&TemplateDefinition> {
        self.templates.get(&normalize_key(id))
    }

    pub fn providers(&self) -> impl Iterator<Item = &Provider> {
        self.providers.values()
    }

    pub fn templates(&self) -> impl Iterator<Item = &TemplateDefinition> {
        self.templates.values()
    }

    pub fn templates_for_provider<'a>(
        &'a self,
        provider_id: &str,
    ) -> impl Iterator<Item = &'a TemplateDefinition> {
        let provider_id = normalize_key(provider_id);
        self.templates
            .values()
            .filter(move |t| t.provider_id == provider_id)
    }

    /// Template to use for a (provider, framework) pair when none was named
    pub fn default_template(&self, provider_id: &str, framework: &str) -> Option<&TemplateDefinition> {
        let framework = normalize_key(framework);
        self.templates_for_provider(provider_id)
            .filter(|t| t.framework == framework)
            .min_by_key(|t| (t.estimated_setup_minutes, t.id.clone()))
    }

    pub fn compatibility(&self) -> &CompatibilityModel {
        &self.compatibility
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }
}

fn normalize_info(mut info: FrameworkCompatibilityInfo) -> FrameworkCompatibilityInfo {
    info.framework = normalize_key(&info.framework);
    info.supported_features = info
        .supported_features
        .iter()
        .map(|f| normalize_key(f))
        .collect();
    info
}

// =============================================================================
// Catalog Handle
// =============================================================================

/// Shared, swappable reference to the active catalog
pub struct CatalogHandle {
    inner: RwLock<Arc<Catalog>>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Snapshot of the active catalog
    pub fn current(&self) -> Arc<Catalog> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the active catalog; in-flight readers keep their snapshot
    pub fn replace(&self, catalog: Catalog) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *inner = Arc::new(catalog);
        info!(
            providers = inner.provider_count(),
            templates = inner.template_count(),
            "Catalog replaced"
        );
    }

    /// Load a catalog file and make it active. The old catalog stays active on error.
    pub fn reload_from(&self, path: &Path) -> Result<()> {
        let catalog = Catalog::load(path)?;
        self.replace(catalog);
        Ok(())
    }
}

impl From<Catalog> for CatalogHandle {
    fn from(catalog: Catalog) -> Self {
        Self::new(catalog)
    }
}
