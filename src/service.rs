//! Integration Service
//!
//! Single entry point tying together detection, suggestion, validation,
//! generation sessions and the result cache.
//!
//! Detection, suggestion and validation never fail: problems show up as
//! warnings and [`Fallback`] markers on the returned reports. Session
//! operations return `Err` for unknown ids and unstartable requests.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::analyzer::{EvidenceScanner, FileEvidenceScanner, FrameworkDetector};
use crate::cache::{CacheStats, ResultCache};
use crate::catalog::{Catalog, CatalogHandle};
use crate::config::Config;
use crate::generation::{
    ArtifactSink, ContentRenderer, Enhancer, EventBatch, GenerationOutput, GenerationRequest,
    ManifestRenderer, MemorySink, Orchestrator, ProgressSubscription,
};
use crate::suggest::SuggestionEngine;
use crate::types::{
    BatchValidationResult, DetectionReport, Fallback, GenerationMode, GenerationSession, Result,
    SessionId, SuggestionReport, TemplateValidationResult, ValidationRequest,
};
use crate::validation::CompatibilityValidator;

pub struct IntegrationService {
    config: Config,
    catalog: Arc<CatalogHandle>,
    cache: Arc<ResultCache>,
    scanner: Arc<dyn EvidenceScanner>,
    detector: FrameworkDetector,
    suggestions: SuggestionEngine,
    orchestrator: Orchestrator,
}

impl IntegrationService {
    pub fn builder() -> IntegrationServiceBuilder {
        IntegrationServiceBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Snapshot of the active catalog
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.current()
    }

    // =========================================================================
    // Detection and suggestion
    // =========================================================================

    #[instrument(skip(self), fields(path = %project_path.display()))]
    pub async fn detect_frameworks(&self, project_path: &Path) -> DetectionReport {
        self.scan_and_detect(project_path).await.0
    }

    /// Detection plus the env var names the scan found in dotenv files
    async fn scan_and_detect(&self, project_path: &Path) -> (DetectionReport, BTreeSet<String>) {
        let scan = match self.scanner.scan(project_path).await {
            Ok(scan) => scan,
            Err(e) => {
                warn!(error = %e, "Scan failed; reporting no frameworks");
                let report = DetectionReport {
                    warnings: vec![e.to_string()],
                    fallback: Some(Fallback::ScanFailed {
                        reason: e.to_string(),
                    }),
                    ..Default::default()
                };
                return (report, BTreeSet::new());
            }
        };

        let frameworks = self.detector.detect(&scan.signals);
        let overall_confidence = self.detector.overall_confidence(&frameworks);
        let fallback = (!scan.warnings.is_empty()).then(|| Fallback::PartialScan {
            skipped: scan.warnings.len(),
        });

        info!(
            frameworks = frameworks.len(),
            overall_confidence,
            files = scan.files_examined,
            "Framework detection finished"
        );

        let report = DetectionReport {
            frameworks,
            overall_confidence,
            warnings: scan.warnings,
            fallback,
        };
        (report, scan.env_var_names)
    }

    /// Rank templates by env var names. With a project path, detected
    /// frameworks bias the ranking and the project's dotenv names are added.
    #[instrument(skip(self, env_var_names), fields(names = env_var_names.len()))]
    pub async fn get_template_suggestions(
        &self,
        env_var_names: &BTreeSet<String>,
        project_path: Option<&Path>,
    ) -> SuggestionReport {
        let mut names = env_var_names.clone();
        let (detected, fallback) = match project_path {
            Some(path) => {
                let (report, project_names) = self.scan_and_detect(path).await;
                names.extend(project_names);
                (report.frameworks, report.fallback)
            }
            None => (Vec::new(), None),
        };

        let catalog = self.catalog.current();
        let suggestions = self.suggestions.suggest(&catalog, &names, &detected);

        SuggestionReport {
            suggestions,
            detected_frameworks: detected.into_iter().map(|d| d.framework).collect(),
            fallback,
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    pub fn validate_combination(&self, request: &ValidationRequest) -> TemplateValidationResult {
        let catalog = self.catalog.current();
        CompatibilityValidator::new(&catalog).validate(request)
    }

    pub fn batch_validate(&self, requests: &[ValidationRequest]) -> BatchValidationResult {
        let catalog = self.catalog.current();
        CompatibilityValidator::new(&catalog).batch_validate(requests)
    }

    // =========================================================================
    // Generation sessions
    // =========================================================================

    pub fn start_generation(&self, request: GenerationRequest) -> Result<SessionId> {
        self.orchestrator.start(request, GenerationMode::Generate)
    }

    pub fn start_preview(&self, request: GenerationRequest) -> Result<SessionId> {
        self.orchestrator.start(request, GenerationMode::Preview)
    }

    pub fn get_session_status(&self, id: &SessionId) -> Result<GenerationSession> {
        self.orchestrator.status(id)
    }

    pub fn cancel_session(&self, id: &SessionId) -> Result<bool> {
        self.orchestrator.cancel(id)
    }

    pub fn list_active_sessions(&self) -> Vec<GenerationSession> {
        self.orchestrator.list_active()
    }

    pub fn subscribe(&self, id: &SessionId) -> Result<ProgressSubscription> {
        self.orchestrator.subscribe(id)
    }

    pub fn poll_events(&self, id: &SessionId, cursor: usize) -> Result<EventBatch> {
        self.orchestrator.poll_events(id, cursor)
    }

    pub fn session_result(&self, id: &SessionId) -> Result<Option<GenerationOutput>> {
        self.orchestrator.result(id)
    }

    pub async fn wait_for_completion(
        &self,
        id: &SessionId,
        timeout: Option<Duration>,
    ) -> Result<GenerationSession> {
        self.orchestrator.wait_for_completion(id, timeout).await
    }

    pub fn purge_finished_sessions(&self) -> usize {
        self.orchestrator.purge_finished()
    }

    // =========================================================================
    // Cache and catalog
    // =========================================================================

    /// Drop every cached result; returns how many entries were removed
    pub fn clear_cache(&self) -> usize {
        let removed = self.cache.clear();
        info!(removed, "Result cache cleared");
        removed
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Swap in a new catalog. Running sessions keep their snapshot.
    pub fn reload_catalog(&self, catalog: Catalog) {
        self.catalog.replace(catalog);
    }

    pub fn reload_catalog_from(&self, path: &Path) -> Result<()> {
        self.catalog.reload_from(path)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Collaborators default to the built-in scanner, [`ManifestRenderer`] and
/// [`MemorySink`]; enhancement is off unless an enhancer is supplied.
pub struct IntegrationServiceBuilder {
    config: Config,
    catalog: Option<Catalog>,
    cache: Option<Arc<ResultCache>>,
    scanner: Option<Arc<dyn EvidenceScanner>>,
    renderer: Option<Arc<dyn ContentRenderer>>,
    enhancer: Option<Arc<dyn Enhancer>>,
    sink: Option<Arc<dyn ArtifactSink>>,
}

impl IntegrationServiceBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            catalog: None,
            cache: None,
            scanner: None,
            renderer: None,
            enhancer: None,
            sink: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn scanner(mut self, scanner: Arc<dyn EvidenceScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn ContentRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn enhancer(mut self, enhancer: Arc<dyn Enhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Validates the config and loads the catalog (explicit, configured file,
    /// or built-in, in that order).
    pub fn build(self) -> Result<IntegrationService> {
        let config = self.config;
        config.validate()?;

        let catalog = match (self.catalog, &config.catalog.path) {
            (Some(catalog), _) => catalog,
            (None, Some(path)) => Catalog::load(path)?,
            (None, None) => Catalog::builtin()?,
        };
        let catalog = Arc::new(CatalogHandle::new(catalog));

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(ResultCache::from_config(&config.cache)));
        let scanner = self.scanner.unwrap_or_else(|| {
            Arc::new(FileEvidenceScanner::new(
                config.scanner.clone(),
                config.detection.weights,
            ))
        });
        let renderer = self
            .renderer
            .unwrap_or_else(|| Arc::new(ManifestRenderer::new()));
        let sink = self.sink.unwrap_or_else(|| Arc::new(MemorySink::new()));

        let mut orchestrator = Orchestrator::new(catalog.clone(), cache.clone(), renderer, sink)
            .with_config(config.generation.clone());
        if let Some(enhancer) = self.enhancer {
            orchestrator = orchestrator.with_enhancer(enhancer);
        }

        Ok(IntegrationService {
            detector: FrameworkDetector::new(config.detection.clone()),
            suggestions: SuggestionEngine::new(config.suggestion.clone(), config.detection.weights),
            config,
            catalog,
            cache,
            scanner,
            orchestrator,
        })
    }
}

impl Default for IntegrationServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::scanner::ScanReport;
    use crate::types::{CompatibilityLevel, Evidence, FrameworkSignal, SessionStatus, WeaveError};
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    struct FixedScanner {
        report: Option<ScanReport>,
    }

    #[async_trait]
    impl EvidenceScanner for FixedScanner {
        async fn scan(&self, project_path: &Path) -> Result<ScanReport> {
            self.report.clone().ok_or_else(|| WeaveError::Scan {
                path: project_path.display().to_string(),
                message: "permission denied".to_string(),
            })
        }
    }

    fn service() -> IntegrationService {
        IntegrationService::builder().build().unwrap()
    }

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_detects_nextjs_project() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"next": "14.2.0", "react": "18.2.0"}}"#,
        )
        .unwrap();

        let report = service().detect_frameworks(dir.path()).await;
        assert_eq!(report.framework_names(), vec!["nextjs", "react"]);
        assert!(report.fallback.is_none());
        assert!(report.overall_confidence > report.frameworks[1].confidence());
    }

    #[tokio::test]
    async fn test_scan_failure_is_a_fallback() {
        let service = IntegrationService::builder()
            .scanner(Arc::new(FixedScanner { report: None }))
            .build()
            .unwrap();

        let report = service.detect_frameworks(Path::new("/locked")).await;
        assert!(report.frameworks.is_empty());
        assert_eq!(report.overall_confidence, 0.0);
        assert!(matches!(report.fallback, Some(Fallback::ScanFailed { .. })));
    }

    #[tokio::test]
    async fn test_partial_scan_is_marked() {
        let report = ScanReport {
            signals: vec![FrameworkSignal::new(
                "django",
                Evidence::file("manage.py", 0.6),
            )],
            warnings: vec!["Skipped requirements.txt".to_string()],
            ..Default::default()
        };
        let service = IntegrationService::builder()
            .scanner(Arc::new(FixedScanner {
                report: Some(report),
            }))
            .build()
            .unwrap();

        let report = service.detect_frameworks(Path::new("/project")).await;
        assert_eq!(report.framework_names(), vec!["django"]);
        assert_eq!(report.fallback, Some(Fallback::PartialScan { skipped: 1 }));
    }

    #[tokio::test]
    async fn test_suggestions_without_project() {
        let report = service()
            .get_template_suggestions(&names(&["STRIPE_SECRET_KEY", "DATABASE_URL"]), None)
            .await;
        assert!(report.detected_frameworks.is_empty());
        assert!(!report.suggestions.is_empty());
        assert!(report.suggestions.iter().all(|s| s.provider_id == "stripe"));
    }

    #[tokio::test]
    async fn test_suggestions_use_project_frameworks_and_dotenv() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("manage.py"), "").unwrap();
        fs::write(dir.path().join(".env"), "STRIPE_SECRET_KEY=sk_test\n").unwrap();

        let report = service()
            .get_template_suggestions(&BTreeSet::new(), Some(dir.path()))
            .await;
        assert_eq!(report.detected_frameworks, vec!["django"]);
        assert_eq!(report.suggestions[0].template_id, "stripe-subscriptions-django");
    }

    #[test]
    fn test_stripe_validation_scenario() {
        let service = service();
        let result = service.validate_combination(
            &ValidationRequest::new("stripe", "nextjs").with_features(["webhooks"]),
        );
        assert!(result.is_valid());
        assert_eq!(result.compatibility_level, CompatibilityLevel::Full);

        let batch = service.batch_validate(&[
            ValidationRequest::new("stripe", "nextjs"),
            ValidationRequest::new("stripe", "spring-boot"),
        ]);
        assert_eq!(batch.summary.valid_count, 1);
        assert_eq!(batch.summary.invalid_count, 1);
    }

    #[tokio::test]
    async fn test_generation_round_trip_and_cache() {
        let service = service();
        let request = GenerationRequest::new("openai", "nextjs").with_env_vars(["OPENAI_API_KEY"]);

        let id = service.start_generation(request.clone()).unwrap();
        let session = service.wait_for_completion(&id, None).await.unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert!(service.session_result(&id).unwrap().is_some());
        assert_eq!(service.cache_stats().size, 1);

        let preview = service.start_preview(request).unwrap();
        let session = service.wait_for_completion(&preview, None).await.unwrap();
        assert!(session.from_cache);

        assert_eq!(service.clear_cache(), 1);
        assert_eq!(service.cache_stats().size, 0);
        assert!(service.list_active_sessions().is_empty());
        assert_eq!(service.purge_finished_sessions(), 2);
    }

    #[test]
    fn test_reload_catalog() {
        let service = service();
        let yaml = r#"
providers:
  - id: acme
    name: Acme
templates: []
compatibility: []
"#;
        service.reload_catalog(Catalog::from_yaml_str(yaml).unwrap());
        assert_eq!(service.catalog().provider_count(), 1);
        assert!(!service.validate_combination(&ValidationRequest::new("stripe", "nextjs")).is_valid());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.cache.max_entries = 0;
        assert!(IntegrationService::builder().config(config).build().is_err());
    }
}
