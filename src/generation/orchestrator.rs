//! Generation Session Orchestrator
//!
//! Owns every generation/preview session. `start` checks the request,
//! consults the result cache, registers a session and spawns one task that
//! walks the step plan:
//!
//! ```text
//! fresh:  Validate → Render → [Enhance] → [Persist] → Cache
//! cached: Load cached → [Persist]
//! ```
//!
//! `Enhance` runs only when enhancement is requested and an enhancer is
//! configured; `Persist` only in generate mode. Cancellation is observed at
//! step boundaries, and a panicking task marks its session `Failed`.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, error, info, instrument, warn};

use super::collaborators::{
    ArtifactSink, ContentRenderer, EnhancementOptions, Enhancer, GeneratedFile, RenderContext,
    RenderRequest,
};
use super::progress::{EventBatch, ProgressSubscription};
use super::request::{EnhancementType, GenerationOutput, GenerationRequest};
use super::session::SessionHandle;
use super::timeout::with_optional_timeout;
use crate::cache::{Fingerprint, ResultCache};
use crate::catalog::{Catalog, CatalogHandle};
use crate::config::GenerationConfig;
use crate::constants::steps;
use crate::types::{
    Fallback, GenerationMode, GenerationSession, ResourceKind, Result, SessionId, StepFailure,
    ValidationError, ValidationErrorKind, WeaveError, normalize_key,
};
use crate::validation::CompatibilityValidator;

// =============================================================================
// Step Plan
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Validate,
    Render,
    Enhance,
    Persist,
    Cache,
    LoadCached,
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Self::Validate => steps::VALIDATE,
            Self::Render => steps::RENDER,
            Self::Enhance => steps::ENHANCE,
            Self::Persist => steps::PERSIST,
            Self::Cache => steps::CACHE,
            Self::LoadCached => steps::LOAD_CACHED,
        }
    }
}

fn plan(mode: GenerationMode, enhance: bool, cached: bool) -> Vec<Step> {
    let mut plan = Vec::with_capacity(5);
    if cached {
        plan.push(Step::LoadCached);
    } else {
        plan.push(Step::Validate);
        plan.push(Step::Render);
        if enhance {
            plan.push(Step::Enhance);
        }
    }
    if !mode.is_preview() {
        plan.push(Step::Persist);
    }
    if !cached {
        plan.push(Step::Cache);
    }
    plan
}

// =============================================================================
// Orchestrator
// =============================================================================

pub struct Orchestrator {
    sessions: DashMap<SessionId, Arc<SessionHandle>>,
    catalog: Arc<CatalogHandle>,
    cache: Arc<ResultCache>,
    renderer: Arc<dyn ContentRenderer>,
    enhancer: Option<Arc<dyn Enhancer>>,
    sink: Arc<dyn ArtifactSink>,
    config: GenerationConfig,
}

impl Orchestrator {
    pub fn new(
        catalog: Arc<CatalogHandle>,
        cache: Arc<ResultCache>,
        renderer: Arc<dyn ContentRenderer>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            catalog,
            cache,
            renderer,
            enhancer: None,
            sink,
            config: GenerationConfig::default(),
        }
    }

    pub fn with_enhancer(mut self, enhancer: Arc<dyn Enhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a session and spawn its task. Must run inside a Tokio runtime.
    ///
    /// Returns `Validation`, `NotFound` or `UnsupportedCombination` for
    /// requests that cannot start; everything after this point is reported
    /// through the session itself.
    #[instrument(skip(self, request), fields(provider = %request.provider_id, framework = %request.framework, mode = %mode))]
    pub fn start(&self, request: GenerationRequest, mode: GenerationMode) -> Result<SessionId> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| WeaveError::Internal(format!("no async runtime: {}", e)))?;

        let catalog = self.catalog.current();
        let template_id = resolve_template(&catalog, &request)?;

        let mut request = request;
        request.enhancement = request
            .enhancement
            .or_else(|| self.config.enhance_by_default.then(EnhancementType::default))
            .filter(|_| self.enhancer.is_some());
        let fingerprint = request.fingerprint(&template_id);

        let mut fallbacks = Vec::new();
        let cached = match self.cache.get_as::<GenerationOutput>(&fingerprint) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(key = fingerprint.short(), error = %e, "Ignoring unreadable cache entry");
                self.cache.invalidate(&fingerprint);
                fallbacks.push(Fallback::CacheEntryUnreadable {
                    key: fingerprint.short().to_string(),
                });
                None
            }
        };

        let steps = plan(mode, request.enhancement.is_some(), cached.is_some());
        let id = SessionId::generate();
        let handle = Arc::new(SessionHandle::new(
            id.clone(),
            normalize_key(&request.provider_id),
            mode,
            steps.len() as u32,
            cached.is_some(),
        ));
        self.sessions.insert(id.clone(), handle.clone());

        info!(
            session = %id,
            template = %template_id,
            steps = steps.len(),
            from_cache = cached.is_some(),
            "Generation session started"
        );

        let step_names: Vec<&'static str> = steps.iter().map(Step::name).collect();
        let run = SessionRun {
            handle: handle.clone(),
            catalog,
            cache: self.cache.clone(),
            renderer: self.renderer.clone(),
            enhancer: self.enhancer.clone(),
            sink: self.sink.clone(),
            request,
            template_id,
            fingerprint,
            steps,
            from_cache: cached.is_some(),
            cached,
            files: Vec::new(),
            changes: Vec::new(),
            warnings: Vec::new(),
            fallbacks,
        };

        let task = runtime.spawn(run.execute());
        runtime.spawn(async move {
            if let Err(e) = task.await {
                let progress = handle.snapshot().progress;
                let index = progress.current_step_number as usize;
                let failure = StepFailure {
                    step: step_names.get(index).copied().unwrap_or("Finishing").to_string(),
                    step_number: (progress.current_step_number + 1).min(progress.total_steps),
                    last_successful_step: (!progress.current_step.is_empty())
                        .then(|| progress.current_step.clone()),
                    message: if e.is_panic() {
                        "session task panicked".to_string()
                    } else {
                        "session task was aborted".to_string()
                    },
                };
                if handle.fail(failure) {
                    error!(session = %handle.id(), "Session task ended abnormally");
                }
            }
        });

        Ok(id)
    }

    fn handle(&self, id: &SessionId) -> Result<Arc<SessionHandle>> {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| WeaveError::not_found(ResourceKind::Session, id.as_str()))
    }

    pub fn status(&self, id: &SessionId) -> Result<GenerationSession> {
        Ok(self.handle(id)?.snapshot())
    }

    /// `true` if the session was running and is now cancelled; `false` for
    /// sessions that had already finished.
    #[instrument(skip(self), fields(session = %id))]
    pub fn cancel(&self, id: &SessionId) -> Result<bool> {
        let cancelled = self.handle(id)?.cancel();
        if cancelled {
            info!("Generation session cancelled");
        }
        Ok(cancelled)
    }

    /// Non-terminal sessions, oldest first
    pub fn list_active(&self) -> Vec<GenerationSession> {
        let mut active: Vec<GenerationSession> = self
            .sessions
            .iter()
            .map(|entry| entry.value().snapshot())
            .filter(|session| !session.status.is_terminal())
            .collect();
        active.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        active
    }

    pub fn subscribe(&self, id: &SessionId) -> Result<ProgressSubscription> {
        Ok(ProgressSubscription::new(self.handle(id)?))
    }

    pub fn poll_events(&self, id: &SessionId, cursor: usize) -> Result<EventBatch> {
        Ok(self.handle(id)?.events_from(cursor))
    }

    /// Output of a completed session; `None` while running or if it did not complete
    pub fn result(&self, id: &SessionId) -> Result<Option<GenerationOutput>> {
        Ok(self.handle(id)?.output())
    }

    /// Wait until the session is terminal. `None` waits indefinitely.
    pub async fn wait_for_completion(
        &self,
        id: &SessionId,
        timeout: Option<Duration>,
    ) -> Result<GenerationSession> {
        let handle = self.handle(id)?;
        let mut subscription = ProgressSubscription::new(handle.clone());
        with_optional_timeout(
            timeout,
            async move {
                while subscription.recv().await.is_some() {}
                Ok(())
            },
            &format!("waiting for session {}", id),
        )
        .await?;
        Ok(handle.snapshot())
    }

    /// Forget terminal sessions; returns how many were removed
    pub fn purge_finished(&self) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, handle| !handle.status().is_terminal());
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            debug!(removed, "Purged finished sessions");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Check a request can start and pick its template
fn resolve_template(catalog: &Catalog, request: &GenerationRequest) -> Result<String> {
    let provider_id = normalize_key(&request.provider_id);
    let framework = normalize_key(&request.framework);
    if provider_id.is_empty() {
        return Err(ValidationError::missing("provider_id").into());
    }
    if framework.is_empty() {
        return Err(ValidationError::missing("framework").into());
    }
    if catalog.provider(&provider_id).is_none() {
        return Err(WeaveError::not_found(ResourceKind::Provider, provider_id));
    }

    let named = match request
        .template_id
        .as_deref()
        .map(normalize_key)
        .filter(|t| !t.is_empty())
    {
        Some(template_id) => {
            let template = catalog
                .template(&template_id)
                .ok_or_else(|| WeaveError::not_found(ResourceKind::Template, &template_id))?;
            if template.provider_id != provider_id {
                return Err(ValidationError::new(
                    ValidationErrorKind::Consistency,
                    format!(
                        "template '{}' belongs to provider '{}', not '{}'",
                        template.id, template.provider_id, provider_id
                    ),
                )
                .with_field("template_id")
                .into());
            }
            Some(template.id.clone())
        }
        None => None,
    };

    let supported = catalog
        .compatibility()
        .lookup(&provider_id, &framework)
        .is_some_and(|info| info.compatibility_level.is_supported());
    if !supported {
        return Err(WeaveError::unsupported(provider_id, framework));
    }

    match named {
        Some(template_id) => Ok(template_id),
        None => catalog
            .default_template(&provider_id, &framework)
            .map(|t| t.id.clone())
            .ok_or_else(|| {
                ValidationError::new(
                    ValidationErrorKind::General,
                    format!(
                        "no template for '{}' on '{}'; name one explicitly",
                        provider_id, framework
                    ),
                )
                .with_field("template_id")
                .into()
            }),
    }
}

// =============================================================================
// Session Task
// =============================================================================

struct SessionRun {
    handle: Arc<SessionHandle>,
    catalog: Arc<Catalog>,
    cache: Arc<ResultCache>,
    renderer: Arc<dyn ContentRenderer>,
    enhancer: Option<Arc<dyn Enhancer>>,
    sink: Arc<dyn ArtifactSink>,
    request: GenerationRequest,
    template_id: String,
    fingerprint: Fingerprint,
    steps: Vec<Step>,
    from_cache: bool,
    cached: Option<GenerationOutput>,
    files: Vec<GeneratedFile>,
    changes: Vec<String>,
    warnings: Vec<String>,
    fallbacks: Vec<Fallback>,
}

impl SessionRun {
    async fn execute(mut self) {
        let steps = std::mem::take(&mut self.steps);
        let total = steps.len() as u32;
        let mut last_successful: Option<&'static str> = None;

        for (index, step) in steps.iter().enumerate() {
            if self.handle.is_cancelled() {
                debug!(session = %self.handle.id(), "Cancellation observed");
                return;
            }

            let step_number = index as u32 + 1;
            match self.run_step(*step).await {
                Ok(()) => {
                    let remaining = total - step_number;
                    let eta = (remaining > 0).then(|| {
                        self.handle.elapsed_secs() / step_number as f64 * remaining as f64
                    });
                    if !self.handle.advance(step_number, step.name(), eta) {
                        return;
                    }
                    last_successful = Some(step.name());
                }
                Err(e) if e.is_cancellation() => return,
                Err(e) => {
                    warn!(
                        session = %self.handle.id(),
                        step = step.name(),
                        error = %e,
                        "Generation step failed"
                    );
                    self.handle.fail(StepFailure {
                        step: step.name().to_string(),
                        step_number,
                        last_successful_step: last_successful.map(String::from),
                        message: e.to_string(),
                    });
                    return;
                }
            }
        }

        let files = self.files.len();
        if self.handle.complete(self.output()) {
            info!(
                session = %self.handle.id(),
                files,
                from_cache = self.from_cache,
                "Generation session completed"
            );
        }
    }

    async fn run_step(&mut self, step: Step) -> Result<()> {
        match step {
            Step::Validate => self.validate(),
            Step::Render => self.render().await,
            Step::Enhance => {
                self.enhance().await;
                Ok(())
            }
            Step::Persist => self.sink.persist(self.handle.id(), &self.files).await,
            Step::Cache => {
                // Fallbacks describe this run only; cache hits report their own
                let mut output = self.output();
                output.fallbacks.clear();
                let cache = &self.cache;
                let key = self.fingerprint.clone();
                self.handle
                    .run_if_live(|| cache.put_as(key, &output))
                    .unwrap_or(Err(WeaveError::Cancelled))
            }
            Step::LoadCached => {
                let cached = self.cached.take().ok_or_else(|| {
                    WeaveError::Internal("cached output already consumed".to_string())
                })?;
                self.files = cached.files;
                self.changes = cached.enhancement_changes;
                self.warnings = cached.warnings;
                Ok(())
            }
        }
    }

    fn validate(&mut self) -> Result<()> {
        let result = CompatibilityValidator::new(&self.catalog)
            .validate(&self.request.validation_request(&self.template_id));
        if !result.is_valid() {
            return Err(
                ValidationError::new(ValidationErrorKind::General, result.errors.join("; ")).into(),
            );
        }
        self.warnings = result.warnings;
        Ok(())
    }

    async fn render(&mut self) -> Result<()> {
        let template = self
            .catalog
            .template(&self.template_id)
            .ok_or_else(|| WeaveError::not_found(ResourceKind::Template, &self.template_id))?;
        let request = RenderRequest {
            template: template.clone(),
            framework_variant: normalize_key(&self.request.framework),
            context: RenderContext {
                provider_id: normalize_key(&self.request.provider_id),
                features: self.request.features.clone(),
                env_var_names: self.request.env_var_names.clone(),
            },
        };
        let files = self.renderer.render(&request).await?;
        if files.is_empty() {
            return Err(WeaveError::collaborator("renderer", "no files produced"));
        }
        self.files = files;
        Ok(())
    }

    /// Enhancement failure keeps the rendered files and records a fallback
    async fn enhance(&mut self) {
        let (Some(enhancer), Some(enhancement)) = (&self.enhancer, self.request.enhancement) else {
            return;
        };
        let options = EnhancementOptions {
            provider_id: normalize_key(&self.request.provider_id),
            framework: normalize_key(&self.request.framework),
            features: self.request.features.clone(),
        };
        match enhancer.enhance(self.files.clone(), enhancement, &options).await {
            Ok(enhanced) => {
                self.files = enhanced.files;
                self.changes = enhanced.changes;
            }
            Err(e) => {
                warn!(session = %self.handle.id(), error = %e, "Enhancement skipped");
                self.fallbacks.push(Fallback::EnhancementSkipped {
                    reason: e.to_string(),
                });
            }
        }
    }

    fn output(&self) -> GenerationOutput {
        GenerationOutput {
            template_id: self.template_id.clone(),
            fingerprint: self.fingerprint.clone(),
            files: self.files.clone(),
            enhancement_changes: self.changes.clone(),
            warnings: self.warnings.clone(),
            fallbacks: self.fallbacks.clone(),
            from_cache: self.from_cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::adapters::{ManifestRenderer, MemorySink};
    use crate::generation::collaborators::Enhancement;
    use crate::types::{ErrorKind, SessionStatus};
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum Behavior {
        Render,
        Fail,
        Stall,
        Panic,
    }

    struct TestRenderer {
        inner: ManifestRenderer,
        behavior: Behavior,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentRenderer for TestRenderer {
        async fn render(&self, request: &RenderRequest) -> Result<Vec<GeneratedFile>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Render => self.inner.render(request).await,
                Behavior::Fail => Err(WeaveError::collaborator("renderer", "renderer offline")),
                Behavior::Stall => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    self.inner.render(request).await
                }
                Behavior::Panic => panic!("renderer exploded"),
            }
        }
    }

    struct FailingEnhancer;

    #[async_trait]
    impl Enhancer for FailingEnhancer {
        async fn enhance(
            &self,
            _files: Vec<GeneratedFile>,
            _enhancement: EnhancementType,
            _options: &EnhancementOptions,
        ) -> Result<Enhancement> {
            Err(WeaveError::collaborator("enhancer", "model unavailable"))
        }
    }

    struct Fixture {
        orchestrator: Orchestrator,
        catalog: Arc<CatalogHandle>,
        renderer: Arc<TestRenderer>,
        sink: Arc<MemorySink>,
        cache: Arc<ResultCache>,
    }

    fn fixture(behavior: Behavior) -> Fixture {
        let catalog = Arc::new(CatalogHandle::new(Catalog::builtin().unwrap()));
        let cache = Arc::new(ResultCache::default());
        let sink = Arc::new(MemorySink::new());
        let renderer = Arc::new(TestRenderer {
            inner: ManifestRenderer::new(),
            behavior,
            calls: AtomicUsize::new(0),
        });
        let orchestrator =
            Orchestrator::new(catalog.clone(), cache.clone(), renderer.clone(), sink.clone());
        Fixture {
            orchestrator,
            catalog,
            renderer,
            sink,
            cache,
        }
    }

    fn stripe_request() -> GenerationRequest {
        GenerationRequest::new("stripe", "nextjs")
            .with_features(["webhooks"])
            .with_env_vars(["STRIPE_SECRET_KEY"])
    }

    #[test]
    fn test_plans() {
        use Step::*;
        assert_eq!(
            plan(GenerationMode::Generate, true, false),
            vec![Validate, Render, Enhance, Persist, Cache]
        );
        assert_eq!(plan(GenerationMode::Preview, false, false), vec![Validate, Render, Cache]);
        assert_eq!(plan(GenerationMode::Generate, true, true), vec![LoadCached, Persist]);
        assert_eq!(plan(GenerationMode::Preview, false, true), vec![LoadCached]);
    }

    #[tokio::test]
    async fn test_generation_completes() {
        let fx = fixture(Behavior::Render);
        let id = fx.orchestrator.start(stripe_request(), GenerationMode::Generate).unwrap();

        let session = fx.orchestrator.wait_for_completion(&id, None).await.unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.progress.progress, 100);
        assert_eq!(session.progress.total_steps, 4);
        assert!(!session.from_cache);

        let output = fx.orchestrator.result(&id).unwrap().unwrap();
        assert_eq!(output.template_id, "stripe-checkout-nextjs");
        assert!(!output.files.is_empty());
        assert_eq!(fx.sink.files(&id).unwrap(), output.files);
        assert_eq!(fx.cache.stats().size, 1);
    }

    #[tokio::test]
    async fn test_catalog_reload_does_not_affect_running_session() {
        let fx = fixture(Behavior::Render);
        let id = fx.orchestrator.start(stripe_request(), GenerationMode::Generate).unwrap();

        let acme = "providers:\n  - id: acme\n    name: Acme\n";
        fx.catalog.replace(Catalog::from_yaml_str(acme).unwrap());

        let session = fx.orchestrator.wait_for_completion(&id, None).await.unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        let output = fx.orchestrator.result(&id).unwrap().unwrap();
        assert_eq!(output.template_id, "stripe-checkout-nextjs");
        assert!(!output.files.is_empty());

        let err = fx
            .orchestrator
            .start(stripe_request(), GenerationMode::Generate)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_with_single_terminal_event() {
        let fx = fixture(Behavior::Render);
        let id = fx.orchestrator.start(stripe_request(), GenerationMode::Generate).unwrap();
        let subscription = fx.orchestrator.subscribe(&id).unwrap();

        let events: Vec<_> = subscription.into_stream().collect().await;
        assert_eq!(events.len(), 5);
        for pair in events.windows(2) {
            assert!(pair[0].progress.current_step_number <= pair[1].progress.current_step_number);
            assert!(pair[0].progress.progress <= pair[1].progress.progress);
            assert!(pair[0].sequence < pair[1].sequence);
        }
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        let last = events.last().unwrap();
        assert_eq!(last.status, SessionStatus::Completed);
        assert_eq!(events[0].status, SessionStatus::InProgress);
        assert_eq!(events[0].progress.current_step, steps::VALIDATE);
    }

    #[tokio::test]
    async fn test_second_identical_request_served_from_cache() {
        let fx = fixture(Behavior::Render);
        let first = fx.orchestrator.start(stripe_request(), GenerationMode::Generate).unwrap();
        fx.orchestrator.wait_for_completion(&first, None).await.unwrap();

        let second = fx.orchestrator.start(stripe_request(), GenerationMode::Generate).unwrap();
        let session = fx.orchestrator.wait_for_completion(&second, None).await.unwrap();

        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.from_cache);
        assert_eq!(session.progress.total_steps, 2);
        assert_eq!(fx.renderer.calls.load(Ordering::SeqCst), 1);

        let a = fx.orchestrator.result(&first).unwrap().unwrap();
        let b = fx.orchestrator.result(&second).unwrap().unwrap();
        assert_eq!(a.files, b.files);
        assert!(b.from_cache);
        assert_eq!(fx.sink.session_count(), 2);
    }

    #[tokio::test]
    async fn test_preview_skips_persistence() {
        let fx = fixture(Behavior::Render);
        let id = fx.orchestrator.start(stripe_request(), GenerationMode::Preview).unwrap();
        let session = fx.orchestrator.wait_for_completion(&id, None).await.unwrap();

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.mode, GenerationMode::Preview);
        assert!(fx.sink.files(&id).is_none());
        assert_eq!(fx.cache.stats().size, 1);
    }

    #[tokio::test]
    async fn test_cancel_while_starting() {
        let fx = fixture(Behavior::Render);
        let id = fx.orchestrator.start(stripe_request(), GenerationMode::Generate).unwrap();
        assert_eq!(fx.orchestrator.status(&id).unwrap().status, SessionStatus::Starting);

        assert!(fx.orchestrator.cancel(&id).unwrap());
        tokio::time::sleep(Duration::from_millis(20)).await;

        let session = fx.orchestrator.status(&id).unwrap();
        assert_eq!(session.status, SessionStatus::Cancelled);
        let batch = fx.orchestrator.poll_events(&id, 0).unwrap();
        assert!(batch.finished);
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.events[0].status, SessionStatus::Cancelled);
        assert_eq!(fx.renderer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.cache.stats().size, 0);
        assert!(fx.orchestrator.result(&id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_terminal_session_returns_false() {
        let fx = fixture(Behavior::Render);
        let id = fx.orchestrator.start(stripe_request(), GenerationMode::Generate).unwrap();
        fx.orchestrator.wait_for_completion(&id, None).await.unwrap();

        let before = fx.orchestrator.poll_events(&id, 0).unwrap();
        assert!(!fx.orchestrator.cancel(&id).unwrap());
        let after = fx.orchestrator.poll_events(&id, 0).unwrap();
        assert_eq!(before, after);
        assert_eq!(fx.orchestrator.status(&id).unwrap().status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_status_is_idempotent() {
        let fx = fixture(Behavior::Render);
        let id = fx.orchestrator.start(stripe_request(), GenerationMode::Preview).unwrap();
        fx.orchestrator.wait_for_completion(&id, None).await.unwrap();
        assert_eq!(fx.orchestrator.status(&id).unwrap(), fx.orchestrator.status(&id).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let fx = fixture(Behavior::Render);
        let id = SessionId::new("missing");
        assert_eq!(fx.orchestrator.status(&id).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(fx.orchestrator.cancel(&id).unwrap_err().kind(), ErrorKind::NotFound);
        assert!(fx.orchestrator.poll_events(&id, 0).is_err());
    }

    #[tokio::test]
    async fn test_renderer_failure_fails_session() {
        let fx = fixture(Behavior::Fail);
        let id = fx.orchestrator.start(stripe_request(), GenerationMode::Generate).unwrap();
        let session = fx.orchestrator.wait_for_completion(&id, None).await.unwrap();

        assert_eq!(session.status, SessionStatus::Failed);
        assert!(session.progress.has_error);
        assert!(session.progress.error_message.unwrap().contains("renderer offline"));
        let failure = session.failure.unwrap();
        assert_eq!(failure.step, steps::RENDER);
        assert_eq!(failure.step_number, 2);
        assert_eq!(failure.last_successful_step.as_deref(), Some(steps::VALIDATE));
        assert_eq!(fx.cache.stats().size, 0);
        assert!(fx.orchestrator.result(&id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_panicking_task_marks_session_failed() {
        let fx = fixture(Behavior::Panic);
        let id = fx.orchestrator.start(stripe_request(), GenerationMode::Generate).unwrap();
        let session = fx.orchestrator.wait_for_completion(&id, None).await.unwrap();

        assert_eq!(session.status, SessionStatus::Failed);
        let failure = session.failure.unwrap();
        assert_eq!(failure.step, steps::RENDER);
        assert!(failure.message.contains("panicked"));
    }

    #[tokio::test]
    async fn test_validation_errors_fail_first_step() {
        let fx = fixture(Behavior::Render);
        // Template for nextjs requested on react, with a required feature react cannot support
        let request = GenerationRequest::new("stripe", "react")
            .with_template("stripe-checkout-nextjs")
            .with_features(["webhooks"]);
        let id = fx.orchestrator.start(request, GenerationMode::Preview).unwrap();
        let session = fx.orchestrator.wait_for_completion(&id, None).await.unwrap();

        assert_eq!(session.status, SessionStatus::Failed);
        let failure = session.failure.unwrap();
        assert_eq!(failure.step_number, 1);
        assert!(failure.last_successful_step.is_none());
        assert_eq!(fx.renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_enhancer_failure_degrades() {
        let fx = fixture(Behavior::Render);
        let orchestrator = fx.orchestrator.with_enhancer(Arc::new(FailingEnhancer));
        let request = stripe_request().with_enhancement(EnhancementType::Security);
        let id = orchestrator.start(request, GenerationMode::Preview).unwrap();
        let session = orchestrator.wait_for_completion(&id, None).await.unwrap();

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.progress.total_steps, 4);
        let output = orchestrator.result(&id).unwrap().unwrap();
        assert!(matches!(
            output.fallbacks.as_slice(),
            [Fallback::EnhancementSkipped { .. }]
        ));
        assert!(output.enhancement_changes.is_empty());

        let request = stripe_request().with_enhancement(EnhancementType::Security);
        let again = orchestrator.start(request, GenerationMode::Preview).unwrap();
        let session = orchestrator.wait_for_completion(&again, None).await.unwrap();
        assert!(session.from_cache);
        let cached = orchestrator.result(&again).unwrap().unwrap();
        assert!(cached.fallbacks.is_empty());
        assert_eq!(cached.files, output.files);
    }

    #[tokio::test]
    async fn test_enhancement_without_enhancer_is_not_planned() {
        let fx = fixture(Behavior::Render);
        let request = stripe_request().with_enhancement(EnhancementType::Security);
        let id = fx.orchestrator.start(request, GenerationMode::Preview).unwrap();
        let session = fx.orchestrator.wait_for_completion(&id, None).await.unwrap();
        assert_eq!(session.progress.total_steps, 3);
        assert_eq!(session.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_start_rejects_bad_requests() {
        let fx = fixture(Behavior::Render);
        let start = |request: GenerationRequest| {
            fx.orchestrator
                .start(request, GenerationMode::Generate)
                .unwrap_err()
                .kind()
        };

        assert_eq!(start(GenerationRequest::new("", "nextjs")), ErrorKind::Validation);
        assert_eq!(start(GenerationRequest::new("acme", "nextjs")), ErrorKind::NotFound);
        assert_eq!(
            start(GenerationRequest::new("stripe", "nextjs").with_template("nope")),
            ErrorKind::NotFound
        );
        assert_eq!(
            start(GenerationRequest::new("stripe", "nextjs").with_template("openai-chat-nextjs")),
            ErrorKind::Validation
        );
        assert_eq!(
            start(GenerationRequest::new("stripe", "spring-boot")),
            ErrorKind::UnsupportedCombination
        );
        assert_eq!(
            start(GenerationRequest::new("stripe", "phoenix")),
            ErrorKind::UnsupportedCombination
        );
        assert_eq!(fx.orchestrator.session_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_and_list_active() {
        let fx = fixture(Behavior::Stall);
        let id = fx.orchestrator.start(stripe_request(), GenerationMode::Generate).unwrap();

        let result = fx
            .orchestrator
            .wait_for_completion(&id, Some(Duration::from_millis(50)))
            .await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Timeout);

        let active = fx.orchestrator.list_active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].status, SessionStatus::InProgress);

        assert!(fx.orchestrator.cancel(&id).unwrap());
        assert!(fx.orchestrator.list_active().is_empty());

        let session = fx.orchestrator.wait_for_completion(&id, None).await.unwrap();
        assert_eq!(session.status, SessionStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_purge_finished() {
        let fx = fixture(Behavior::Render);
        let id = fx.orchestrator.start(stripe_request(), GenerationMode::Preview).unwrap();
        fx.orchestrator.wait_for_completion(&id, None).await.unwrap();

        assert_eq!(fx.orchestrator.purge_finished(), 1);
        assert_eq!(fx.orchestrator.status(&id).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_unreadable_cache_entry_is_recorded() {
        let fx = fixture(Behavior::Render);
        let fingerprint = stripe_request().fingerprint("stripe-checkout-nextjs");
        fx.cache.put(fingerprint, serde_json::json!({"unexpected": true}));

        let id = fx.orchestrator.start(stripe_request(), GenerationMode::Preview).unwrap();
        fx.orchestrator.wait_for_completion(&id, None).await.unwrap();
        let output = fx.orchestrator.result(&id).unwrap().unwrap();
        assert!(!output.from_cache);
        assert!(matches!(
            output.fallbacks.as_slice(),
            [Fallback::CacheEntryUnreadable { .. }]
        ));
        assert_eq!(fx.renderer.calls.load(Ordering::SeqCst), 1);
    }
}
