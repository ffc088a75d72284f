//! Built-in collaborator implementations
//!
//! - [`ManifestRenderer`]: emits a catalog template's declared files as-is
//! - [`MemorySink`]: keeps persisted files in memory, per session
//! - [`MemoizedEnhancer`]: result-cache memoization around any [`Enhancer`]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use super::collaborators::{
    ArtifactSink, ContentRenderer, Enhancement, EnhancementOptions, Enhancer, GeneratedFile,
    RenderRequest,
};
use super::request::EnhancementType;
use crate::cache::{Fingerprint, ResultCache};
use crate::types::{Result, SessionId, WeaveError};

// =============================================================================
// Manifest Renderer
// =============================================================================

/// Renders by copying the template's file bodies without substitution
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestRenderer;

impl ManifestRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentRenderer for ManifestRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<GeneratedFile>> {
        let template = &request.template;
        if template.files.is_empty() {
            return Err(WeaveError::collaborator(
                "renderer",
                format!("template '{}' declares no files", template.id),
            ));
        }

        Ok(template
            .files
            .iter()
            .map(|file| GeneratedFile {
                path: file.path.clone(),
                content: file.content.clone(),
                file_type: file.file_type.clone(),
                language: file.language.clone(),
                is_required: file.is_required,
                category: file.category.clone(),
            })
            .collect())
    }
}

// =============================================================================
// Memory Sink
// =============================================================================

#[derive(Default)]
pub struct MemorySink {
    files: Mutex<HashMap<SessionId, Vec<GeneratedFile>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self, session_id: &SessionId) -> Option<Vec<GeneratedFile>> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(session_id)
            .cloned()
    }

    pub fn session_count(&self) -> usize {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn persist(&self, session_id: &SessionId, files: &[GeneratedFile]) -> Result<()> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(session_id.clone(), files.to_vec());
        debug!(session = %session_id, files = files.len(), "Persisted files in memory");
        Ok(())
    }
}

// =============================================================================
// Memoized Enhancer
// =============================================================================

const ENHANCE_NAMESPACE: &str = "enhance";

/// Serves repeated enhancement requests from the shared result cache
pub struct MemoizedEnhancer<E> {
    inner: E,
    cache: Arc<ResultCache>,
}

impl<E: Enhancer> MemoizedEnhancer<E> {
    pub fn new(inner: E, cache: Arc<ResultCache>) -> Self {
        Self { inner, cache }
    }

    fn key(files: &[GeneratedFile], enhancement: EnhancementType, options: &EnhancementOptions) -> Fingerprint {
        let mut parts = vec![
            enhancement.to_string(),
            options.provider_id.clone(),
            options.framework.clone(),
            options.features.iter().cloned().collect::<Vec<_>>().join(","),
        ];
        for file in files {
            parts.push(file.path.clone());
            parts.push(file.content.clone());
        }
        Fingerprint::for_parts(ENHANCE_NAMESPACE, &parts)
    }
}

#[async_trait]
impl<E: Enhancer> Enhancer for MemoizedEnhancer<E> {
    async fn enhance(
        &self,
        files: Vec<GeneratedFile>,
        enhancement: EnhancementType,
        options: &EnhancementOptions,
    ) -> Result<Enhancement> {
        let key = Self::key(&files, enhancement, options);

        match self.cache.get_as::<Enhancement>(&key) {
            Ok(Some(cached)) => {
                debug!(key = key.short(), "Enhancement served from cache");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => {
                debug!(key = key.short(), error = %e, "Dropping unreadable enhancement entry");
                self.cache.invalidate(&key);
            }
        }

        let enhanced = self.inner.enhance(files, enhancement, options).await?;
        self.cache.put_as(key, &enhanced)?;
        Ok(enhanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEnhancer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Enhancer for CountingEnhancer {
        async fn enhance(
            &self,
            mut files: Vec<GeneratedFile>,
            enhancement: EnhancementType,
            _options: &EnhancementOptions,
        ) -> Result<Enhancement> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for file in &mut files {
                file.content.push_str("\n// reviewed");
            }
            Ok(Enhancement {
                files,
                changes: vec![format!("{} pass", enhancement)],
            })
        }
    }

    fn file(path: &str, content: &str) -> GeneratedFile {
        GeneratedFile {
            path: path.to_string(),
            content: content.to_string(),
            file_type: "source".to_string(),
            language: "typescript".to_string(),
            is_required: true,
            category: "api".to_string(),
        }
    }

    fn render_request(template_id: &str) -> RenderRequest {
        let catalog = Catalog::builtin().unwrap();
        RenderRequest {
            template: catalog.template(template_id).unwrap().clone(),
            framework_variant: "nextjs".to_string(),
            context: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_manifest_renderer_emits_template_files() {
        let request = render_request("stripe-checkout-nextjs");
        let files = ManifestRenderer::new().render(&request).await.unwrap();
        assert_eq!(files.len(), request.template.files.len());
        assert_eq!(files[0].content, request.template.files[0].content);
    }

    #[tokio::test]
    async fn test_manifest_renderer_rejects_empty_template() {
        let mut request = render_request("stripe-checkout-nextjs");
        request.template.files.clear();
        let result = ManifestRenderer::new().render(&request).await;
        assert!(matches!(result, Err(WeaveError::Collaborator { .. })));
    }

    #[tokio::test]
    async fn test_memory_sink() {
        let sink = MemorySink::new();
        let id = SessionId::new("s-1");
        sink.persist(&id, &[file("a.ts", "x")]).await.unwrap();
        assert_eq!(sink.files(&id).unwrap().len(), 1);
        assert_eq!(sink.session_count(), 1);
        assert!(sink.files(&SessionId::new("other")).is_none());
    }

    #[tokio::test]
    async fn test_memoized_enhancer_calls_backend_once() {
        let cache = Arc::new(ResultCache::default());
        let enhancer = MemoizedEnhancer::new(
            CountingEnhancer {
                calls: AtomicUsize::new(0),
            },
            cache.clone(),
        );
        let options = EnhancementOptions {
            provider_id: "stripe".to_string(),
            framework: "nextjs".to_string(),
            ..Default::default()
        };

        let first = enhancer
            .enhance(vec![file("a.ts", "x")], EnhancementType::Security, &options)
            .await
            .unwrap();
        let second = enhancer
            .enhance(vec![file("a.ts", "x")], EnhancementType::Security, &options)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(enhancer.inner.calls.load(Ordering::SeqCst), 1);

        enhancer
            .enhance(vec![file("a.ts", "y")], EnhancementType::Security, &options)
            .await
            .unwrap();
        assert_eq!(enhancer.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().hit_count, 1);
    }
}
