//! External collaborator interfaces
//!
//! The orchestrator drives these seams but does not implement them:
//! - [`ContentRenderer`]: template → files (failure fails the session)
//! - [`Enhancer`]: optional AI pass over files (failure is tolerated)
//! - [`ArtifactSink`]: persistence of generated files (generate mode only)

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::request::EnhancementType;
use crate::catalog::TemplateDefinition;
use crate::types::{Result, SessionId};

/// One generated source or config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
    pub file_type: String,
    pub language: String,
    pub is_required: bool,
    pub category: String,
}

/// Values a renderer may substitute into template bodies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderContext {
    pub provider_id: String,
    pub features: BTreeSet<String>,
    pub env_var_names: BTreeSet<String>,
}

/// What to render. `template` comes from the session's catalog snapshot, so a
/// catalog reload mid-session cannot change it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub template: TemplateDefinition,
    pub framework_variant: String,
    pub context: RenderContext,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancementOptions {
    pub provider_id: String,
    pub framework: String,
    pub features: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enhancement {
    pub files: Vec<GeneratedFile>,
    /// Human-readable list of what the enhancer changed
    pub changes: Vec<String>,
}

#[async_trait]
pub trait ContentRenderer: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<GeneratedFile>>;
}

#[async_trait]
pub trait Enhancer: Send + Sync {
    async fn enhance(
        &self,
        files: Vec<GeneratedFile>,
        enhancement: EnhancementType,
        options: &EnhancementOptions,
    ) -> Result<Enhancement>;
}

#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn persist(&self, session_id: &SessionId, files: &[GeneratedFile]) -> Result<()>;
}
