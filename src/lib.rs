//! ApiWeave - Framework-Aware Integration Template Engine
//!
//! Detects which web frameworks a project uses, ranks integration templates
//! for the API providers its environment points at, checks that a
//! provider/framework/feature combination is supported, and drives template
//! generation through tracked, cancellable sessions backed by a TTL cache.
//!
//! ## Quick Start
//!
//! ```ignore
//! use apiweave::{GenerationRequest, IntegrationService};
//!
//! let service = IntegrationService::builder().build()?;
//! let report = service.detect_frameworks(&project_path).await;
//!
//! let id = service.start_generation(GenerationRequest::new("stripe", "nextjs"))?;
//! let session = service.wait_for_completion(&id, None).await?;
//! ```
//!
//! ## Modules
//!
//! - [`analyzer`]: Project scanning and framework detection
//! - [`catalog`]: Providers, templates and the compatibility matrix
//! - [`suggest`]: Template ranking from environment variable names
//! - [`validation`]: Combination checks against the catalog
//! - [`generation`]: Session orchestration, progress events, collaborators
//! - [`cache`]: Fingerprinted TTL result cache
//! - [`service`]: The facade tying the above together

pub mod analyzer;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod generation;
pub mod service;
pub mod suggest;
pub mod types;
pub mod validation;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorKind, Result, ResultExt, WeaveError};

// Service
pub use service::{IntegrationService, IntegrationServiceBuilder};

// =============================================================================
// Engine Re-exports
// =============================================================================

pub use analyzer::{EvidenceScanner, FileEvidenceScanner, FrameworkDetector};
pub use cache::{CacheStats, Fingerprint, ResultCache};
pub use catalog::{Catalog, CatalogHandle};
pub use suggest::SuggestionEngine;
pub use validation::CompatibilityValidator;

// =============================================================================
// Generation Re-exports
// =============================================================================

pub use generation::{
    ArtifactSink, ContentRenderer, EnhancementType, Enhancer, GenerationOutput, GenerationRequest,
    Orchestrator, ProgressEvent, ProgressSubscription,
};
pub use types::{GenerationMode, GenerationSession, SessionId, SessionStatus};
