//! Generation sessions
//!
//! - [`Orchestrator`]: session registry, step plans, cancellation
//! - [`ProgressSubscription`] / [`EventBatch`]: push and pull progress delivery
//! - Collaborator seams: [`ContentRenderer`], [`Enhancer`], [`ArtifactSink`]

pub mod adapters;
pub mod collaborators;
mod orchestrator;
pub mod progress;
mod request;
mod session;
pub mod timeout;

pub use adapters::{ManifestRenderer, MemoizedEnhancer, MemorySink};
pub use collaborators::{
    ArtifactSink, ContentRenderer, Enhancement, EnhancementOptions, Enhancer, GeneratedFile,
    RenderContext, RenderRequest,
};
pub use orchestrator::Orchestrator;
pub use progress::{EventBatch, ProgressEvent, ProgressSubscription};
pub use request::{EnhancementType, GenerationOutput, GenerationRequest};
pub use timeout::{with_optional_timeout, with_timeout};
