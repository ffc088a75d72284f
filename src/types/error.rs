//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Kinds
//!
//! - **NotFound**: Unknown provider, template or session id
//! - **Validation**: Well-formed but semantically invalid request
//! - **UnsupportedCombination**: Provider/framework pair absent from the compatibility model
//! - **GenerationFailure**: A generation step's collaborator failed irrecoverably
//! - **Cancelled**: Cooperative cancellation observed (a terminal state, not a fault)
//!
//! Detection, suggestion and validation never produce these as `Err`; they
//! return structured results instead. Only session creation and polling
//! surface hard failures.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Kinds
// =============================================================================

/// Coarse classification used by callers to pick a presentation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    UnsupportedCombination,
    GenerationFailure,
    Cancelled,
    Timeout,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::UnsupportedCombination => write!(f, "UNSUPPORTED_COMBINATION"),
            Self::GenerationFailure => write!(f, "GENERATION_FAILURE"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// What kind of resource a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Provider,
    Template,
    Session,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provider => write!(f, "provider"),
            Self::Template => write!(f, "template"),
            Self::Session => write!(f, "session"),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Structured validation error with context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// What validation failed
    pub kind: ValidationErrorKind,
    /// Field or component that failed validation
    pub field: Option<String>,
    /// Detailed message
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "Validation failed for '{}': {}", field, self.message)
        } else {
            write!(f, "Validation failed: {}", self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
        }
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Create a missing-field error for `field`
    pub fn missing(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ValidationErrorKind::MissingField,
            format!("'{}' must not be empty", field),
        )
        .with_field(field)
    }
}

/// Validation error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Required field missing or blank
    MissingField,
    /// Value out of range
    Range,
    /// Cross-reference check failed (e.g. template belongs to another provider)
    Consistency,
    /// General validation error
    General,
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum WeaveError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Unknown {kind}: '{id}'")]
    NotFound { kind: ResourceKind, id: String },

    #[error("{0}")]
    Validation(ValidationError),

    #[error("Framework '{framework}' is not supported for provider '{provider}'")]
    UnsupportedCombination { provider: String, framework: String },

    #[error("Generation failed at step '{step}': {message}")]
    Generation { step: String, message: String },

    #[error("Cancellation requested")]
    Cancelled,

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    // -------------------------------------------------------------------------
    // Infrastructure Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Scan error in {path}: {message}")]
    Scan { path: String, message: String },

    #[error("Collaborator '{name}' failed: {message}")]
    Collaborator { name: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for WeaveError {
    fn from(err: ValidationError) -> Self {
        WeaveError::Validation(err)
    }
}

pub type Result<T> = std::result::Result<T, WeaveError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl WeaveError {
    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn unsupported(provider: impl Into<String>, framework: impl Into<String>) -> Self {
        Self::UnsupportedCombination {
            provider: provider.into(),
            framework: framework.into(),
        }
    }

    pub fn generation(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            step: step.into(),
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn collaborator(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into the taxonomy callers branch on
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::UnsupportedCombination { .. } => ErrorKind::UnsupportedCombination,
            Self::Generation { .. } | Self::Collaborator { .. } => ErrorKind::GenerationFailure,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Io(_)
            | Self::Json(_)
            | Self::Yaml(_)
            | Self::Config(_)
            | Self::Catalog(_)
            | Self::Scan { .. }
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Cancellation is a normal terminal state, never reported as a failure
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| WeaveError::Internal(format!("{}: {}", context.into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::NotFound.to_string(), "NOT_FOUND");
        assert_eq!(
            ErrorKind::UnsupportedCombination.to_string(),
            "UNSUPPORTED_COMBINATION"
        );
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            WeaveError::not_found(ResourceKind::Session, "abc").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            WeaveError::unsupported("stripe", "django").kind(),
            ErrorKind::UnsupportedCombination
        );
        assert_eq!(
            WeaveError::collaborator("renderer", "boom").kind(),
            ErrorKind::GenerationFailure
        );
        assert_eq!(WeaveError::Cancelled.kind(), ErrorKind::Cancelled);
        assert!(WeaveError::Cancelled.is_cancellation());
    }

    #[test]
    fn test_not_found_display() {
        let err = WeaveError::not_found(ResourceKind::Template, "stripe-checkout");
        assert_eq!(err.to_string(), "Unknown template: 'stripe-checkout'");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::missing("provider_id");
        assert_eq!(err.kind, ValidationErrorKind::MissingField);
        assert_eq!(
            err.to_string(),
            "Validation failed for 'provider_id': 'provider_id' must not be empty"
        );
    }

    #[test]
    fn test_with_context() {
        let res: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::other("disk gone"));
        let err = res.with_context("reading catalog").unwrap_err();
        assert!(err.to_string().contains("reading catalog: disk gone"));
    }
}
