pub mod compatibility;
pub mod detection;
pub mod error;
pub mod evidence;
pub mod fallback;
pub mod session;
pub mod template;

pub use compatibility::{
    BatchValidationResult, CompatibilityLevel, FeatureRule, FrameworkCompatibilityInfo,
    TemplateValidationResult, ValidationRequest, ValidationSummary,
};
pub use detection::{DetectionReport, FrameworkDetectionResult, confidence_from};
pub use error::{
    ErrorKind, ResourceKind, Result, ResultExt, ValidationError, ValidationErrorKind, WeaveError,
};
pub use evidence::{Evidence, EvidenceType, FrameworkSignal};
pub use fallback::Fallback;
pub use session::{
    GenerationMode, GenerationSession, Progress, SessionStatus, StepFailure,
};
pub use template::{DifficultyLevel, SuggestionReport, TemplateSuggestion, format_setup_time};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type-safe wrapper for session IDs
///
/// The only externally visible handle to a generation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize an identifier (provider, template, framework, feature) for lookup
#[inline]
pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_generate_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_session_id_serde_transparent() {
        let id = SessionId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  NextJS "), "nextjs");
    }
}
