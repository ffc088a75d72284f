//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Detection scoring constants
///
/// Heuristic defaults; every one of them is overridable through
/// `DetectionConfig::weights`.
pub mod scoring {
    /// Weight of a fuzzy (substring) match
    pub const SUBSTRING_MATCH_WEIGHT: f32 = 0.4;

    /// Weight of an exact name match
    pub const EXACT_MATCH_WEIGHT: f32 = 0.6;

    /// Project-level bonus per corroborating framework
    pub const CORROBORATION_BONUS: f32 = 0.05;

    /// Maximum number of corroborating frameworks that earn the bonus
    pub const CORROBORATION_CAP: usize = 3;
}

/// Detector result filtering
pub mod detection {
    pub const MIN_CONFIDENCE: f32 = 0.1;
    pub const MAX_CONFIDENCE: f32 = 1.0;
    pub const MAX_RESULTS: usize = 10;
}

/// Suggestion engine constants
pub mod suggestion {
    /// Bonus for templates targeting a detected framework
    pub const FRAMEWORK_MATCH_BONUS: f32 = 0.1;

    /// Maximum number of suggestions returned
    pub const MAX_SUGGESTIONS: usize = 20;
}

/// Cache constants
pub mod cache {
    /// Cache entry expiration (hours)
    pub const CACHE_EXPIRATION_HOURS: u64 = 24;

    /// Maximum entries before least-recently-used eviction
    pub const MAX_ENTRIES: usize = 1000;
}

/// Scanner constants
pub mod scanner {
    /// Maximum manifest size to parse (1MB)
    pub const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Maximum directory depth walked below the project root
    pub const MAX_DEPTH: usize = 4;
}

/// Generation step names, shared by the orchestrator and progress renderers
pub mod steps {
    pub const VALIDATE: &str = "Validating combination";
    pub const RENDER: &str = "Rendering templates";
    pub const ENHANCE: &str = "Enhancing output";
    pub const PERSIST: &str = "Persisting files";
    pub const CACHE: &str = "Caching result";
    pub const LOAD_CACHED: &str = "Loading cached result";
}
