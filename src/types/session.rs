//! Generation session types
//!
//! - Session types: GenerationSession, SessionStatus, GenerationMode
//! - Progress types: Progress, StepFailure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SessionId;

// =============================================================================
// Session Types
// =============================================================================

/// Lifecycle state of a generation session.
///
/// `Starting → InProgress → {Completed | Failed | Cancelled}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Starting,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Starting | Self::InProgress)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => write!(f, "starting"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Whether a session persists its files or only computes them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Generate,
    Preview,
}

impl GenerationMode {
    pub fn is_preview(&self) -> bool {
        matches!(self, Self::Preview)
    }
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generate => write!(f, "generate"),
            Self::Preview => write!(f, "preview"),
        }
    }
}

// =============================================================================
// Progress Types
// =============================================================================

/// Progress snapshot. `current_step_number` and `progress` never decrease
/// while the session is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub current_step: String,
    pub current_step_number: u32,
    pub total_steps: u32,
    /// Percent complete, 0-100
    pub progress: u8,
    pub status_message: String,
    pub has_error: bool,
    pub error_message: Option<String>,
    pub eta_seconds: Option<f64>,
}

impl Progress {
    pub fn initial(total_steps: u32) -> Self {
        Self {
            current_step: String::new(),
            current_step_number: 0,
            total_steps,
            progress: 0,
            status_message: "Queued".to_string(),
            has_error: false,
            error_message: None,
            eta_seconds: None,
        }
    }

    /// Percent for having finished `step_number` of `total_steps`
    pub fn percent_for(step_number: u32, total_steps: u32) -> u8 {
        if total_steps == 0 {
            return 100;
        }
        let pct = (step_number.min(total_steps) as u64 * 100) / total_steps as u64;
        pct as u8
    }
}

/// Where a failed session stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: String,
    pub step_number: u32,
    pub last_successful_step: Option<String>,
    pub message: String,
}

impl std::fmt::Display for StepFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.last_successful_step {
            Some(last) => write!(
                f,
                "step {} '{}' failed after '{}': {}",
                self.step_number, self.step, last, self.message
            ),
            None => write!(
                f,
                "step {} '{}' failed: {}",
                self.step_number, self.step, self.message
            ),
        }
    }
}

/// Externally visible snapshot of one generation or preview run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSession {
    pub id: SessionId,
    pub provider_id: String,
    pub mode: GenerationMode,
    pub status: SessionStatus,
    pub progress: Progress,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
    /// Result was served from the result cache
    pub from_cache: bool,
    pub failure: Option<StepFailure>,
}
