//! Template suggestion types

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::fallback::Fallback;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

/// A template judged applicable to the project, with the reasoning behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSuggestion {
    pub template_id: String,
    pub template_name: String,
    pub provider_id: String,
    pub provider_name: String,
    pub confidence: f32,
    pub reason: String,
    pub framework: String,
    pub required_env_vars: BTreeSet<String>,
    pub estimated_setup_time: String,
    pub difficulty_level: DifficultyLevel,
    pub tags: BTreeSet<String>,
}

/// Suggestions for a project plus how they were obtained
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestionReport {
    pub suggestions: Vec<TemplateSuggestion>,
    /// Frameworks used to bias the ranking (empty when no project was scanned)
    #[serde(default)]
    pub detected_frameworks: Vec<String>,
    #[serde(default)]
    pub fallback: Option<Fallback>,
}

/// Render a setup estimate in minutes the way catalogs display it
pub fn format_setup_time(minutes: u32) -> String {
    match minutes {
        0 => "under a minute".to_string(),
        1 => "1 minute".to_string(),
        m if m < 60 => format!("{} minutes", m),
        m if m % 60 == 0 => {
            let hours = m / 60;
            if hours == 1 {
                "1 hour".to_string()
            } else {
                format!("{} hours", hours)
            }
        }
        m => format!("{}h {}m", m / 60, m % 60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_setup_time() {
        assert_eq!(format_setup_time(1), "1 minute");
        assert_eq!(format_setup_time(15), "15 minutes");
        assert_eq!(format_setup_time(60), "1 hour");
        assert_eq!(format_setup_time(120), "2 hours");
        assert_eq!(format_setup_time(90), "1h 30m");
    }
}
