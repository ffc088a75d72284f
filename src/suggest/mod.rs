//! Template Suggestion Engine
//!
//! Ranks catalog templates against the environment variable names a project
//! declares, optionally biased toward frameworks detected in the project.
//!
//! ## Scoring
//!
//! Each supplied name counts at most once per template:
//! - exact (case-insensitive) match on a required variable → exact weight
//! - otherwise a key pattern or the provider id inside the name → substring weight
//!
//! A detected framework adds a flat bonus to an already non-zero score.

use std::collections::BTreeSet;

use tracing::debug;

use crate::catalog::{Catalog, TemplateDefinition};
use crate::config::{MatchKind, ScoringWeights, SuggestionConfig};
use crate::types::{FrameworkDetectionResult, TemplateSuggestion, format_setup_time, normalize_key};

#[derive(Debug, Clone, Default)]
pub struct SuggestionEngine {
    config: SuggestionConfig,
    weights: ScoringWeights,
}

/// Internal ranking record (setup minutes are kept numeric for tie-breaks)
struct Scored {
    suggestion: TemplateSuggestion,
    setup_minutes: u32,
}

impl SuggestionEngine {
    pub fn new(config: SuggestionConfig, weights: ScoringWeights) -> Self {
        Self { config, weights }
    }

    pub fn suggest(
        &self,
        catalog: &Catalog,
        env_var_names: &BTreeSet<String>,
        detected: &[FrameworkDetectionResult],
    ) -> Vec<TemplateSuggestion> {
        let names: BTreeSet<String> = env_var_names
            .iter()
            .map(|n| n.trim().to_uppercase())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return Vec::new();
        }

        let detected: BTreeSet<String> = detected
            .iter()
            .map(|d| normalize_key(&d.framework))
            .collect();

        let mut scored: Vec<Scored> = catalog
            .templates()
            .filter_map(|template| self.score(catalog, template, &names, &detected))
            .collect();

        scored.sort_by(|a, b| {
            b.suggestion
                .confidence
                .total_cmp(&a.suggestion.confidence)
                .then_with(|| a.setup_minutes.cmp(&b.setup_minutes))
                .then_with(|| a.suggestion.template_id.cmp(&b.suggestion.template_id))
        });
        scored.truncate(self.config.max_suggestions);

        debug!(
            env_vars = names.len(),
            suggestions = scored.len(),
            "Template suggestions ranked"
        );

        scored.into_iter().map(|s| s.suggestion).collect()
    }

    fn score(
        &self,
        catalog: &Catalog,
        template: &TemplateDefinition,
        names: &BTreeSet<String>,
        detected: &BTreeSet<String>,
    ) -> Option<Scored> {
        let required: BTreeSet<String> = template
            .required_env_vars
            .iter()
            .map(|v| v.trim().to_uppercase())
            .collect();
        let patterns: Vec<String> = template
            .env_key_patterns
            .iter()
            .map(|p| p.trim().to_uppercase())
            .chain(std::iter::once(template.provider_id.to_uppercase()))
            .filter(|p| !p.is_empty())
            .collect();

        let mut exact = Vec::new();
        let mut fuzzy = Vec::new();
        for name in names {
            match match_kind(name, &required, &patterns) {
                Some(MatchKind::Exact) => exact.push(name.as_str()),
                Some(MatchKind::Substring) => fuzzy.push(name.as_str()),
                None => {}
            }
        }
        if exact.is_empty() && fuzzy.is_empty() {
            return None;
        }

        let mut confidence = exact.len() as f32 * self.weights.match_weight(MatchKind::Exact)
            + fuzzy.len() as f32 * self.weights.match_weight(MatchKind::Substring);

        let framework_detected = detected.contains(&template.framework);
        if framework_detected {
            confidence += self.config.framework_match_bonus;
        }

        let missing: Vec<&str> = required
            .iter()
            .filter(|r| !names.contains(*r))
            .map(String::as_str)
            .collect();

        let mut reasons = Vec::new();
        if !exact.is_empty() {
            reasons.push(format!("Matches required {}", exact.join(", ")));
        }
        if !fuzzy.is_empty() {
            reasons.push(format!("Related to {}", fuzzy.join(", ")));
        }
        if framework_detected {
            reasons.push(format!("{} detected in project", template.framework));
        }
        if !missing.is_empty() {
            reasons.push(format!("Still needs {}", missing.join(", ")));
        }

        let provider_name = catalog
            .provider(&template.provider_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| template.provider_id.clone());

        Some(Scored {
            suggestion: TemplateSuggestion {
                template_id: template.id.clone(),
                template_name: template.name.clone(),
                provider_id: template.provider_id.clone(),
                provider_name,
                confidence: confidence.clamp(0.0, 1.0),
                reason: reasons.join("; "),
                framework: template.framework.clone(),
                required_env_vars: template.required_env_vars.clone(),
                estimated_setup_time: format_setup_time(template.estimated_setup_minutes),
                difficulty_level: template.difficulty,
                tags: template.tags.clone(),
            },
            setup_minutes: template.estimated_setup_minutes,
        })
    }
}

fn match_kind(name: &str, required: &BTreeSet<String>, patterns: &[String]) -> Option<MatchKind> {
    if required.contains(name) {
        Some(MatchKind::Exact)
    } else if patterns.iter().any(|p| name.contains(p.as_str())) {
        Some(MatchKind::Substring)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::FrameworkDetector;
    use crate::types::{Evidence, FrameworkSignal};

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn engine() -> SuggestionEngine {
        SuggestionEngine::default()
    }

    fn detected(framework: &str) -> Vec<FrameworkDetectionResult> {
        FrameworkDetector::default().detect(&[FrameworkSignal::new(
            framework,
            Evidence::dependency(framework, 0.6, "package.json"),
        )])
    }

    #[test]
    fn test_no_overlap_excluded() {
        let catalog = Catalog::builtin().unwrap();
        let result = engine().suggest(&catalog, &names(&["DATABASE_URL", "PORT"]), &[]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_exact_and_pattern_weights() {
        let catalog = Catalog::builtin().unwrap();
        let result = engine().suggest(
            &catalog,
            &names(&["stripe_secret_key", "STRIPE_PRICE_ID", "STRIPE_SECRET_KEY"]),
            &[],
        );

        let checkout = result
            .iter()
            .find(|s| s.template_id == "stripe-checkout-nextjs")
            .unwrap();
        // One exact name (deduped after uppercasing) plus one pattern match
        assert!((checkout.confidence - 1.0).abs() < 1e-6);
        assert!(checkout.reason.contains("Matches required STRIPE_SECRET_KEY"));
        assert!(checkout.reason.contains("Related to STRIPE_PRICE_ID"));
        assert!(checkout.reason.contains("Still needs STRIPE_WEBHOOK_SECRET"));

        let django = result
            .iter()
            .find(|s| s.template_id == "stripe-subscriptions-django")
            .unwrap();
        assert_eq!(django.confidence, 1.0);
    }

    #[test]
    fn test_ties_prefer_quicker_setup() {
        let catalog = Catalog::builtin().unwrap();
        let result = engine().suggest(&catalog, &names(&["STRIPE_API_VERSION"]), &[]);
        let ids: Vec<&str> = result.iter().map(|s| s.template_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "stripe-checkout-nextjs",
                "stripe-webhooks-express",
                "stripe-subscriptions-django"
            ]
        );
        assert!(result.iter().all(|s| (s.confidence - 0.4).abs() < 1e-6));
        assert_eq!(result[0].estimated_setup_time, "15 minutes");
    }

    #[test]
    fn test_framework_bonus_reorders() {
        let catalog = Catalog::builtin().unwrap();
        let env = names(&["STRIPE_API_VERSION"]);
        let result = engine().suggest(&catalog, &env, &detected("express"));
        assert_eq!(result[0].template_id, "stripe-webhooks-express");
        assert!((result[0].confidence - 0.5).abs() < 1e-6);
        assert!(result[0].reason.contains("express detected in project"));
    }

    #[test]
    fn test_bonus_never_creates_a_match() {
        let catalog = Catalog::builtin().unwrap();
        let result = engine().suggest(&catalog, &names(&["PORT"]), &detected("nextjs"));
        assert!(result.is_empty());
    }

    #[test]
    fn test_truncates_to_max() {
        let catalog = Catalog::builtin().unwrap();
        let engine = SuggestionEngine::new(
            SuggestionConfig {
                max_suggestions: 2,
                ..Default::default()
            },
            ScoringWeights::default(),
        );
        let result = engine.suggest(
            &catalog,
            &names(&["STRIPE_SECRET_KEY", "OPENAI_API_KEY", "TWILIO_AUTH_TOKEN"]),
            &[],
        );
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_catalog_untouched() {
        let catalog = Catalog::builtin().unwrap();
        let before: Vec<_> = catalog.templates().cloned().collect();
        let _ = engine().suggest(&catalog, &names(&["STRIPE_SECRET_KEY"]), &detected("nextjs"));
        let after: Vec<_> = catalog.templates().cloned().collect();
        assert_eq!(before, after);
    }
}
