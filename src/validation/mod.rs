//! Compatibility Validator
//!
//! Checks (provider, template?, framework, features) tuples against the
//! catalog's compatibility model. Never fails: every problem becomes a
//! diagnostic on the returned [`TemplateValidationResult`].

use std::collections::BTreeSet;

use tracing::debug;

use crate::catalog::Catalog;
use crate::types::{
    BatchValidationResult, CompatibilityLevel, TemplateValidationResult, ValidationRequest,
    ValidationSummary, normalize_key,
};

pub const UNSUPPORTED_FRAMEWORK_REQUIREMENT: &str = "Framework not supported for this provider";

pub struct CompatibilityValidator<'a> {
    catalog: &'a Catalog,
}

impl<'a> CompatibilityValidator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn validate(&self, request: &ValidationRequest) -> TemplateValidationResult {
        let mut result = TemplateValidationResult::default();
        let provider_id = normalize_key(&request.provider_id);
        let framework = normalize_key(&request.framework);

        if provider_id.is_empty() {
            result.error("Provider id is required");
        }
        if framework.is_empty() {
            result.error("Framework is required");
        }
        if !result.errors.is_empty() {
            return result.finish();
        }

        let Some(provider) = self.catalog.provider(&provider_id) else {
            result.error(format!("Provider '{}' not found", provider_id));
            return result.finish();
        };

        let model = self.catalog.compatibility();
        result.compatible_frameworks = model.compatible_frameworks(&provider_id);

        let mut named_template = None;
        if let Some(template_id) = request
            .template_id
            .as_deref()
            .map(normalize_key)
            .filter(|t| !t.is_empty())
        {
            match self.catalog.template(&template_id) {
                None => result.error(format!("Template '{}' not found", template_id)),
                Some(template) if template.provider_id != provider_id => {
                    result.error(format!(
                        "Template '{}' belongs to provider '{}', not '{}'",
                        template_id, template.provider_id, provider_id
                    ));
                }
                Some(template) => {
                    if template.framework != framework {
                        result.warning(format!(
                            "Template '{}' targets '{}'; using it with '{}' may need manual changes",
                            template_id, template.framework, framework
                        ));
                    }
                    named_template = Some(template);
                }
            }
        }

        let Some(info) = model.lookup(&provider_id, &framework) else {
            result.compatibility_level = CompatibilityLevel::Unsupported;
            result.error(format!(
                "Framework '{}' is not supported for provider '{}'",
                framework, provider_id
            ));
            result
                .missing_requirements
                .push(UNSUPPORTED_FRAMEWORK_REQUIREMENT.to_string());
            return result.finish();
        };

        result.compatibility_level = info.compatibility_level;

        match info.compatibility_level {
            CompatibilityLevel::Unsupported => {
                result.error(format!(
                    "{} does not support framework '{}'",
                    provider.name, framework
                ));
                result
                    .missing_requirements
                    .extend(info.limitations.iter().cloned());
            }
            level => {
                if matches!(level, CompatibilityLevel::Partial | CompatibilityLevel::Minimal) {
                    result.warning(format!(
                        "{} has {} support for '{}'",
                        provider.name, level, framework
                    ));
                }
                for limitation in &info.limitations {
                    result.warning(limitation.clone());
                }
            }
        }

        let requested: BTreeSet<String> = request
            .features
            .iter()
            .map(|f| normalize_key(f))
            .filter(|f| !f.is_empty())
            .collect();

        for feature in requested.difference(&info.supported_features) {
            if model.is_required_feature(&provider_id, feature) {
                result.error(format!(
                    "Feature '{}' is required for {} but not supported on '{}'",
                    feature, provider.name, framework
                ));
            } else {
                result.warning(format!(
                    "Feature '{}' is not supported for {} on '{}'",
                    feature, provider.name, framework
                ));
            }
        }

        // Features the framework supports but the chosen template does not implement
        if let Some(template) = named_template {
            for feature in requested
                .intersection(&info.supported_features)
                .filter(|f| !template.features.contains(*f))
            {
                result.warning(format!(
                    "Template '{}' does not implement feature '{}'",
                    template.id, feature
                ));
            }
        }

        result.suggestions = info
            .supported_features
            .difference(&requested)
            .cloned()
            .collect();

        result.missing_requirements.extend(
            info.additional_dependencies
                .iter()
                .map(|dep| format!("Install {}", dep)),
        );

        result.finish()
    }

    /// Validate each request independently and aggregate counters
    pub fn batch_validate(&self, requests: &[ValidationRequest]) -> BatchValidationResult {
        let results: Vec<TemplateValidationResult> =
            requests.iter().map(|r| self.validate(r)).collect();

        let valid_count = results.iter().filter(|r| r.is_valid()).count();
        let summary = ValidationSummary {
            total_requests: results.len(),
            valid_count,
            invalid_count: results.len() - valid_count,
            warning_count: results.iter().map(|r| r.warnings.len()).sum(),
            error_count: results.iter().map(|r| r.errors.len()).sum(),
        };

        debug!(
            total = summary.total_requests,
            valid = summary.valid_count,
            "Batch validation complete"
        );

        BatchValidationResult { results, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    #[test]
    fn test_stripe_nextjs_webhooks() {
        let catalog = catalog();
        let request = ValidationRequest::new("stripe", "nextjs").with_features(["webhooks"]);
        let result = CompatibilityValidator::new(&catalog).validate(&request);

        assert!(result.is_valid());
        assert_eq!(result.compatibility_level, CompatibilityLevel::Full);
        assert_eq!(result.suggestions, vec!["error-handling".to_string()]);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
        assert!(result.compatible_frameworks.contains("nextjs"));
    }

    #[test]
    fn test_missing_entry() {
        let catalog = catalog();
        let request = ValidationRequest::new("stripe", "rails");
        let result = CompatibilityValidator::new(&catalog).validate(&request);

        assert!(!result.is_valid());
        assert_eq!(result.compatibility_level, CompatibilityLevel::Unsupported);
        assert_eq!(
            result.missing_requirements,
            vec![UNSUPPORTED_FRAMEWORK_REQUIREMENT.to_string()]
        );
        assert!(!result.compatible_frameworks.contains("rails"));
    }

    #[test]
    fn test_unsupported_level_surfaces_limitations() {
        let catalog = catalog();
        let result = CompatibilityValidator::new(&catalog)
            .validate(&ValidationRequest::new("stripe", "spring-boot"));
        assert!(!result.is_valid());
        assert_eq!(result.compatibility_level, CompatibilityLevel::Unsupported);
        assert_eq!(
            result.missing_requirements,
            vec!["No Java templates are available for this provider".to_string()]
        );
    }

    #[test]
    fn test_unknown_provider() {
        let catalog = catalog();
        let result = CompatibilityValidator::new(&catalog)
            .validate(&ValidationRequest::new("paypal", "nextjs"));
        assert!(!result.is_valid());
        assert_eq!(result.errors, vec!["Provider 'paypal' not found".to_string()]);
    }

    #[test]
    fn test_unsupported_feature_is_warning_unless_required() {
        let catalog = catalog();
        let validator = CompatibilityValidator::new(&catalog);

        let optional = validator.validate(
            &ValidationRequest::new("stripe", "nextjs").with_features(["subscriptions"]),
        );
        assert!(optional.is_valid());
        assert_eq!(optional.warnings.len(), 1);

        let required =
            validator.validate(&ValidationRequest::new("stripe", "react").with_features(["webhooks"]));
        assert!(!required.is_valid());
        assert!(required.errors[0].contains("required"));
    }

    #[test]
    fn test_partial_level_warnings_and_dependencies() {
        let catalog = catalog();
        let result = CompatibilityValidator::new(&catalog)
            .validate(&ValidationRequest::new("stripe", "django").with_features(["webhooks"]));
        assert!(result.is_valid());
        assert_eq!(result.compatibility_level, CompatibilityLevel::Partial);
        assert!(result.warnings.iter().any(|w| w.contains("partial support")));
        assert!(
            result
                .warnings
                .contains(&"Stripe Elements needs a separate frontend build".to_string())
        );
        assert_eq!(result.missing_requirements, vec!["Install stripe".to_string()]);
        assert_eq!(result.suggestions, vec!["subscriptions".to_string()]);
    }

    #[test]
    fn test_template_checks() {
        let catalog = catalog();
        let validator = CompatibilityValidator::new(&catalog);

        let unknown = validator
            .validate(&ValidationRequest::new("stripe", "nextjs").with_template("stripe-nope"));
        assert!(!unknown.is_valid());

        let foreign = validator.validate(
            &ValidationRequest::new("stripe", "nextjs").with_template("openai-chat-nextjs"),
        );
        assert!(!foreign.is_valid());
        assert!(foreign.errors[0].contains("belongs to provider 'openai'"));

        let other_framework = validator.validate(
            &ValidationRequest::new("stripe", "express").with_template("stripe-checkout-nextjs"),
        );
        assert!(other_framework.is_valid());
        assert_eq!(other_framework.warnings.len(), 1);
    }

    #[test]
    fn test_feature_outside_template_is_warning() {
        let catalog = catalog();
        let validator = CompatibilityValidator::new(&catalog);

        let covered = validator.validate(
            &ValidationRequest::new("stripe", "nextjs")
                .with_template("stripe-checkout-nextjs")
                .with_features(["webhooks"]),
        );
        assert!(covered.is_valid());
        assert!(covered.warnings.is_empty());

        // express supports subscriptions; the checkout template does not implement it
        let uncovered = validator.validate(
            &ValidationRequest::new("stripe", "express")
                .with_template("stripe-checkout-nextjs")
                .with_features(["webhooks", "subscriptions"]),
        );
        assert!(uncovered.is_valid());
        assert_eq!(uncovered.warnings.len(), 2);
        assert!(uncovered.warnings.contains(
            &"Template 'stripe-checkout-nextjs' does not implement feature 'subscriptions'"
                .to_string()
        ));
    }

    #[test]
    fn test_blank_fields() {
        let catalog = catalog();
        let result = CompatibilityValidator::new(&catalog).validate(&ValidationRequest::new(" ", ""));
        assert!(!result.is_valid());
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_batch_summary() {
        let catalog = catalog();
        let requests = vec![
            ValidationRequest::new("stripe", "nextjs").with_features(["webhooks"]),
            ValidationRequest::new("stripe", "django"),
            ValidationRequest::new("stripe", "rails"),
        ];
        let batch = CompatibilityValidator::new(&catalog).batch_validate(&requests);

        assert_eq!(batch.summary.total_requests, 3);
        assert_eq!(batch.summary.valid_count, 2);
        assert_eq!(batch.summary.invalid_count, 1);
        assert_eq!(batch.summary.error_count, 1);
        assert_eq!(batch.summary.warning_count, batch.results[1].warnings.len());
        for result in &batch.results {
            assert_eq!(result.is_valid(), result.errors.is_empty());
        }
    }
}
