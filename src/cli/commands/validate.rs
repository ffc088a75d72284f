//! Validate Command
//!
//! Check a provider/framework/template/features combination.

use crate::cli::ui::{Output, print_json};
use crate::cli::util::CommandContext;
use crate::types::{Result, ValidationError, ValidationErrorKind, ValidationRequest};

pub fn run(
    provider: String,
    framework: String,
    template: Option<String>,
    features: Vec<String>,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load()?;

    let mut request = ValidationRequest::new(provider, framework).with_features(features);
    if let Some(template) = template {
        request = request.with_template(template);
    }
    let result = ctx.service.validate_combination(&request);

    if format == "json" {
        print_json(&result)?;
    } else {
        let out = Output::new();
        out.header(&format!("{} + {}", request.provider_id, request.framework));
        out.field("Compatibility", result.compatibility_level);

        if result.is_valid() {
            out.success("Combination is valid");
        }
        for error in &result.errors {
            out.error(error);
        }
        for warning in &result.warnings {
            out.warning(warning);
        }
        if !result.missing_requirements.is_empty() {
            out.section("Requirements");
            for requirement in &result.missing_requirements {
                out.bullet(requirement);
            }
        }
        if !result.suggestions.is_empty() {
            out.section("Also available");
            for suggestion in &result.suggestions {
                out.bullet(suggestion);
            }
        }
        if !result.is_valid() && !result.compatible_frameworks.is_empty() {
            out.info(&format!(
                "Supported frameworks: {}",
                result
                    .compatible_frameworks
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }

    if result.is_valid() {
        Ok(())
    } else {
        Err(ValidationError::new(
            ValidationErrorKind::Consistency,
            format!("{} error(s)", result.errors.len()),
        )
        .into())
    }
}
