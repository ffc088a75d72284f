//! Suggest Command
//!
//! Rank catalog templates for a set of environment variable names.

use std::path::PathBuf;

use crate::cli::ui::{Output, percent, print_json};
use crate::cli::util::{CommandContext, collect_env_names};
use crate::types::Result;

pub async fn run(
    env: Vec<String>,
    env_file: Option<PathBuf>,
    path: Option<PathBuf>,
    format: &str,
) -> Result<()> {
    let ctx = CommandContext::load()?;
    let names = collect_env_names(&env, env_file.as_deref())?;
    let report = ctx
        .service
        .get_template_suggestions(&names, path.as_deref())
        .await;

    if format == "json" {
        return print_json(&report);
    }

    let out = Output::new();
    out.header("Template suggestions");

    if !report.detected_frameworks.is_empty() {
        out.field("Frameworks", report.detected_frameworks.join(", "));
    }
    if let Some(fallback) = &report.fallback {
        out.warning(&fallback.to_string());
    }

    if report.suggestions.is_empty() {
        out.info("No templates match the given environment variables.");
        return Ok(());
    }

    for (rank, suggestion) in report.suggestions.iter().enumerate() {
        println!(
            "\n{:>2}. {} ({}) {}",
            rank + 1,
            suggestion.template_name,
            suggestion.template_id,
            percent(suggestion.confidence)
        );
        out.field("Provider", &suggestion.provider_name);
        out.field("Framework", &suggestion.framework);
        out.field("Setup", &suggestion.estimated_setup_time);
        out.field("Why", &suggestion.reason);
    }

    Ok(())
}
