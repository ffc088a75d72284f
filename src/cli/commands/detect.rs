//! Detect Command
//!
//! Scan a project and rank the frameworks it uses.

use std::path::PathBuf;

use crate::cli::ui::{Output, percent, print_json};
use crate::cli::util::{CommandContext, resolve_project};
use crate::types::Result;

pub async fn run(path: Option<PathBuf>, format: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let root = resolve_project(path)?;
    let report = ctx.service.detect_frameworks(&root).await;

    if format == "json" {
        return print_json(&report);
    }

    let out = Output::new();
    out.header(&format!("Frameworks in {}", root.display()));

    if report.frameworks.is_empty() {
        out.info("No frameworks detected.");
    }
    for result in &report.frameworks {
        let version = result
            .version
            .as_deref()
            .map(|v| format!(" {}", v))
            .unwrap_or_default();
        println!(
            "  {:<14} {:>5}{}  ({} evidence)",
            result.framework,
            percent(result.confidence()),
            version,
            result.evidence.len()
        );
    }

    if !report.frameworks.is_empty() {
        println!();
        out.field("Overall", percent(report.overall_confidence));
    }
    if let Some(fallback) = &report.fallback {
        out.warning(&fallback.to_string());
    }
    for warning in &report.warnings {
        out.bullet(warning);
    }

    Ok(())
}
