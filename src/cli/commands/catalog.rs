//! Catalog Command
//!
//! List providers, templates and their framework support.

use crate::cli::ui::{Output, print_json};
use crate::cli::util::CommandContext;
use crate::types::{ResourceKind, Result, WeaveError, format_setup_time};

pub fn run(provider: Option<String>, format: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let catalog = ctx.service.catalog();

    let providers: Vec<_> = match &provider {
        Some(id) => vec![
            catalog
                .provider(id)
                .ok_or_else(|| WeaveError::not_found(ResourceKind::Provider, id))?,
        ],
        None => catalog.providers().collect(),
    };

    if format == "json" {
        let entries: Vec<_> = providers
            .iter()
            .map(|p| {
                serde_json::json!({
                    "provider": p,
                    "templates": catalog.templates_for_provider(&p.id).map(|t| &t.id).collect::<Vec<_>>(),
                    "compatibility": catalog.compatibility().entries_for(&p.id).collect::<Vec<_>>(),
                })
            })
            .collect();
        return print_json(&entries);
    }

    let out = Output::new();
    for p in providers {
        out.section(&format!("{} ({})", p.name, p.id));
        if !p.description.is_empty() {
            println!("  {}", p.description);
        }

        for template in catalog.templates_for_provider(&p.id) {
            println!(
                "  {:<30} {:<10} {:>8}  {}",
                template.id,
                template.framework,
                format_setup_time(template.estimated_setup_minutes),
                template.difficulty
            );
        }

        let support: Vec<String> = catalog
            .compatibility()
            .entries_for(&p.id)
            .map(|info| format!("{} ({})", info.framework, info.compatibility_level))
            .collect();
        if !support.is_empty() {
            out.field("Frameworks", support.join(", "));
        }
    }

    Ok(())
}
