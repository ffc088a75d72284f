//! Generate Command
//!
//! Start a generation (or preview) session and stream its progress.

use std::time::Duration;

use crate::cli::progress::ConsoleRenderer;
use crate::cli::ui::{Output, print_json};
use crate::cli::util::{CommandContext, collect_env_names};
use crate::generation::{EnhancementType, GenerationRequest, with_optional_timeout};
use crate::types::{Result, SessionStatus, WeaveError};

pub struct GenerateOptions {
    pub provider: String,
    pub framework: String,
    pub template: Option<String>,
    pub features: Vec<String>,
    pub env: Vec<String>,
    pub enhancement: Option<EnhancementType>,
    pub preview: bool,
    pub timeout_secs: Option<u64>,
    pub format: String,
}

pub async fn run(options: GenerateOptions) -> Result<()> {
    let ctx = CommandContext::load()?;
    let json_output = options.format == "json";

    let mut request = GenerationRequest::new(&options.provider, &options.framework)
        .with_features(options.features)
        .with_env_vars(collect_env_names(&options.env, None)?);
    if let Some(template) = options.template {
        request = request.with_template(template);
    }
    if let Some(enhancement) = options.enhancement {
        request = request.with_enhancement(enhancement);
    }

    let id = if options.preview {
        ctx.service.start_preview(request)?
    } else {
        ctx.service.start_generation(request)?
    };

    let timeout = options
        .timeout_secs
        .or(ctx.config.generation.wait_timeout_secs)
        .map(Duration::from_secs);

    let waited = if json_output {
        ctx.service.wait_for_completion(&id, timeout).await.map(|_| ())
    } else {
        let subscription = ctx.service.subscribe(&id)?;
        with_optional_timeout(
            timeout,
            async {
                ConsoleRenderer::new().follow(subscription).await;
                Ok(())
            },
            "generation",
        )
        .await
    };

    if let Err(e) = waited {
        ctx.service.cancel_session(&id)?;
        return Err(e);
    }

    let session = ctx.service.get_session_status(&id)?;
    let output = ctx.service.session_result(&id)?;

    if json_output {
        return print_json(&serde_json::json!({
            "session": session,
            "output": output,
        }));
    }

    let out = Output::new();
    match (session.status, output) {
        (SessionStatus::Completed, Some(output)) => {
            out.header(&format!("Template {}", output.template_id));
            if session.from_cache {
                out.info("Served from cache");
            }
            for fallback in &output.fallbacks {
                out.warning(&fallback.to_string());
            }
            for warning in &output.warnings {
                out.warning(warning);
            }
            for change in &output.enhancement_changes {
                out.bullet(change);
            }

            out.section("Files");
            for file in &output.files {
                let marker = if file.is_required { "" } else { " (optional)" };
                println!("  {} [{}]{}", file.path, file.language, marker);
                if options.preview {
                    println!();
                    for line in file.content.lines() {
                        println!("    {}", line);
                    }
                    println!();
                }
            }
            out.success(&format!(
                "{} file(s) in {:.2}s",
                output.files.len(),
                session.duration_seconds
            ));
            Ok(())
        }
        (SessionStatus::Failed, _) => Err(session
            .failure
            .map(|f| WeaveError::generation(f.step, f.message))
            .unwrap_or_else(|| WeaveError::Internal("session failed".to_string()))),
        (status, _) => {
            out.warning(&format!("Session ended as {}", status));
            Ok(())
        }
    }
}
