//! CLI Common Utilities
//!
//! Shared initialization for command handlers.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::analyzer::scanner::manifests;
use crate::config::{Config, ConfigLoader};
use crate::service::IntegrationService;
use crate::types::{Result, ResultExt, WeaveError};

/// Command execution context
///
/// Loads the merged configuration and builds the service once per command.
pub struct CommandContext {
    pub config: Config,
    pub service: IntegrationService,
}

impl CommandContext {
    pub fn load() -> Result<Self> {
        let config = ConfigLoader::load()?;
        let service = IntegrationService::builder().config(config.clone()).build()?;
        Ok(Self { config, service })
    }
}

/// Project directory argument, defaulting to the current directory
pub fn resolve_project(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => std::env::current_dir().map_err(WeaveError::Io),
    }
}

/// Names from `--env` flags plus any declared in a dotenv file
pub fn collect_env_names(names: &[String], env_file: Option<&Path>) -> Result<BTreeSet<String>> {
    let mut collected: BTreeSet<String> = names
        .iter()
        .flat_map(|n| n.split(','))
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();

    if let Some(path) = env_file {
        let content = std::fs::read_to_string(path)
            .with_context(format!("Cannot read env file {}", path.display()))?;
        collected.extend(manifests::parse_env_names(&content));
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_collect_env_names() {
        let mut file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"OPENAI_API_KEY=sk\n# SKIPPED=1\n").unwrap();

        let names = collect_env_names(
            &["STRIPE_SECRET_KEY, STRIPE_WEBHOOK_SECRET".to_string(), " ".to_string()],
            Some(file.path()),
        )
        .unwrap();
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["OPENAI_API_KEY", "STRIPE_SECRET_KEY", "STRIPE_WEBHOOK_SECRET"]
        );
    }

    #[test]
    fn test_missing_env_file_is_error() {
        assert!(collect_env_names(&[], Some(Path::new("/no/such/.env"))).is_err());
    }
}
