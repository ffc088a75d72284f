//! Config Command
//!
//! Usage:
//!   apiweave config show [-f json]
//!   apiweave config path
//!   apiweave config init [-g] [--force]

use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the merged effective configuration
pub fn show(format: &str) -> Result<()> {
    let config = ConfigLoader::load()?;
    println!("{}", ConfigLoader::render(&config, format == "json")?);
    Ok(())
}

/// Show configuration file locations and whether they exist
pub fn path() -> Result<()> {
    for (label, path) in ConfigLoader::paths() {
        match path {
            Some(path) => {
                let state = if path.exists() { "" } else { " (not found)" };
                println!("{:<8} {}{}", label, path.display(), state);
            }
            None => println!("{:<8} (unavailable)", label),
        }
    }
    Ok(())
}

pub fn init(global: bool, force: bool) -> Result<()> {
    let path = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_project(force)?
    };
    println!("✓ Initialized {} configuration", if global { "global" } else { "project" });
    println!("  Config: {}", path.display());
    Ok(())
}
