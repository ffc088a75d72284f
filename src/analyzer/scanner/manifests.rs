//! Manifest parsers
//!
//! Extract declared dependency names (and version requirements) from the
//! package manifests of each supported ecosystem, plus variable names from
//! dotenv files. Values of environment variables are never retained.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::signatures::Ecosystem;
use crate::types::{Result, WeaveError};

/// One declared dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub version: Option<String>,
}

impl Dependency {
    fn new(name: &str, version: Option<&str>) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            version: version
                .map(str::trim)
                .filter(|v| !v.is_empty() && *v != "*")
                .map(String::from),
        }
    }
}

/// Manifest kinds recognized by file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    PackageJson,
    Requirements,
    PyProject,
    CargoToml,
    Gemfile,
    ComposerJson,
}

impl ManifestKind {
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            "package.json" => Some(Self::PackageJson),
            "requirements.txt" | "requirements-dev.txt" => Some(Self::Requirements),
            "pyproject.toml" => Some(Self::PyProject),
            "Cargo.toml" => Some(Self::CargoToml),
            "Gemfile" => Some(Self::Gemfile),
            "composer.json" => Some(Self::ComposerJson),
            _ => None,
        }
    }

    pub fn ecosystem(&self) -> Ecosystem {
        match self {
            Self::PackageJson => Ecosystem::Node,
            Self::Requirements | Self::PyProject => Ecosystem::Python,
            Self::CargoToml => Ecosystem::Rust,
            Self::Gemfile => Ecosystem::Ruby,
            Self::ComposerJson => Ecosystem::Php,
        }
    }

    pub fn parse(&self, content: &str) -> Result<Vec<Dependency>> {
        match self {
            Self::PackageJson => parse_json_sections(
                content,
                &["dependencies", "devDependencies", "peerDependencies"],
            ),
            Self::ComposerJson => parse_json_sections(content, &["require", "require-dev"]),
            Self::Requirements => Ok(parse_requirements(content)),
            Self::PyProject => parse_pyproject(content),
            Self::CargoToml => parse_cargo_toml(content),
            Self::Gemfile => Ok(parse_gemfile(content)),
        }
    }
}

// =============================================================================
// JSON manifests (package.json, composer.json)
// =============================================================================

fn parse_json_sections(content: &str, sections: &[&str]) -> Result<Vec<Dependency>> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let mut deps = Vec::new();
    for section in sections {
        if let Some(map) = value.get(*section).and_then(|v| v.as_object()) {
            for (name, version) in map {
                deps.push(Dependency::new(name, version.as_str()));
            }
        }
    }
    Ok(deps)
}

// =============================================================================
// Python (requirements.txt, pyproject.toml)
// =============================================================================

static REQUIREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:\[[^\]]*\])?\s*([<>=!~][^;#]*)?").unwrap()
});

/// Parse one PEP 508 requirement string (`fastapi[all]>=0.110; python_version>"3.8"`)
fn parse_requirement(line: &str) -> Option<Dependency> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
        return None;
    }
    let caps = REQUIREMENT.captures(line)?;
    let name = caps.get(1)?.as_str();
    let version = caps.get(2).map(|m| m.as_str());
    Some(Dependency::new(name, version))
}

fn parse_requirements(content: &str) -> Vec<Dependency> {
    content.lines().filter_map(parse_requirement).collect()
}

fn parse_pyproject(content: &str) -> Result<Vec<Dependency>> {
    let value = parse_toml(content, "pyproject.toml")?;
    let mut deps = Vec::new();

    if let Some(list) = value
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_array())
    {
        deps.extend(list.iter().filter_map(|v| v.as_str()).filter_map(parse_requirement));
    }

    if let Some(table) = value
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_table())
    {
        deps.extend(toml_table_deps(table).into_iter().filter(|d| d.name != "python"));
    }

    Ok(deps)
}

// =============================================================================
// Rust (Cargo.toml)
// =============================================================================

fn parse_cargo_toml(content: &str) -> Result<Vec<Dependency>> {
    let value = parse_toml(content, "Cargo.toml")?;
    let mut deps = Vec::new();
    for section in ["dependencies", "dev-dependencies"] {
        if let Some(table) = value.get(section).and_then(|d| d.as_table()) {
            deps.extend(toml_table_deps(table));
        }
    }
    if let Some(table) = value
        .get("workspace")
        .and_then(|w| w.get("dependencies"))
        .and_then(|d| d.as_table())
    {
        deps.extend(toml_table_deps(table));
    }
    Ok(deps)
}

fn parse_toml(content: &str, file: &str) -> Result<toml::Value> {
    toml::from_str(content).map_err(|e| WeaveError::Scan {
        path: file.to_string(),
        message: e.to_string(),
    })
}

/// `name = "1.0"` or `name = { version = "1.0", ... }`
fn toml_table_deps(table: &toml::Table) -> Vec<Dependency> {
    table
        .iter()
        .map(|(name, spec)| {
            let version = match spec {
                toml::Value::String(v) => Some(v.as_str()),
                toml::Value::Table(t) => t.get("version").and_then(|v| v.as_str()),
                _ => None,
            };
            Dependency::new(name, version)
        })
        .collect()
}

// =============================================================================
// Ruby (Gemfile)
// =============================================================================

static GEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*gem\s+['"]([^'"]+)['"](?:\s*,\s*['"]([^'"]+)['"])?"#).unwrap()
});

fn parse_gemfile(content: &str) -> Vec<Dependency> {
    content
        .lines()
        .filter_map(|line| GEM.captures(line))
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            Some(Dependency::new(name, caps.get(2).map(|m| m.as_str())))
        })
        .collect()
}

// =============================================================================
// Dotenv files
// =============================================================================

static ENV_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=").unwrap());

/// True for `.env`, `.env.local`, `.env.example` and similar
pub fn is_env_file(name: &str) -> bool {
    name == ".env" || name.starts_with(".env.")
}

/// Variable names declared in a dotenv file (values are discarded)
pub fn parse_env_names(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| ENV_KEY.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
