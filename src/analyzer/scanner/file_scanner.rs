use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::config::ScannerConfig;
use crate::types::{Result, WeaveError};

/// Walks a project tree honoring `.gitignore`, exclude globs, depth and size limits.
pub struct FileScanner {
    root: PathBuf,
    exclude: Vec<glob::Pattern>,
    max_file_size: u64,
    max_depth: usize,
}

/// Files selected by a walk, plus the problems met along the way
#[derive(Debug, Default)]
pub struct WalkResult {
    pub files: Vec<ScannedFile>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-separated
    pub relative: String,
    pub size: u64,
}

impl ScannedFile {
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

impl FileScanner {
    pub fn new<P: AsRef<Path>>(root: P, config: &ScannerConfig) -> Self {
        let exclude = config
            .exclude
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect();
        Self {
            root: root.as_ref().to_path_buf(),
            exclude,
            max_file_size: config.max_file_size,
            max_depth: config.max_depth,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collect files for which `select(relative_path, file_name)` holds.
    ///
    /// Errors only when the root itself is unusable; anything below the root
    /// that cannot be read becomes a warning.
    pub fn scan<F>(&self, select: F) -> Result<WalkResult>
    where
        F: Fn(&str, &str) -> bool,
    {
        if !self.root.is_dir() {
            return Err(WeaveError::Scan {
                path: self.root.display().to_string(),
                message: "not a readable directory".to_string(),
            });
        }

        let mut result = WalkResult::default();

        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .max_depth(Some(self.max_depth))
            .follow_links(false) // Security: prevent symlink traversal attacks
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    result.warnings.push(format!("Skipped unreadable entry: {}", e));
                    continue;
                }
            };
            let path = entry.path();

            if !entry.file_type().is_some_and(|t| t.is_file()) || self.should_exclude(path) {
                continue;
            }

            let relative = path
                .strip_prefix(&self.root)
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_else(|_| path.to_string_lossy().to_string());
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();

            if !select(&relative, name) {
                continue;
            }

            match path.metadata() {
                Ok(metadata) if metadata.len() > self.max_file_size => {
                    result.warnings.push(format!(
                        "Skipped {} ({} bytes exceeds limit)",
                        relative,
                        metadata.len()
                    ));
                }
                Ok(metadata) => result.files.push(ScannedFile {
                    path: path.to_path_buf(),
                    relative,
                    size: metadata.len(),
                }),
                Err(e) => result
                    .warnings
                    .push(format!("Skipped {}: {}", relative, e)),
            }
        }

        result.files.sort_by(|a, b| a.relative.cmp(&b.relative));
        Ok(result)
    }

    fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude.iter().any(|p| p.matches(&path_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_selects_and_excludes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        fs::create_dir_all(dir.path().join("node_modules/next")).unwrap();
        fs::write(dir.path().join("node_modules/next/package.json"), "{}").unwrap();
        fs::write(dir.path().join("README.md"), "hi").unwrap();

        let scanner = FileScanner::new(dir.path(), &ScannerConfig::default());
        let result = scanner.scan(|_, name| name == "package.json").unwrap();

        let files: Vec<&str> = result.files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(files, vec!["package.json"]);
    }

    #[test]
    fn test_oversized_file_becomes_warning() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "x".repeat(64)).unwrap();

        let config = ScannerConfig {
            max_file_size: 10,
            ..Default::default()
        };
        let result = FileScanner::new(dir.path(), &config)
            .scan(|_, _| true)
            .unwrap();
        assert!(result.files.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_missing_root_is_error() {
        let scanner = FileScanner::new("/definitely/not/here", &ScannerConfig::default());
        assert!(scanner.scan(|_, _| true).is_err());
    }
}
