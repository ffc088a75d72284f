//! Signature-driven evidence scanner

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::file_scanner::{FileScanner, ScannedFile};
use super::manifests::{self, ManifestKind};
use super::signatures::{FrameworkSignature, FrameworkSignatures, contains_token};
use super::{EvidenceScanner, ScanReport};
use crate::config::{MatchKind, ScannerConfig, ScoringWeights};
use crate::types::{Evidence, EvidenceType, FrameworkSignal, Result, WeaveError};

/// Scans marker files, manifests, dotenv files and build files
#[derive(Clone)]
pub struct FileEvidenceScanner {
    signatures: Arc<FrameworkSignatures>,
    config: ScannerConfig,
    weights: ScoringWeights,
}

impl FileEvidenceScanner {
    pub fn new(config: ScannerConfig, weights: ScoringWeights) -> Self {
        Self {
            signatures: Arc::new(FrameworkSignatures::builtin()),
            config,
            weights,
        }
    }

    pub fn with_signatures(mut self, signatures: FrameworkSignatures) -> Self {
        self.signatures = Arc::new(signatures);
        self
    }

    /// Synchronous scan; the async trait method runs this on the blocking pool.
    pub fn scan_blocking(&self, root: &Path) -> Result<ScanReport> {
        let content_files: BTreeSet<&str> = self.signatures.content_files().collect();
        let walk = FileScanner::new(root, &self.config).scan(|relative, name| {
            ManifestKind::from_file_name(name).is_some()
                || manifests::is_env_file(name)
                || content_files.contains(name)
                || self.signatures.iter().any(|s| marker_matches(s, relative))
        })?;

        let mut collector = SignalCollector::default();
        let mut report = ScanReport {
            warnings: walk.warnings,
            files_examined: walk.files.len(),
            ..Default::default()
        };

        for file in &walk.files {
            self.collect_markers(file, &mut collector);

            let name = file.file_name();
            if let Some(kind) = ManifestKind::from_file_name(name) {
                if let Err(e) = self.collect_dependencies(file, kind, &mut collector) {
                    report.warnings.push(format!("Skipped {}: {}", file.relative, e));
                }
            } else if manifests::is_env_file(name) {
                match fs::read_to_string(&file.path) {
                    Ok(content) => {
                        let names = manifests::parse_env_names(&content);
                        self.collect_env_keys(file, &names, &mut collector);
                        report.env_var_names.extend(names);
                    }
                    Err(e) => report.warnings.push(format!("Skipped {}: {}", file.relative, e)),
                }
            }

            if content_files.contains(name)
                && let Err(e) = self.collect_content(file, &mut collector)
            {
                report.warnings.push(format!("Skipped {}: {}", file.relative, e));
            }
        }

        report.signals = collector.signals;

        if !report.warnings.is_empty() {
            warn!(
                path = %root.display(),
                warnings = report.warnings.len(),
                "Scan completed with skipped inputs"
            );
        }
        debug!(
            path = %root.display(),
            files = report.files_examined,
            signals = report.signals.len(),
            "Evidence scan complete"
        );

        Ok(report)
    }

    fn collect_markers(&self, file: &ScannedFile, collector: &mut SignalCollector) {
        let weight = self.weights.match_weight(MatchKind::Exact);
        for signature in self.signatures.iter() {
            if marker_matches(signature, &file.relative) {
                collector.push(FrameworkSignal::new(
                    signature.key,
                    Evidence::file(file.relative.clone(), weight),
                ));
            }
        }
    }

    fn collect_dependencies(
        &self,
        file: &ScannedFile,
        kind: ManifestKind,
        collector: &mut SignalCollector,
    ) -> Result<()> {
        let content = fs::read_to_string(&file.path)?;
        let dependencies = kind.parse(&content)?;

        for dependency in &dependencies {
            for signature in self.signatures.for_ecosystem(kind.ecosystem()) {
                let Some(match_kind) = package_match(signature, &dependency.name) else {
                    continue;
                };
                let evidence = Evidence::dependency(
                    dependency.name.clone(),
                    self.weights.match_weight(match_kind),
                    file.relative.clone(),
                );
                let mut signal = FrameworkSignal::new(signature.key, evidence);
                if match_kind == MatchKind::Exact
                    && let Some(version) = &dependency.version
                {
                    signal = signal.with_version(version.clone());
                }
                collector.push(signal);
            }
        }
        Ok(())
    }

    fn collect_env_keys(
        &self,
        file: &ScannedFile,
        names: &BTreeSet<String>,
        collector: &mut SignalCollector,
    ) {
        let weight = self.weights.match_weight(MatchKind::Substring);
        for name in names {
            let upper = name.to_uppercase();
            for signature in self.signatures.iter() {
                if signature.env_prefixes.iter().any(|p| upper.starts_with(p)) {
                    collector.push(FrameworkSignal::new(
                        signature.key,
                        Evidence::config(name.clone(), weight, file.relative.clone()),
                    ));
                }
            }
        }
    }

    fn collect_content(&self, file: &ScannedFile, collector: &mut SignalCollector) -> Result<()> {
        let content = fs::read_to_string(&file.path)?;
        let weight = self.weights.match_weight(MatchKind::Substring);
        let name = file.file_name();
        for signature in self.signatures.iter() {
            for (marker_file, marker) in signature.content_markers {
                if *marker_file == name && content.contains(marker) {
                    collector.push(FrameworkSignal::new(
                        signature.key,
                        Evidence::new(EvidenceType::Content, *marker, weight, file.relative.clone()),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EvidenceScanner for FileEvidenceScanner {
    async fn scan(&self, project_path: &Path) -> Result<ScanReport> {
        let scanner = self.clone();
        let root: PathBuf = project_path.to_path_buf();
        tokio::task::spawn_blocking(move || scanner.scan_blocking(&root))
            .await
            .map_err(|e| WeaveError::Io(std::io::Error::other(e.to_string())))?
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn marker_matches(signature: &FrameworkSignature, relative: &str) -> bool {
    signature
        .files
        .iter()
        .any(|f| relative == *f || relative.ends_with(&format!("/{}", f)))
}

/// Best match of a declared package against a signature's package names
fn package_match(signature: &FrameworkSignature, name: &str) -> Option<MatchKind> {
    if signature.packages.iter().any(|p| *p == name) {
        Some(MatchKind::Exact)
    } else if signature.packages.iter().any(|p| contains_token(name, p)) {
        Some(MatchKind::Substring)
    } else {
        None
    }
}

/// Drops repeated (framework, type, value, source) observations
#[derive(Default)]
struct SignalCollector {
    seen: BTreeSet<(String, EvidenceType, String, String)>,
    signals: Vec<FrameworkSignal>,
}

impl SignalCollector {
    fn push(&mut self, signal: FrameworkSignal) {
        let key = (
            signal.framework.clone(),
            signal.evidence.evidence_type,
            signal.evidence.value.clone(),
            signal.evidence.source.clone(),
        );
        if self.seen.insert(key) {
            self.signals.push(signal);
        }
    }
}
