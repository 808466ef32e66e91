use anyhow::{Context, Result};
use glob::MatchOptions;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

use crate::pipeline::{ExportOptions, ExportOutcome, Exporter};
use crate::runtime::Runtime;
use crate::store::{BlobStore, FileSystemStore};
use crate::strategy::StrategyRegistry;

/// Per-run tally of export outcomes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub exported: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExportSummary {
    fn record(&mut self, outcome: &ExportOutcome) {
        match outcome {
            ExportOutcome::Exported { .. } => self.exported += 1,
            ExportOutcome::Unsupported | ExportOutcome::InvalidInput(_) => self.skipped += 1,
            ExportOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Export a manifest for every project file matching `pattern`.
///
/// Relative patterns are resolved against `base` (default: the current
/// directory). Manifests go to `target` when given, otherwise next to each
/// project file. A failing file is logged and does not stop the run.
#[tracing::instrument(skip(runtime, base, target, pre_release))]
pub fn export<R: Runtime>(
    runtime: R,
    pattern: &str,
    base: Option<PathBuf>,
    target: Option<PathBuf>,
    pre_release: Option<String>,
) -> Result<ExportSummary> {
    let base = match base {
        Some(path) => path,
        None => runtime.current_dir()?,
    };
    debug!("Using base directory: {:?}", base);

    let files = find_projects(&runtime, &base, pattern)?;
    if files.is_empty() {
        warn!("No files match {}", pattern);
    }

    let registry = StrategyRegistry::with_defaults();
    let exporter = Exporter::new(&runtime, &registry, ExportOptions { pre_release });
    let target_store = target.map(|dir| FileSystemStore::new(&runtime, dir));

    let mut summary = ExportSummary::default();
    for file in files {
        let store = target_store.as_ref().map(|store| store as &dyn BlobStore);
        match exporter.export(&file, store) {
            Ok(outcome) => {
                if let ExportOutcome::Exported { key, location, .. } = &outcome {
                    println!("{} -> {}/{}", file.display(), location, key);
                }
                summary.record(&outcome);
            }
            Err(err) => {
                error!("Failed to export {:?}: {:#}", file, err);
                summary.failed += 1;
            }
        }
    }

    info!(
        "Exported {} manifest(s), skipped {}, failed {}",
        summary.exported, summary.skipped, summary.failed
    );
    Ok(summary)
}

/// Files matching `pattern`, case-insensitively, in glob order.
fn find_projects<R: Runtime>(runtime: &R, base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = if Path::new(pattern).is_absolute() {
        PathBuf::from(pattern)
    } else {
        base.join(pattern)
    };

    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };
    let entries = glob::glob_with(&full.to_string_lossy(), options)
        .with_context(|| format!("Invalid file pattern: {}", pattern))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if runtime.is_dir(&path) => debug!("Skipping directory {:?}", path),
            Ok(path) => files.push(path),
            Err(err) => warn!("Cannot read {:?}: {}", err.path(), err.error()),
        }
    }
    Ok(files)
}
