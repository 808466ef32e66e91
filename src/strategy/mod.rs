//! Format strategies.
//!
//! A strategy recognizes one project-file dialect and turns a document of
//! that dialect into a [`PackageModel`]. Strategies are probed in the order
//! they were registered with the [`StrategyRegistry`].

mod msbuild;
mod registry;
mod scan;
mod sdk;

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Datelike;

use crate::document::DocumentNode;
use crate::package::PackageModel;

pub use registry::{Dispatch, StrategyRegistry};
pub use scan::MsBuildScanStrategy;
pub use sdk::MsBuildSdkStrategy;

/// Recognizer and extractor for one project-file dialect.
#[cfg_attr(test, mockall::automock)]
pub trait Strategy {
    /// Stable name used in logs and listings.
    fn name(&self) -> &'static str;

    /// Whether the document belongs to this dialect. Rejection is not an error.
    fn is_applicable(&self, document: &DocumentNode) -> bool;

    /// Build the package model. Called only after a successful probe.
    fn extract(&self, document: &DocumentNode, context: &ProjectContext) -> Result<PackageModel>;
}

/// Information about the project file being packaged that is not part of
/// the document itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    project_path: PathBuf,
    pre_release: Option<String>,
    year: i32,
}

impl ProjectContext {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            pre_release: None,
            year: chrono::Local::now().year(),
        }
    }

    /// Pre-release qualifier stamped onto the package version.
    pub fn with_pre_release(mut self, pre_release: Option<String>) -> Self {
        self.pre_release = pre_release.filter(|id| !id.trim().is_empty());
        self
    }

    /// Year substituted for `$(Year)`.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// The project file name without its extension.
    pub fn project_id(&self) -> String {
        file_stem(&self.project_path.to_string_lossy())
    }

    /// Directory holding the project file.
    pub fn base_dir(&self) -> &Path {
        self.project_path.parent().unwrap_or(Path::new(""))
    }

    pub fn pre_release(&self) -> Option<&str> {
        self.pre_release.as_deref()
    }

    pub fn year(&self) -> i32 {
        self.year
    }
}

/// File name without extension. Both `/` and `\` are separators, since
/// project references are written with Windows paths.
pub(crate) fn file_stem(path: &str) -> String {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}
