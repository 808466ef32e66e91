//! Package model
//!
//! The format-independent description of a package that strategies produce
//! and the manifest serializer consumes.

mod folder;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use unic_langid::LanguageIdentifier;
use url::Url;

use crate::version::{SemanticVersion, SemanticVersionRange};

pub use folder::{FolderKind, PackageFolder};

/// Longest package identifier accepted by package galleries.
pub const MAX_ID_LENGTH: usize = 100;

static PACKAGE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+(?:[_.-]\w+)*$").expect("valid package id pattern"));

/// A synthesized package description.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PackageModel {
    pub id: String,
    pub version: SemanticVersion,
    pub title: Option<String>,
    pub description: Option<String>,
    pub copyright: Option<String>,
    pub project_url: Option<Url>,
    pub license_url: Option<Url>,
    pub icon_url: Option<Url>,
    pub language: Option<LanguageIdentifier>,
    pub authors: Vec<String>,
    pub owners: Vec<String>,
    pub tags: Vec<String>,
    pub dependencies: Vec<DependencyModel>,
    pub files: Vec<PackageFileModel>,
}

impl PackageModel {
    pub fn new(id: impl Into<String>, version: SemanticVersion) -> Self {
        Self {
            id: id.into(),
            version,
            title: None,
            description: None,
            copyright: None,
            project_url: None,
            license_url: None,
            icon_url: None,
            language: None,
            authors: Vec::new(),
            owners: Vec::new(),
            tags: Vec::new(),
            dependencies: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Whether `id` is usable as a package identifier.
    pub fn is_valid_id(id: &str) -> bool {
        id.len() <= MAX_ID_LENGTH && PACKAGE_ID.is_match(id)
    }

    /// Framework-tagged dependencies grouped in first-seen framework order.
    pub fn framework_groups(&self) -> Vec<(&str, Vec<&DependencyModel>)> {
        let mut groups: Vec<(&str, Vec<&DependencyModel>)> = Vec::new();
        for dependency in &self.dependencies {
            let Some(framework) = dependency.target_framework.as_deref() else {
                continue;
            };
            match groups.iter_mut().find(|(name, _)| *name == framework) {
                Some((_, members)) => members.push(dependency),
                None => groups.push((framework, vec![dependency])),
            }
        }
        groups
    }

    /// Dependencies without a target framework.
    pub fn common_dependencies(&self) -> Vec<&DependencyModel> {
        self.dependencies
            .iter()
            .filter(|dependency| dependency.target_framework.is_none())
            .collect()
    }
}

/// A dependency on another package.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DependencyModel {
    pub id: String,
    pub range: SemanticVersionRange,
    pub target_framework: Option<String>,
}

impl DependencyModel {
    pub fn new(id: impl Into<String>, range: SemanticVersionRange) -> Self {
        Self {
            id: id.into(),
            range,
            target_framework: None,
        }
    }

    pub fn for_framework(mut self, framework: Option<&str>) -> Self {
        self.target_framework = framework.map(str::to_string);
        self
    }
}

/// A source file pattern and the package folder it is copied into.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PackageFileModel {
    pub pattern: String,
    pub folder: PackageFolder,
}

impl PackageFileModel {
    pub fn new(pattern: impl Into<String>, folder: PackageFolder) -> Self {
        Self {
            pattern: pattern.into(),
            folder,
        }
    }
}
