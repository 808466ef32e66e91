//! Helpers shared by the MSBuild project strategies.

use std::fmt::Display;
use std::sync::LazyLock;

use anyhow::{Result, bail};
use log::{debug, warn};
use regex::Regex;
use unic_langid::LanguageIdentifier;
use url::Url;

use super::{ProjectContext, file_stem};
use crate::document::DocumentNode;
use crate::package::{DependencyModel, PackageFileModel, PackageFolder, PackageModel};
use crate::version::{SemanticVersion, SemanticVersionRange};

pub(crate) const PROJECT_ELEMENT: &str = "Project";

static FRAMEWORK_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\(\s*TargetFramework\s*\)").expect("valid framework pattern"));

/// The `ToolsVersion` declared on the root element.
///
/// `Ok(None)` when absent, `Err` when present but unreadable.
pub(crate) fn tools_version(root: &DocumentNode) -> Result<Option<SemanticVersion>> {
    match root.value("ToolsVersion").map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => Ok(Some(SemanticVersion::parse_loose(raw)?)),
    }
}

/// Whether items guarded by `condition` apply to `framework`.
///
/// Conditions that do not mention `$(TargetFramework)` always apply, as does
/// every condition when the project has no framework.
pub(crate) fn matches_framework(condition: Option<&str>, framework: Option<&str>) -> bool {
    let (Some(condition), Some(framework)) = (condition.filter(|c| !c.trim().is_empty()), framework) else {
        return true;
    };
    if !FRAMEWORK_REFERENCE.is_match(condition) {
        return true;
    }

    let pattern = format!(
        r"(?i)'\$\(\s*TargetFramework\s*\)'\s*==\s*'{}'",
        regex::escape(framework)
    );
    Regex::new(&pattern).is_ok_and(|matcher| matcher.is_match(condition))
}

/// Split a delimited list, trimming entries and dropping empty ones.
pub(crate) fn split_list(value: &str, separators: &[char]) -> Vec<String> {
    value
        .split(separators)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Target frameworks, or a single `None` so per-framework logic runs once.
pub(crate) fn frameworks(targets: Option<&str>, target: Option<&str>) -> Vec<Option<String>> {
    let declared = match targets {
        Some(list) if !list.trim().is_empty() => split_list(list, &[';']),
        _ => target.map(|single| split_list(single, &[';'])).unwrap_or_default(),
    };
    if declared.is_empty() {
        vec![None]
    } else {
        declared.into_iter().map(Some).collect()
    }
}

/// Parse an optional field, logging a warning and yielding `None` on failure.
pub(crate) fn parse_field<T, E: Display>(
    field: &str,
    raw: Option<&str>,
    parse: impl FnOnce(&str) -> std::result::Result<T, E>,
) -> Option<T> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    match parse(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Ignoring invalid {} \"{}\": {}", field, raw, err);
            None
        }
    }
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(str::to_string)
}

/// Build the package metadata from project properties.
///
/// `property` returns the first value of a property, wherever the dialect
/// keeps its properties.
pub(crate) fn read_metadata<'a>(
    property: impl Fn(&str) -> Option<&'a str>,
    context: &ProjectContext,
) -> Result<PackageModel> {
    let id = match non_empty(property("PackageId")) {
        Some(id) => id,
        None => context.project_id(),
    };
    if !PackageModel::is_valid_id(&id) {
        bail!("\"{}\" is not a valid package id", id);
    }

    let mut version = parse_field(
        "version",
        property("VersionPrefix").or_else(|| property("Version")),
        SemanticVersion::parse,
    )
    .unwrap_or_default();

    if !version.is_empty() {
        if let Some(stamped) = parse_field("version suffix", property("VersionSuffix"), |suffix| {
            version.declare_pre_release(suffix.split('.'))
        }) {
            version = stamped;
        }
        // Appended after any VersionSuffix identifiers.
        if let Some(stamped) = parse_field("pre-release", context.pre_release(), |pre_release| {
            let identifiers = version.pre_release().iter().cloned();
            version.declare_pre_release(identifiers.chain(pre_release.split('.').map(str::to_string)))
        }) {
            version = stamped;
        }
    }

    let mut package = PackageModel::new(id, version);
    package.title = non_empty(property("Title"))
        .or_else(|| non_empty(property("AssemblyTitle")))
        .or_else(|| Some(package.id.clone()));
    package.description = non_empty(property("Description"));
    package.copyright = non_empty(property("Copyright"))
        .map(|copyright| copyright.replace("$(Year)", &context.year().to_string()));

    package.authors = property("Authors").map(|a| split_list(a, &[','])).unwrap_or_default();
    package.owners = property("Owners").map(|o| split_list(o, &[','])).unwrap_or_default();
    package.tags = property("PackageTags")
        .map(|tags| split_list(tags, &[';', ',']))
        .unwrap_or_default();

    package.project_url = parse_field("project URL", property("PackageProjectUrl"), Url::parse);
    package.license_url = parse_field("license URL", property("PackageLicenseUrl"), Url::parse);
    package.icon_url = parse_field("icon URL", property("PackageIconUrl"), Url::parse);
    package.language = parse_field("language tag", property("NeutralLanguage"), |tag| {
        tag.parse::<LanguageIdentifier>()
    });

    Ok(package)
}

/// Version range of a package reference.
///
/// Bracketed notation is used as written, a plain version becomes its
/// compatible range. Anything else is the any range.
pub(crate) fn reference_range(id: &str, raw: Option<&str>) -> SemanticVersionRange {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        warn!("Package reference {} declares no version, assuming any", id);
        return SemanticVersionRange::any();
    };

    let parsed = if raw.starts_with(['[', '(']) {
        SemanticVersionRange::parse(raw)
    } else {
        SemanticVersion::parse_loose(raw).map(|version| version.compatible_range())
    };

    parsed.unwrap_or_else(|err| {
        warn!("Package reference {} has an invalid version \"{}\" ({}), assuming any", id, raw, err);
        SemanticVersionRange::any()
    })
}

/// Dependency on a referenced project, named after its file stem.
pub(crate) fn project_dependency(include: &str, version: &SemanticVersion) -> Option<DependencyModel> {
    let id = file_stem(include.trim());
    if id.is_empty() {
        return None;
    }
    Some(DependencyModel::new(id, version.compatible_range()))
}

/// Whether a package reference only serves the build.
pub(crate) fn is_private(reference: &DocumentNode) -> bool {
    reference
        .value("PrivateAssets")
        .is_some_and(|assets| split_list(assets, &[';']).iter().any(|a| a.eq_ignore_ascii_case("all")))
}

/// Binary and source file mappings shared by the MSBuild strategies.
pub(crate) fn default_files(frameworks: &[Option<String>]) -> Vec<PackageFileModel> {
    let mut files = Vec::new();
    for framework in frameworks {
        match framework {
            Some(framework) => {
                let folder = PackageFolder::lib().join(framework.as_str());
                files.push(PackageFileModel::new(format!("{framework}/*.dll"), folder.clone()));
                files.push(PackageFileModel::new(format!("{framework}/*.pdb"), folder));
            }
            None => {
                files.push(PackageFileModel::new("*.dll", PackageFolder::lib()));
                files.push(PackageFileModel::new("*.pdb", PackageFolder::lib()));
            }
        }
    }
    files.push(PackageFileModel::new("../../**/*.cs", PackageFolder::src()));
    files
}

/// Mappings for `None` and `Content` items marked `Pack="true"`.
pub(crate) fn packed_items<'a>(items: impl IntoIterator<Item = &'a DocumentNode>) -> Vec<PackageFileModel> {
    let mut files = Vec::new();
    for item in items {
        if !matches!(item.identifier(), "None" | "Content") {
            continue;
        }
        if !item.value("Pack").is_some_and(|pack| pack.trim().eq_ignore_ascii_case("true")) {
            continue;
        }
        let folder = item
            .value("PackagePath")
            .map(PackageFolder::from_package_path)
            .unwrap_or_else(PackageFolder::content);
        let includes = item.value("Include").map(|i| split_list(i, &[';'])).unwrap_or_default();
        if includes.is_empty() {
            debug!("Packed item at {} has no Include", item.position());
        }
        for include in includes {
            files.push(PackageFileModel::new(include, folder.clone()));
        }
    }
    files
}
