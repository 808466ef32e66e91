//! SDK-style MSBuild projects (tools version 15 and later).

use anyhow::Result;
use log::debug;

use super::msbuild::{
    PROJECT_ELEMENT, default_files, frameworks, is_private, matches_framework, packed_items,
    project_dependency, read_metadata, reference_range, tools_version,
};
use super::{ProjectContext, Strategy};
use crate::document::DocumentNode;
use crate::package::{DependencyModel, PackageModel};
use crate::version::SemanticVersion;

const MINIMUM_TOOLS_VERSION: SemanticVersion = SemanticVersion::new(15, 0, 0);

/// Reads properties from top-level `PropertyGroup`s and items from top-level
/// `ItemGroup`s, honouring `$(TargetFramework)` conditions.
pub struct MsBuildSdkStrategy;

impl Strategy for MsBuildSdkStrategy {
    fn name(&self) -> &'static str {
        "msbuild-sdk"
    }

    fn is_applicable(&self, document: &DocumentNode) -> bool {
        if document.identifier() != PROJECT_ELEMENT {
            debug!("Unexpected root element <{}>", document.identifier());
            return false;
        }

        match tools_version(document) {
            Ok(Some(version)) if version < MINIMUM_TOOLS_VERSION => {
                debug!("Unsupported tools version {}", version);
                return false;
            }
            Err(err) => {
                debug!("Unreadable tools version: {}", err);
                return false;
            }
            _ => {}
        }

        if !document.has_child("PropertyGroup") {
            debug!("Project declares no PropertyGroup");
            return false;
        }

        true
    }

    fn extract(&self, document: &DocumentNode, context: &ProjectContext) -> Result<PackageModel> {
        let property = |name: &str| first_property(document, name);
        let mut package = read_metadata(property, context)?;
        let frameworks = frameworks(property("TargetFrameworks"), property("TargetFramework"));

        for framework in frameworks.iter().map(Option::as_deref) {
            for reference in items(document, "PackageReference", framework) {
                let Some(id) = reference.value("Include").map(str::trim).filter(|id| !id.is_empty()) else {
                    continue;
                };
                if is_private(reference) {
                    debug!("Skipping private package reference {}", id);
                    continue;
                }
                let range = reference_range(id, reference.value("Version"));
                package
                    .dependencies
                    .push(DependencyModel::new(id, range).for_framework(framework));
            }

            for reference in items(document, "ProjectReference", framework) {
                let Some(dependency) = reference
                    .value("Include")
                    .and_then(|include| project_dependency(include, &package.version))
                else {
                    continue;
                };
                package.dependencies.push(dependency.for_framework(framework));
            }
        }

        package.files = default_files(&frameworks);
        package.files.extend(packed_items(
            document
                .children_named("ItemGroup")
                .into_iter()
                .flat_map(|group| group.children()),
        ));

        Ok(package)
    }
}

fn first_property<'a>(root: &'a DocumentNode, name: &str) -> Option<&'a str> {
    root.children_named("PropertyGroup")
        .into_iter()
        .flat_map(|group| group.values(name))
        .map(String::as_str)
        .find(|value| !value.trim().is_empty())
}

/// Items named `name` that apply to `framework`.
fn items<'a>(root: &'a DocumentNode, name: &str, framework: Option<&str>) -> Vec<&'a DocumentNode> {
    root.children_named("ItemGroup")
        .into_iter()
        .filter(|group| matches_framework(group.value("Condition"), framework))
        .flat_map(|group| group.children_named(name))
        .filter(|item| matches_framework(item.value("Condition"), framework))
        .collect()
}
