//! Whole-tree scan of MSBuild 15 projects.
//!
//! Used for projects that keep their properties or references outside the
//! top-level groups, e.g. inside `Choose`/`When` blocks or targets.
//! Properties come from every `PropertyGroup` in the tree. Every dependency
//! found is added to the common group.

use anyhow::Result;
use log::debug;

use super::msbuild::{
    PROJECT_ELEMENT, default_files, frameworks, is_private, packed_items, project_dependency, read_metadata,
    reference_range, tools_version,
};
use super::{ProjectContext, Strategy};
use crate::document::DocumentNode;
use crate::package::{DependencyModel, PackageModel};
use crate::version::SemanticVersion;

const TOOLS_VERSION: SemanticVersion = SemanticVersion::new(15, 0, 0);

pub struct MsBuildScanStrategy;

impl Strategy for MsBuildScanStrategy {
    fn name(&self) -> &'static str {
        "msbuild-scan"
    }

    fn is_applicable(&self, document: &DocumentNode) -> bool {
        if document.identifier() != PROJECT_ELEMENT {
            debug!("Unexpected root element <{}>", document.identifier());
            return false;
        }

        match tools_version(document) {
            Ok(None) => true,
            Ok(Some(version)) if version == TOOLS_VERSION => true,
            Ok(Some(version)) => {
                debug!("Unsupported tools version {}", version);
                false
            }
            Err(err) => {
                debug!("Unreadable tools version: {}", err);
                false
            }
        }
    }

    fn extract(&self, document: &DocumentNode, context: &ProjectContext) -> Result<PackageModel> {
        let property_groups = document.descendants_named("PropertyGroup");
        let property = |name: &str| {
            property_groups
                .iter()
                .copied()
                .flat_map(|group| group.values(name))
                .map(String::as_str)
                .find(|value| !value.trim().is_empty())
        };
        let mut package = read_metadata(property, context)?;

        for reference in document.descendants_named("PackageReference") {
            let Some(id) = reference.value("Include").map(str::trim).filter(|id| !id.is_empty()) else {
                continue;
            };
            if is_private(reference) {
                debug!("Skipping development-only reference {}", id);
                continue;
            }
            let range = reference_range(id, reference.value("Version"));
            package.dependencies.push(DependencyModel::new(id, range));
        }

        for reference in document.descendants_named("ProjectReference") {
            if let Some(dependency) = reference
                .value("Include")
                .and_then(|include| project_dependency(include, &package.version))
            {
                package.dependencies.push(dependency);
            }
        }

        let frameworks = frameworks(property("TargetFrameworks"), property("TargetFramework"));
        package.files = default_files(&frameworks);
        package.files.extend(packed_items(
            document
                .descendants_named("None")
                .into_iter()
                .chain(document.descendants_named("Content")),
        ));

        Ok(package)
    }
}
