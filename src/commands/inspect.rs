use anyhow::{Result, bail};
use serde::Serialize;
use std::path::Path;

use crate::package::PackageModel;
use crate::pipeline::{ExportOptions, Exporter};
use crate::runtime::Runtime;
use crate::strategy::{Dispatch, StrategyRegistry};

#[derive(Serialize)]
struct Report<'a> {
    strategy: &'a str,
    package: &'a PackageModel,
}

/// Print the package model synthesized from `file` as JSON.
#[tracing::instrument(skip(runtime, pre_release))]
pub fn inspect<R: Runtime>(runtime: R, file: &Path, pre_release: Option<String>) -> Result<()> {
    println!("{}", inspect_report(&runtime, file, pre_release)?);
    Ok(())
}

/// The JSON report for `file`, without writing anything.
pub fn inspect_report<R: Runtime>(runtime: &R, file: &Path, pre_release: Option<String>) -> Result<String> {
    let registry = StrategyRegistry::with_defaults();
    let exporter = Exporter::new(runtime, &registry, ExportOptions { pre_release });

    let document = exporter.load(file)??;
    let context = exporter.context(file);

    match exporter.synthesize(&document, &context) {
        Dispatch::Extracted { strategy, package } => {
            let report = Report {
                strategy,
                package: &package,
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        Dispatch::Unsupported => bail!("Unsupported project format: {}", file.display()),
        Dispatch::Failed { strategies } => bail!(
            "No package could be extracted from {} (tried {})",
            file.display(),
            strategies.join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    fn runtime_with(content: &'static str) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read()
            .with(eq(PathBuf::from("/work/Delta.csproj")))
            .returning(move |_| Ok(content.as_bytes().to_vec()));
        runtime
    }

    #[test]
    fn test_inspect_report() {
        let runtime = runtime_with(
            r#"<Project><PropertyGroup>
                <Version>0.3.0</Version>
                <PackageProjectUrl>https://example.com/delta</PackageProjectUrl>
            </PropertyGroup></Project>"#,
        );

        let report = inspect_report(&runtime, Path::new("/work/Delta.csproj"), Some("dev".to_string())).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report).unwrap();

        assert_eq!(json["strategy"], "msbuild-sdk");
        assert_eq!(json["package"]["id"], "Delta");
        assert_eq!(json["package"]["version"], "0.3.0-dev");
        assert_eq!(json["package"]["project_url"], "https://example.com/delta");
        assert_eq!(json["package"]["files"][0]["folder"], "lib");
    }

    #[test]
    fn test_inspect_unsupported() {
        let runtime = runtime_with("<Solution />");
        let err = inspect_report(&runtime, Path::new("/work/Delta.csproj"), None).unwrap_err();
        assert!(err.to_string().contains("Unsupported"));
    }

    #[test]
    fn test_inspect_invalid_markup() {
        let runtime = runtime_with("<Project>");
        assert!(inspect_report(&runtime, Path::new("/work/Delta.csproj"), None).is_err());
    }
}
