//! Package synthesis pipeline.
//!
//! One project file at a time: read and decode it, offer the document to the
//! strategy registry, rebase file patterns onto the project directory, render
//! the manifest and write it to a blob store.

pub mod files;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use crate::document::{self, DocumentNode};
use crate::manifest;
use crate::package::PackageModel;
use crate::runtime::Runtime;
use crate::store::{BlobStore, FileSystemStore};
use crate::strategy::{Dispatch, ProjectContext, StrategyRegistry};

pub use files::PathError;

/// Extension of generated manifests.
pub const MANIFEST_EXTENSION: &str = "nuspec";

/// Outcome of exporting a single project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// A manifest was written.
    Exported {
        package_id: String,
        strategy: &'static str,
        key: String,
        location: String,
    },
    /// No strategy recognized the document.
    Unsupported,
    /// The file could not be decoded or parsed.
    InvalidInput(String),
    /// Strategies recognized the document but none could extract a package.
    Failed { strategies: Vec<&'static str> },
}

/// Options applied to every exported file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub pre_release: Option<String>,
}

pub struct Exporter<'a, R: Runtime> {
    runtime: &'a R,
    registry: &'a StrategyRegistry,
    options: ExportOptions,
}

impl<'a, R: Runtime> Exporter<'a, R> {
    pub fn new(runtime: &'a R, registry: &'a StrategyRegistry, options: ExportOptions) -> Self {
        Self {
            runtime,
            registry,
            options,
        }
    }

    /// Project context for `file`, carrying the configured pre-release.
    pub fn context(&self, file: &Path) -> ProjectContext {
        ProjectContext::new(file).with_pre_release(self.options.pre_release.clone())
    }

    /// Read and parse a project file.
    ///
    /// The outer `Result` carries I/O failures; the inner one carries
    /// decoding and markup errors.
    pub fn load(&self, file: &Path) -> Result<Result<DocumentNode, document::LoadError>> {
        let bytes = self.runtime.read(file)?;
        Ok(document::parse_bytes(&bytes))
    }

    /// Run the strategies over a parsed document and rebase its file patterns
    /// onto the project directory.
    pub fn synthesize(&self, document: &DocumentNode, context: &ProjectContext) -> Dispatch {
        match self.registry.dispatch(document, context) {
            Dispatch::Extracted { strategy, mut package } => {
                rebase_files(&mut package, &context.base_dir().to_string_lossy());
                Dispatch::Extracted { strategy, package }
            }
            other => other,
        }
    }

    /// Export the manifest for `file`.
    ///
    /// Without a store, the manifest is written next to the project file.
    #[tracing::instrument(skip(self, store))]
    pub fn export(&self, file: &Path, store: Option<&dyn BlobStore>) -> Result<ExportOutcome> {
        let document = match self.load(file)? {
            Ok(document) => document,
            Err(err) => {
                warn!("Skipping {:?}: {}", file, err);
                return Ok(ExportOutcome::InvalidInput(err.to_string()));
            }
        };

        let context = self.context(file);
        let (strategy, package) = match self.synthesize(&document, &context) {
            Dispatch::Extracted { strategy, package } => (strategy, package),
            Dispatch::Unsupported => {
                warn!("Unsupported project format: {:?}", file);
                return Ok(ExportOutcome::Unsupported);
            }
            Dispatch::Failed { strategies } => {
                error!("No package could be extracted from {:?}", file);
                return Ok(ExportOutcome::Failed { strategies });
            }
        };

        let default_store;
        let store = match store {
            Some(store) => store,
            None => {
                default_store = FileSystemStore::new(self.runtime, context.base_dir());
                &default_store as &dyn BlobStore
            }
        };

        let key = format!("{}.{}", package.id, MANIFEST_EXTENSION);
        write_manifest(&package, store, &key)?;
        info!("Wrote {} to {}", key, store.identifier());

        Ok(ExportOutcome::Exported {
            package_id: package.id,
            strategy,
            key,
            location: store.identifier(),
        })
    }
}

/// Replace the entry for `key` with the rendered manifest.
pub fn write_manifest(package: &PackageModel, store: &dyn BlobStore, key: &str) -> Result<()> {
    let content = manifest::render(package)?;
    store
        .erase(key)
        .with_context(|| format!("Failed to erase {} in {}", key, store.identifier()))?;
    let mut writer = store
        .open(key)
        .with_context(|| format!("Failed to open {} in {}", key, store.identifier()))?;
    writer.write_all(&content)?;
    writer.flush()?;
    Ok(())
}

/// Rewrite rooted file patterns relative to `base_dir`, dropping those that
/// cannot be expressed relative to it.
pub fn rebase_files(package: &mut PackageModel, base_dir: &str) {
    package.files.retain_mut(|file| match files::relative_pattern(base_dir, &file.pattern) {
        Ok(pattern) => {
            if pattern != file.pattern {
                debug!("Rebased {} to {}", file.pattern, pattern);
            }
            file.pattern = pattern;
            true
        }
        Err(err) => {
            error!("Dropping file mapping to {}: {}", file.folder, err);
            false
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{PackageFileModel, PackageFolder};
    use crate::runtime::MockRuntime;
    use crate::store::MockBlobStore;
    use crate::version::SemanticVersion;
    use mockall::predicate::eq;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    const SDK_PROJECT: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
        <PropertyGroup>
            <VersionPrefix>1.2.3</VersionPrefix>
            <Description>Sample library</Description>
        </PropertyGroup>
        <ItemGroup>
            <PackageReference Include="Foo" Version="3.1.0" />
            <None Include="/repo/assets/logo.png" Pack="true" PackagePath="content/images" />
        </ItemGroup>
    </Project>"#;

    /// Writer that keeps everything written in a shared buffer.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn runtime_reading(path: &str, content: &'static [u8]) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read()
            .with(eq(PathBuf::from(path)))
            .returning(move |_| Ok(content.to_vec()));
        runtime
    }

    #[test]
    fn test_export_to_store() {
        let runtime = runtime_reading("/repo/src/Sample/Sample.csproj", SDK_PROJECT.as_bytes());
        let registry = StrategyRegistry::with_defaults();
        let exporter = Exporter::new(&runtime, &registry, ExportOptions::default());

        let buffer = SharedBuffer::default();
        let mut store = MockBlobStore::new();
        store.expect_identifier().return_const("memory".to_string());
        let mut sequence = mockall::Sequence::new();
        store
            .expect_erase()
            .with(eq("Sample.nuspec"))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        let writer = buffer.clone();
        store
            .expect_open()
            .with(eq("Sample.nuspec"))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |_| Ok(Box::new(writer.clone())));

        let outcome = exporter
            .export(Path::new("/repo/src/Sample/Sample.csproj"), Some(&store))
            .unwrap();

        assert_eq!(
            outcome,
            ExportOutcome::Exported {
                package_id: "Sample".to_string(),
                strategy: "msbuild-sdk",
                key: "Sample.nuspec".to_string(),
                location: "memory".to_string(),
            }
        );

        let manifest = buffer.contents();
        assert!(manifest.contains("<version>1.2.3</version>"), "{manifest}");
        assert!(manifest.contains(r#"id="Foo""#), "{manifest}");
        assert!(manifest.contains("[3.1.0,4.0.0)"), "{manifest}");
        assert!(manifest.contains(r#"src="../../assets/logo.png""#), "{manifest}");
        assert!(manifest.contains(r#"target="content/images""#), "{manifest}");
    }

    #[test]
    fn test_export_defaults_to_project_directory() {
        let mut runtime = runtime_reading("/repo/Sample.csproj", SDK_PROJECT.as_bytes());
        runtime.expect_exists().returning(|_| false);
        runtime.expect_is_dir().with(eq(PathBuf::from("/repo"))).returning(|_| true);
        runtime
            .expect_create_file()
            .with(eq(PathBuf::from("/repo/Sample.nuspec")))
            .times(1)
            .returning(|_| Ok(Box::new(std::io::sink())));

        let registry = StrategyRegistry::with_defaults();
        let exporter = Exporter::new(&runtime, &registry, ExportOptions::default());
        let outcome = exporter.export(Path::new("/repo/Sample.csproj"), None).unwrap();

        assert!(matches!(outcome, ExportOutcome::Exported { ref location, .. } if location == "/repo"));
    }

    #[test]
    fn test_export_invalid_input() {
        let runtime = runtime_reading("/repo/Broken.csproj", b"<Project><PropertyGroup></Project>");
        let registry = StrategyRegistry::with_defaults();
        let exporter = Exporter::new(&runtime, &registry, ExportOptions::default());
        let mut store = MockBlobStore::new();
        store.expect_erase().never();

        let outcome = exporter.export(Path::new("/repo/Broken.csproj"), Some(&store)).unwrap();
        assert!(matches!(outcome, ExportOutcome::InvalidInput(_)), "{outcome:?}");
    }

    #[test]
    fn test_export_unsupported() {
        let runtime = runtime_reading("/repo/App.config", b"<configuration />");
        let registry = StrategyRegistry::with_defaults();
        let exporter = Exporter::new(&runtime, &registry, ExportOptions::default());
        let mut store = MockBlobStore::new();
        store.expect_open().never();

        let outcome = exporter.export(Path::new("/repo/App.config"), Some(&store)).unwrap();
        assert_eq!(outcome, ExportOutcome::Unsupported);
    }

    #[test]
    fn test_export_read_error_propagates() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read()
            .returning(|_| Err(anyhow::anyhow!("permission denied")));
        let registry = StrategyRegistry::with_defaults();
        let exporter = Exporter::new(&runtime, &registry, ExportOptions::default());

        assert!(exporter.export(Path::new("/repo/Sample.csproj"), None).is_err());
    }

    #[test]
    fn test_export_store_error_propagates() {
        let runtime = runtime_reading("/repo/Sample.csproj", SDK_PROJECT.as_bytes());
        let registry = StrategyRegistry::with_defaults();
        let exporter = Exporter::new(&runtime, &registry, ExportOptions::default());
        let mut store = MockBlobStore::new();
        store.expect_identifier().return_const("memory".to_string());
        store.expect_erase().returning(|_| Err(anyhow::anyhow!("read-only")));

        let err = exporter.export(Path::new("/repo/Sample.csproj"), Some(&store)).unwrap_err();
        assert!(format!("{err:#}").contains("read-only"));
    }

    #[test]
    fn test_synthesize_stamps_pre_release() {
        let runtime = MockRuntime::new();
        let registry = StrategyRegistry::with_defaults();
        let options = ExportOptions {
            pre_release: Some("ci.42".to_string()),
        };
        let exporter = Exporter::new(&runtime, &registry, options);
        let document = document::parse_str(SDK_PROJECT).unwrap();
        let context = exporter.context(Path::new("/repo/src/Sample/Sample.csproj"));

        let Dispatch::Extracted { package, .. } = exporter.synthesize(&document, &context) else {
            panic!("expected a package");
        };
        assert_eq!(package.version.to_string(), "1.2.3-ci.42");
    }

    #[test]
    fn test_rebase_files_drops_unreachable_patterns() {
        let mut package = PackageModel::new("Pkg", SemanticVersion::new(1, 0, 0));
        package.files = vec![
            PackageFileModel::new("C:\\repo\\lib\\*.dll", PackageFolder::lib()),
            PackageFileModel::new("D:\\other\\*.dll", PackageFolder::lib()),
            PackageFileModel::new("net472/*.dll", PackageFolder::lib()),
        ];

        rebase_files(&mut package, "C:\\repo\\src");

        let patterns: Vec<_> = package.files.iter().map(|f| f.pattern.as_str()).collect();
        assert_eq!(patterns, ["../lib/*.dll", "net472/*.dll"]);
    }
}
