//! File system operations (read, create, remove, directories).

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn read_impl(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn create_file_impl(&self, path: &Path) -> Result<Box<dyn std::io::Write + Send>> {
        let file = fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Box::new(file))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_file_impl(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn create_dir_all_impl(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).context("Failed to create directory")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn exists_impl(&self, path: &Path) -> bool {
        path.exists()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_dir_impl(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_real_runtime_file_ops() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("Project.nuspec");

        {
            let mut writer = runtime.create_file(&file_path).unwrap();
            writer.write_all(b"<package />").unwrap();
        }
        assert!(runtime.exists(&file_path));
        assert!(!runtime.is_dir(&file_path));
        assert_eq!(runtime.read(&file_path).unwrap(), b"<package />");

        runtime.remove_file(&file_path).unwrap();
        assert!(!runtime.exists(&file_path));
    }

    #[test]
    fn test_real_runtime_dir_ops() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let sub_dir = dir.path().join("out/nested");

        runtime.create_dir_all(&sub_dir).unwrap();
        assert!(runtime.exists(&sub_dir));
        assert!(runtime.is_dir(&sub_dir));
    }

    #[test]
    fn test_real_runtime_errors() {
        let runtime = RealRuntime;
        let missing = std::path::Path::new("/nonexistent/path/file.csproj");

        let err = runtime.read(missing).unwrap_err();
        assert!(err.to_string().contains("file.csproj"));
        assert!(runtime.remove_file(missing).is_err());
    }
}
