//! Blob store for generated manifests.
//!
//! A store is a flat namespace of keys. Writing a manifest always erases the
//! previous entry first, then opens a fresh writer for the key.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use log::debug;

use crate::runtime::Runtime;

#[cfg_attr(test, mockall::automock)]
pub trait BlobStore {
    /// Human-readable location of the store, used in log messages.
    fn identifier(&self) -> String;

    /// Remove the entry for `key`. Erasing a missing entry is not an error.
    fn erase(&self, key: &str) -> Result<()>;

    /// Open a writer that replaces the content stored under `key`.
    fn open(&self, key: &str) -> Result<Box<dyn Write + Send>>;
}

/// Stores each entry as a file inside one directory.
pub struct FileSystemStore<'a, R: Runtime> {
    runtime: &'a R,
    root: PathBuf,
}

impl<'a, R: Runtime> FileSystemStore<'a, R> {
    pub fn new(runtime: &'a R, root: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
            bail!("Invalid store key \"{}\"", key);
        }
        Ok(self.root.join(key))
    }
}

impl<R: Runtime> BlobStore for FileSystemStore<'_, R> {
    fn identifier(&self) -> String {
        self.root.display().to_string()
    }

    fn erase(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        if self.runtime.exists(&path) {
            debug!("Removing existing entry {:?}", path);
            self.runtime.remove_file(&path)?;
        }
        Ok(())
    }

    fn open(&self, key: &str) -> Result<Box<dyn Write + Send>> {
        let path = self.entry_path(key)?;
        if !self.runtime.is_dir(&self.root) {
            self.runtime.create_dir_all(&self.root)?;
        }
        self.runtime.create_file(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_erase_removes_existing_entry() {
        let mut runtime = MockRuntime::new();
        let entry = PathBuf::from("/out/Pkg.nuspec");

        runtime
            .expect_exists()
            .with(eq(entry.clone()))
            .returning(|_| true);
        runtime
            .expect_remove_file()
            .with(eq(entry))
            .times(1)
            .returning(|_| Ok(()));

        let store = FileSystemStore::new(&runtime, "/out");
        store.erase("Pkg.nuspec").unwrap();
    }

    #[test]
    fn test_erase_missing_entry_is_noop() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);
        runtime.expect_remove_file().never();

        let store = FileSystemStore::new(&runtime, "/out");
        store.erase("Pkg.nuspec").unwrap();
    }

    #[test]
    fn test_open_creates_missing_root() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_is_dir()
            .with(eq(PathBuf::from("/out")))
            .returning(|_| false);
        runtime
            .expect_create_dir_all()
            .with(eq(PathBuf::from("/out")))
            .times(1)
            .returning(|_| Ok(()));
        runtime
            .expect_create_file()
            .with(eq(PathBuf::from("/out/Pkg.nuspec")))
            .returning(|_| Ok(Box::new(std::io::sink())));

        let store = FileSystemStore::new(&runtime, "/out");
        store.open("Pkg.nuspec").unwrap();
    }

    #[test]
    fn test_rejects_keys_with_separators() {
        let runtime = MockRuntime::new();
        let store = FileSystemStore::new(&runtime, "/out");

        assert!(store.erase("../escape.nuspec").is_err());
        assert!(store.open("nested\\Pkg.nuspec").is_err());
        assert!(store.open("").is_err());
    }

    #[test]
    fn test_real_file_system_round_trip() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let store = FileSystemStore::new(&runtime, dir.path().join("out"));

        {
            let mut writer = store.open("Pkg.nuspec").unwrap();
            writer.write_all(b"first version").unwrap();
        }
        store.erase("Pkg.nuspec").unwrap();
        {
            let mut writer = store.open("Pkg.nuspec").unwrap();
            writer.write_all(b"second").unwrap();
        }

        let content = std::fs::read(store.root().join("Pkg.nuspec")).unwrap();
        assert_eq!(content, b"second");
        assert_eq!(store.identifier(), dir.path().join("out").display().to_string());
    }
}
