//! Process environment operations.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn current_dir_impl(&self) -> Result<PathBuf> {
        env::current_dir().context("Failed to determine the current directory")
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};

    #[test]
    fn test_real_runtime_current_dir() {
        let runtime = RealRuntime;
        let dir = runtime.current_dir().unwrap();
        assert!(dir.is_absolute());
        assert!(runtime.is_dir(&dir));
    }
}
