// src/paths.rs

//! On-disk state namespaced by configuration fingerprint.
//!
//! ```text
//! <base>/gomon/<fingerprint>/
//!     builds/<app>     binaries produced by the build step
//!     pids.data        persisted pid registry
//! ```
//!
//! `<base>` is the system temp directory unless overridden (tests).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::errors::Result;

const STATE_DIR_NAME: &str = "gomon";
const BUILDS_DIR_NAME: &str = "builds";
const PID_FILE_NAME: &str = "pids.data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    /// State directory for `fingerprint` under the system temp directory.
    pub fn for_fingerprint(fingerprint: &str) -> Self {
        Self::under(std::env::temp_dir(), fingerprint)
    }

    pub fn under(base: impl AsRef<Path>, fingerprint: &str) -> Self {
        Self {
            root: base.as_ref().join(STATE_DIR_NAME).join(fingerprint),
        }
    }

    /// Create the directory tree if needed.
    pub fn ensure(&self) -> Result<()> {
        let builds = self.builds_dir();
        fs::create_dir_all(&builds)
            .with_context(|| format!("creating state directory {:?}", builds))?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn builds_dir(&self) -> PathBuf {
        self.root.join(BUILDS_DIR_NAME)
    }

    /// Deterministic output location of an application's binary.
    pub fn binary_path(&self, app: &str) -> PathBuf {
        self.builds_dir().join(app)
    }

    pub fn pid_file(&self) -> PathBuf {
        self.root.join(PID_FILE_NAME)
    }
}
