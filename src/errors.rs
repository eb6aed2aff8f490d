// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GomonError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("unable to read the module name from {path:?}: {reason}")]
    GoModule { path: PathBuf, reason: String },

    #[error("build of '{app}' failed with exit code {code}")]
    BuildFailed { app: String, code: i32 },

    #[error("failed to spawn '{app}': {source}")]
    Spawn {
        app: String,
        #[source]
        source: std::io::Error,
    },

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("corrupt pid registry file {path:?}: {reason}")]
    CorruptRegistry { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GomonError>;
