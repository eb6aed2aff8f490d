// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{AppName, Color};

/// Configuration as read from the TOML file, before validation.
///
/// ```toml
/// [[app]]
/// name = "api"
/// path = "cmd/api"
/// color = "cyan"
/// env = { PORT = "8080" }
///
/// [[app]]
/// name = "migrate"
/// path = "cmd/migrate/main.go"
/// must_not_restart = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(rename = "app", default)]
    pub apps: Vec<ApplicationConfig>,
}

/// One supervised program.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationConfig {
    pub name: AppName,

    /// Package directory or `.go` file, relative to the project root.
    pub path: PathBuf,

    /// Extra environment variables, layered over the inherited environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub color: Color,

    /// Leave the application stopped once it exits on its own.
    #[serde(default)]
    pub must_not_restart: bool,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub apps: Vec<ApplicationConfig>,

    /// BLAKE3 hex digest of the raw file contents. Namespaces on-disk state.
    pub fingerprint: String,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(apps: Vec<ApplicationConfig>, fingerprint: String) -> Self {
        Self { apps, fingerprint }
    }

    /// Width of the longest application name.
    pub fn name_padding(&self) -> usize {
        self.apps
            .iter()
            .map(|a| a.name.chars().count())
            .max()
            .unwrap_or(0)
    }
}
