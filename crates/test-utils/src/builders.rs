#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use gomon::config::{ApplicationConfig, ConfigFile, RawConfigFile};
use gomon::types::Color;
use tempfile::TempDir;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
    fingerprint: String,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
            fingerprint: "test-fingerprint".to_string(),
        }
    }

    pub fn with_app(mut self, app: ApplicationConfig) -> Self {
        self.config.apps.push(app);
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: &str) -> Self {
        self.fingerprint = fingerprint.to_string();
        self
    }

    pub fn build(self) -> ConfigFile {
        let mut cfg =
            ConfigFile::try_from(self.config).expect("Failed to build valid config from builder");
        cfg.fingerprint = self.fingerprint;
        cfg
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ApplicationConfig`.
pub struct AppConfigBuilder {
    app: ApplicationConfig,
}

impl AppConfigBuilder {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            app: ApplicationConfig {
                name: name.to_string(),
                path: PathBuf::from(path),
                env: BTreeMap::new(),
                color: Color::Reset,
                must_not_restart: false,
            },
        }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.app.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.app.color = color;
        self
    }

    pub fn must_not_restart(mut self, val: bool) -> Self {
        self.app.must_not_restart = val;
        self
    }

    pub fn build(self) -> ApplicationConfig {
        self.app
    }
}

/// A throwaway Go module on disk.
pub struct GoProject {
    _dir: TempDir,
    root: PathBuf,
}

impl GoProject {
    /// Create `go.mod` declaring `module`.
    pub fn new(module: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = dir.path().canonicalize().expect("canonicalize temp dir");
        fs::write(root.join("go.mod"), format!("module {module}\n\ngo 1.22\n"))
            .expect("write go.mod");
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn file(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write source file");
        path
    }

    pub fn with_file(self, rel: &str, contents: &str) -> Self {
        self.file(rel, contents);
        self
    }

    /// Append to an existing file, producing a plain write event.
    pub fn append(&self, rel: &str, contents: &str) {
        use std::io::Write;
        let mut f = fs::OpenOptions::new()
            .append(true)
            .open(self.path(rel))
            .expect("open for append");
        f.write_all(contents.as_bytes()).expect("append");
    }
}
