// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::validate::validate_raw_config;
use crate::errors::{GomonError, Result};

pub const DEFAULT_CONFIG_FILE: &str = ".gomon.toml";

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = GomonError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.apps, String::new()))
    }
}

/// Parse TOML into the raw model, without semantic validation.
pub fn parse_config(contents: &str) -> Result<RawConfigFile> {
    Ok(toml::from_str(contents)?)
}

/// Read, parse and validate a configuration file, and fingerprint its
/// contents.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("reading config file {:?}", path))?;
    let contents = std::str::from_utf8(&bytes)
        .map_err(|e| GomonError::ConfigError(format!("{:?} is not valid UTF-8: {e}", path)))?;

    let mut config = ConfigFile::try_from(parse_config(contents)?)?;
    config.fingerprint = fingerprint_bytes(&bytes);
    Ok(config)
}

/// Fingerprint of a configuration file, without parsing it.
pub fn fingerprint_of(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("reading config file {:?}", path))?;
    Ok(fingerprint_bytes(&bytes))
}

pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    #[test]
    fn loads_and_fingerprints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".gomon.toml");
        let src = r#"
[[app]]
name = "api"
path = "cmd/api"
color = "cyan_light"
env = { PORT = "8080" }

[[app]]
name = "migrate"
path = "cmd/migrate/main.go"
must_not_restart = true
"#;
        fs::write(&path, src).unwrap();

        let cfg = load_and_validate(&path).unwrap();
        assert_eq!(cfg.apps.len(), 2);
        assert_eq!(cfg.apps[0].color, Color::CyanLight);
        assert_eq!(cfg.apps[0].env.get("PORT").map(String::as_str), Some("8080"));
        assert!(cfg.apps[1].must_not_restart);
        assert_eq!(cfg.apps[1].color, Color::Reset);
        assert_eq!(cfg.name_padding(), 7);
        assert_eq!(cfg.fingerprint, fingerprint_of(&path).unwrap());
        assert_eq!(cfg.fingerprint.len(), 64);
    }

    #[test]
    fn fingerprint_changes_with_contents() {
        assert_ne!(fingerprint_bytes(b"a"), fingerprint_bytes(b"b"));
        assert_eq!(fingerprint_bytes(b"a"), fingerprint_bytes(b"a"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse_config("[[app]]\nname = \"api\"\npath = \"x\"\nrestart = 1\n").unwrap_err();
        assert!(matches!(err, GomonError::TomlError(_)));
    }
}
