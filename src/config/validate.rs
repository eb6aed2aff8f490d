// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ApplicationConfig, RawConfigFile};
use crate::errors::{GomonError, Result};

/// Check the invariants every run relies on.
pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_apps(cfg)?;
    let mut seen = HashSet::new();
    for app in &cfg.apps {
        validate_app(app)?;
        if !seen.insert(app.name.as_str()) {
            return Err(GomonError::ConfigError(format!(
                "application name '{}' is used more than once",
                app.name
            )));
        }
    }
    Ok(())
}

fn ensure_has_apps(cfg: &RawConfigFile) -> Result<()> {
    if cfg.apps.is_empty() {
        return Err(GomonError::ConfigError(
            "config must contain at least one [[app]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_app(app: &ApplicationConfig) -> Result<()> {
    if app.name.trim().is_empty() {
        return Err(GomonError::ConfigError(
            "application name must not be empty".to_string(),
        ));
    }
    // Names become file names under the builds directory.
    if app.name.contains(['/', '\\']) || app.name == "." || app.name == ".." {
        return Err(GomonError::ConfigError(format!(
            "application name '{}' must not contain path separators",
            app.name
        )));
    }
    if app.path.as_os_str().is_empty() {
        return Err(GomonError::ConfigError(format!(
            "application '{}' has an empty `path`",
            app.name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> RawConfigFile {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn accepts_minimal_config() {
        let cfg = parse("[[app]]\nname = \"api\"\npath = \"cmd/api\"\n");
        assert!(validate_raw_config(&cfg).is_ok());
    }

    #[test]
    fn rejects_empty_config() {
        let err = validate_raw_config(&RawConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let cfg = parse(
            "[[app]]\nname = \"api\"\npath = \"cmd/a\"\n[[app]]\nname = \"api\"\npath = \"cmd/b\"\n",
        );
        let err = validate_raw_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn rejects_names_with_separators_and_empty_paths() {
        let cfg = parse("[[app]]\nname = \"a/b\"\npath = \"cmd/a\"\n");
        assert!(validate_raw_config(&cfg).is_err());

        let cfg = parse("[[app]]\nname = \"api\"\npath = \"\"\n");
        assert!(validate_raw_config(&cfg).is_err());
    }
}
