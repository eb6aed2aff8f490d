// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] is the TOML-backed data model.
//! - [`loader`] reads a file from disk and fingerprints it.
//! - [`validate`] checks names and paths.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{fingerprint_of, load_and_validate, DEFAULT_CONFIG_FILE};
pub use model::{ApplicationConfig, ConfigFile, RawConfigFile};
