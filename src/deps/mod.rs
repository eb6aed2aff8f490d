// src/deps/mod.rs

//! Dependency discovery for supervised Go applications.
//!
//! - [`gomod`] reads the module import path from `go.mod`.
//! - [`imports`] extracts import paths from a Go source header.
//! - [`graph`] walks module-internal imports from an entry point and
//!   produces the set of files whose changes should rebuild that entry.

pub mod gomod;
pub mod graph;
pub mod imports;

pub use gomod::GoModule;
pub use graph::DependencyGraph;
pub use imports::{parse_imports, ImportParseError};
