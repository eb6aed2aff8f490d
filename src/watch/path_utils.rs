// src/watch/path_utils.rs

//! Directory enumeration and noise filtering for the watcher.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;

/// File names produced by editors while saving, never worth a restart.
const NOISE_PATTERNS: &[&str] = &["*~", ".#*", "*.swp", "*.swx", "4913"];

pub fn noise_filter() -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in NOISE_PATTERNS {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Whether the file name of `path` matches the noise filter.
pub fn is_noise(filter: &GlobSet, path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| filter.is_match(Path::new(name)))
}

/// `dir` followed by every directory beneath it.
///
/// Unreadable directories are skipped with a warning.
pub fn collect_dirs(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let entries = match fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = ?current, error = %err, "skipping unreadable directory");
                continue;
            }
        };
        out.push(current);
        let mut children: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
            .map(|e| e.path())
            .collect();
        children.sort();
        stack.extend(children.into_iter().rev());
    }
    out
}
