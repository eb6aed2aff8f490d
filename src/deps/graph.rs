// src/deps/graph.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::deps::gomod::GoModule;
use crate::deps::imports::parse_imports;
use crate::fs::FileSystem;

/// Resolver for the module-internal source files an application depends on.
///
/// Only imports that live inside [`GoModule`] are followed. Each imported
/// package contributes the `.go` files found directly in its directory;
/// sub-packages are distinct import paths and are only included if something
/// imports them.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    module: GoModule,
    fs: Arc<dyn FileSystem>,
}

impl DependencyGraph {
    pub fn new(module: GoModule, fs: Arc<dyn FileSystem>) -> Self {
        Self { module, fs }
    }

    pub fn module(&self) -> &GoModule {
        &self.module
    }

    /// Compute the closed set of files reachable from `entry`.
    ///
    /// `entry` may be a package directory (all its `.go` files are seeds) or
    /// a single source file. Seeds are part of the result.
    pub fn resolve(&self, entry: &Path) -> HashSet<PathBuf> {
        let seeds = if self.fs.is_dir(entry) {
            self.package_files(entry)
        } else {
            vec![entry.to_path_buf()]
        };

        let mut files = HashSet::new();
        let mut worklist = Vec::new();
        for seed in seeds {
            if files.insert(seed.clone()) {
                worklist.push(seed);
            }
        }
        self.expand(&mut files, worklist);

        debug!(entry = ?entry, files = files.len(), "resolved dependency set");
        files
    }

    /// Re-read the imports of `file` and union anything newly reachable into
    /// `files`. Returns how many paths were added.
    ///
    /// `file` itself is always re-parsed, even when already present; files
    /// that are already members are never expanded again.
    pub fn extend(&self, files: &mut HashSet<PathBuf>, file: &Path) -> usize {
        let before = files.len();
        self.expand(files, vec![file.to_path_buf()]);
        let added = files.len() - before;
        if added > 0 {
            debug!(file = ?file, added, "dependency set grew");
        }
        added
    }

    fn expand(&self, files: &mut HashSet<PathBuf>, mut worklist: Vec<PathBuf>) {
        while let Some(file) = worklist.pop() {
            for import in self.imports_of(&file) {
                let Some(dir) = self.module.local_dir(&import) else {
                    continue;
                };
                for dep in self.package_files(&dir) {
                    if files.insert(dep.clone()) {
                        worklist.push(dep);
                    }
                }
            }
        }
    }

    /// Import paths of one file; unreadable or unparsable files yield none.
    fn imports_of(&self, file: &Path) -> Vec<String> {
        let source = match self.fs.read_to_string(file) {
            Ok(s) => s,
            Err(err) => {
                trace!(file = ?file, error = %err, "skipping unreadable source file");
                return Vec::new();
            }
        };
        match parse_imports(&source) {
            Ok(imports) => imports,
            Err(err) => {
                debug!(file = ?file, error = %err, "skipping unparsable source file");
                Vec::new()
            }
        }
    }

    /// `.go` files directly inside `dir`, sorted for stable traversal.
    fn package_files(&self, dir: &Path) -> Vec<PathBuf> {
        let Ok(entries) = self.fs.read_dir(dir) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .into_iter()
            .filter(|p| p.extension().is_some_and(|ext| ext == "go"))
            .filter(|p| self.fs.is_file(p))
            .collect();
        files.sort();
        files
    }
}
