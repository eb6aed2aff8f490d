// src/watch/tracked.rs

//! Per-application state shared between a supervisor and the file watcher.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::deps::DependencyGraph;
use crate::types::AppName;

/// The files whose modification should restart one application.
///
/// Cloning shares the same underlying set.
#[derive(Debug, Clone)]
pub struct TrackedFiles {
    files: Arc<Mutex<HashSet<PathBuf>>>,
    graph: Arc<DependencyGraph>,
}

impl TrackedFiles {
    /// Resolve the dependency set of `entry` and start tracking it.
    pub fn resolve(graph: Arc<DependencyGraph>, entry: &Path) -> Self {
        let files = graph.resolve(entry);
        Self {
            files: Arc::new(Mutex::new(files)),
            graph,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains(path)
    }

    /// Re-read `file`'s imports and add anything newly reachable.
    pub fn refresh_from(&self, file: &Path) -> usize {
        let mut files = self.lock();
        self.graph.extend(&mut files, file)
    }

    /// Drop `path` and everything tracked beneath it. Returns how many
    /// entries were removed.
    pub fn purge(&self, path: &Path) -> usize {
        let mut files = self.lock();
        let before = files.len();
        files.retain(|f| !f.starts_with(path));
        before - files.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Single-slot restart request. Any number of `notify` calls before the
/// supervisor waits collapse into one pending request.
#[derive(Debug, Clone, Default)]
pub struct RestartSignal(Arc<Notify>);

impl RestartSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self) {
        self.0.notify_one();
    }

    pub async fn notified(&self) {
        self.0.notified().await;
    }
}

/// What the watcher needs to know about one application.
#[derive(Debug, Clone)]
pub struct AppWatchHandle {
    pub name: AppName,
    pub files: TrackedFiles,
    pub restart: RestartSignal,
}
