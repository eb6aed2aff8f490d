// src/watch/event_handler.rs

//! Classification of raw filesystem events and their effect on the tracked
//! dependency sets.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::GlobSet;
use notify::event::{EventKind, ModifyKind, RenameMode};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::errors::Result;
use crate::watch::debounce::Debouncer;
use crate::watch::path_utils::{collect_dirs, is_noise, noise_filter};
use crate::watch::tracked::AppWatchHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    Create,
    Write,
    Remove,
    Rename,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub op: FsOp,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, op: FsOp) -> Self {
        Self {
            path: path.into(),
            op,
        }
    }
}

/// Map one `notify` event onto zero or more [`FsEvent`]s.
///
/// Metadata and access notifications are dropped. A rename reported as a
/// single event with both paths becomes a rename of the old path and a
/// create of the new one.
pub fn classify(event: &notify::Event) -> Vec<FsEvent> {
    let first = event.paths.first();
    let op = match event.kind {
        EventKind::Create(_) => FsOp::Create,
        EventKind::Remove(_) => FsOp::Remove,
        EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Other) => FsOp::Write,
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => FsOp::Rename,
            RenameMode::To => FsOp::Create,
            RenameMode::Both => {
                let mut out = Vec::with_capacity(2);
                if let Some(from) = event.paths.first() {
                    out.push(FsEvent::new(from, FsOp::Rename));
                }
                if let Some(to) = event.paths.get(1) {
                    out.push(FsEvent::new(to, FsOp::Create));
                }
                return out;
            }
            // Backends that cannot tell the two sides apart.
            RenameMode::Any | RenameMode::Other => match first {
                Some(path) if path.exists() => FsOp::Create,
                _ => FsOp::Rename,
            },
        },
        EventKind::Modify(ModifyKind::Metadata(_))
        | EventKind::Access(_)
        | EventKind::Any
        | EventKind::Other => return Vec::new(),
    };
    event
        .paths
        .iter()
        .map(|path| FsEvent::new(path, op))
        .collect()
}

/// The set of directories registered with the OS watcher.
pub trait WatchRegistry: Send {
    /// Start watching `dir` (non-recursively).
    fn add_dir(&mut self, dir: &Path) -> Result<()>;

    /// Stop watching `path` and every watched directory beneath it.
    fn remove_dir(&mut self, path: &Path);
}

/// Applies classified events to every application's tracked files.
#[derive(Debug)]
pub struct EventHandler<R> {
    apps: Vec<AppWatchHandle>,
    debouncer: Arc<Debouncer>,
    registry: R,
    noise: GlobSet,
}

impl<R: WatchRegistry> EventHandler<R> {
    pub fn new(apps: Vec<AppWatchHandle>, debouncer: Arc<Debouncer>, registry: R) -> Self {
        Self {
            apps,
            debouncer,
            registry,
            noise: noise_filter(),
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn handle(&mut self, event: FsEvent, now: Instant) {
        if is_noise(&self.noise, &event.path) {
            trace!(path = ?event.path, "ignoring editor temp file");
            return;
        }

        match event.op {
            FsOp::Remove | FsOp::Rename => self.forget(&event.path),
            FsOp::Create => self.watch_new_dir(&event.path),
            FsOp::Write => self.touch(&event.path, now),
        }
    }

    fn forget(&mut self, path: &Path) {
        for app in &self.apps {
            let removed = app.files.purge(path);
            if removed > 0 {
                debug!(app = %app.name, path = ?path, removed, "stopped tracking");
            }
        }
        self.registry.remove_dir(path);
    }

    fn watch_new_dir(&mut self, path: &Path) {
        if !path.is_dir() {
            return;
        }
        for dir in collect_dirs(path) {
            if let Err(err) = self.registry.add_dir(&dir) {
                warn!(path = ?dir, error = %err, "failed to watch new directory");
            }
        }
    }

    fn touch(&mut self, path: &Path, now: Instant) {
        let mut affected = Vec::new();
        for app in &self.apps {
            if app.files.contains(path) {
                app.files.refresh_from(path);
                affected.push(app.name.clone());
            }
        }
        if !affected.is_empty() {
            debug!(path = ?path, apps = ?affected, "tracked file written");
        }
        self.debouncer.record_write(now, affected);
    }
}
