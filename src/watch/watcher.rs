// src/watch/watcher.rs

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::types::AppName;
use crate::watch::debounce::{run_debounce_loop, Debouncer, DEBOUNCE_TICK};
use crate::watch::event_handler::{classify, EventHandler, WatchRegistry};
use crate::watch::path_utils::collect_dirs;
use crate::watch::tracked::{AppWatchHandle, RestartSignal};

#[derive(Debug, Clone)]
pub struct WatcherSettings {
    /// Project root; `directories` are relative to it.
    pub root: PathBuf,
    pub directories: Vec<PathBuf>,
    /// Quiet period after the last write before restarts fire.
    pub debounce: Duration,
}

/// Directories registered with a `notify` watcher, one non-recursive watch
/// each.
pub struct NotifyRegistry {
    watcher: RecommendedWatcher,
    watched: BTreeSet<PathBuf>,
}

impl std::fmt::Debug for NotifyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyRegistry")
            .field("watched", &self.watched)
            .finish()
    }
}

impl NotifyRegistry {
    pub fn new(watcher: RecommendedWatcher) -> Self {
        Self {
            watcher,
            watched: BTreeSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.watched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }
}

impl WatchRegistry for NotifyRegistry {
    fn add_dir(&mut self, dir: &Path) -> Result<()> {
        if self.watched.contains(dir) {
            return Ok(());
        }
        self.watcher.watch(dir, RecursiveMode::NonRecursive)?;
        self.watched.insert(dir.to_path_buf());
        debug!(path = ?dir, "watching directory");
        Ok(())
    }

    fn remove_dir(&mut self, path: &Path) {
        let gone: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|d| d.starts_with(path))
            .cloned()
            .collect();
        for dir in gone {
            // The OS usually dropped the watch already when the directory went away.
            let _ = self.watcher.unwatch(&dir);
            self.watched.remove(&dir);
            debug!(path = ?dir, "stopped watching directory");
        }
    }
}

/// Background tasks of a running watcher.
#[derive(Debug)]
pub struct WatcherHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl WatcherHandle {
    /// Wait for the event and debounce loops to finish after cancellation.
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "watcher task failed");
            }
        }
    }
}

/// Start watching the configured directories and signalling restarts for
/// `apps` whose tracked files change.
///
/// Failing to create the OS watcher is fatal; directories that cannot be
/// registered are skipped with a warning.
pub fn spawn_watcher(
    settings: WatcherSettings,
    apps: Vec<AppWatchHandle>,
    cancel: CancellationToken,
) -> Result<WatcherHandle> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let _ = event_tx.send(event);
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )?;

    let mut registry = NotifyRegistry::new(watcher);
    for dir in &settings.directories {
        let dir = settings.root.join(dir);
        if !dir.is_dir() {
            warn!(path = ?dir, "watch directory does not exist, skipping");
            continue;
        }
        for sub in collect_dirs(&dir) {
            if let Err(err) = registry.add_dir(&sub) {
                warn!(path = ?sub, error = %err, "failed to watch directory, skipping");
            }
        }
    }
    info!(
        directories = registry.len(),
        debounce_ms = settings.debounce.as_millis() as u64,
        "file watcher started"
    );

    let signals: HashMap<AppName, RestartSignal> = apps
        .iter()
        .map(|app| (app.name.clone(), app.restart.clone()))
        .collect();
    let debouncer = Arc::new(Debouncer::new(settings.debounce));
    let mut handler = EventHandler::new(apps, Arc::clone(&debouncer), registry);

    let event_cancel = cancel.clone();
    let events = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = event_cancel.cancelled() => break,
                received = event_rx.recv() => {
                    let Some(event) = received else { break };
                    for fs_event in classify(&event) {
                        handler.handle(fs_event, Instant::now());
                    }
                }
            }
        }
        // Dropping the handler drops the OS watcher.
        drop(handler);
        debug!("watcher event loop finished");
    });

    let debounce = tokio::spawn(run_debounce_loop(debouncer, signals, DEBOUNCE_TICK, cancel));

    Ok(WatcherHandle {
        tasks: vec![events, debounce],
    })
}
