// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Registering every directory under the configured roots with `notify`.
//! - Turning raw events into create/write/remove/rename operations.
//! - Keeping each application's tracked file set current.
//! - Coalescing bursts of writes into one restart per application.
//!
//! It does **not** build or run anything; it only fires the
//! [`RestartSignal`] of affected applications.

pub mod debounce;
pub mod event_handler;
pub mod path_utils;
pub mod tracked;
pub mod watcher;

pub use debounce::Debouncer;
pub use event_handler::{classify, EventHandler, FsEvent, FsOp, WatchRegistry};
pub use tracked::{AppWatchHandle, RestartSignal, TrackedFiles};
pub use watcher::{spawn_watcher, WatcherHandle, WatcherSettings};
