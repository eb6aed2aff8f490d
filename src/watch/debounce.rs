// src/watch/debounce.rs

//! Burst coalescing between file writes and restart signals.
//!
//! Writes only mark applications as pending. A ticker fires the pending
//! restarts once no relevant write has been seen for a full window.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::types::AppName;
use crate::watch::tracked::RestartSignal;

/// Interval at which pending restarts are evaluated.
pub const DEBOUNCE_TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
struct DebounceState {
    last_event: Option<Instant>,
    pending: BTreeSet<AppName>,
}

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    state: Mutex<DebounceState>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: Mutex::new(DebounceState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, DebounceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Note a write at `at` and mark `apps` as needing a restart.
    pub fn record_write<I>(&self, at: Instant, apps: I)
    where
        I: IntoIterator<Item = AppName>,
    {
        let mut state = self.state();
        state.last_event = Some(at);
        state.pending.extend(apps);
    }

    /// Applications whose burst settled by `now`. Empties the pending set.
    pub fn take_due(&self, now: Instant) -> Vec<AppName> {
        let mut state = self.state();
        match state.last_event {
            Some(last) if now.saturating_duration_since(last) >= self.window => {
                state.last_event = None;
                std::mem::take(&mut state.pending).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn pending(&self) -> BTreeSet<AppName> {
        self.state().pending.clone()
    }
}

/// Tick every `tick` and fire the restart signal of each settled app.
pub async fn run_debounce_loop(
    debouncer: Arc<Debouncer>,
    signals: HashMap<AppName, RestartSignal>,
    tick: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                for app in debouncer.take_due(Instant::now()) {
                    match signals.get(&app) {
                        Some(signal) => {
                            info!(app = %app, "source changed, restarting");
                            signal.notify();
                        }
                        None => debug!(app = %app, "no restart signal registered"),
                    }
                }
            }
        }
    }
    debug!("debounce loop finished");
}
