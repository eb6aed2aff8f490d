// src/exec/process.rs

//! Spawning, monitoring and terminating one application process.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, warn};

use crate::errors::{GomonError, Result};
use crate::exec::output::{pump_lines, AppLog, LineScope, Stream};
use crate::exec::signal;

/// How long to wait for the OS to confirm a SIGKILL before giving up.
const KILL_CONFIRM_TIMEOUT: Duration = Duration::from_secs(5);

/// How long the monitor waits for output pipes to drain after exit.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    Running,
    Success,
    Failed(i32),
}

/// How a [`RunningProcess::terminate`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    AlreadyExited,
    Graceful,
    Killed,
    /// SIGKILL was sent but exit was not observed in time.
    Unresponsive,
}

#[derive(Debug, Clone, Copy)]
pub struct SpawnRequest<'a> {
    pub app: &'a str,
    pub binary: &'a Path,
    pub env: &'a BTreeMap<String, String>,
    pub cwd: &'a Path,
}

/// Handle on a live application process.
///
/// The `Child` itself is owned by a monitor task; this handle only sees the
/// exit state through a oneshot channel.
#[derive(Debug)]
pub struct RunningProcess {
    pid: u32,
    started_at: Instant,
    exit_rx: Option<oneshot::Receiver<ExitState>>,
    state: ExitState,
}

/// Start `request.binary` in its own process group and begin streaming its
/// output through `log`.
pub fn spawn_process(request: SpawnRequest<'_>, log: &AppLog) -> Result<RunningProcess> {
    let mut cmd = Command::new(request.binary);
    cmd.envs(request.env)
        .current_dir(request.cwd)
        .process_group(0)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let spawn_err = |source| GomonError::Spawn {
        app: request.app.to_string(),
        source,
    };
    let mut child = cmd.spawn().map_err(spawn_err)?;
    let pid = child
        .id()
        .ok_or_else(|| spawn_err(std::io::Error::other("process exited before its pid was read")))?;

    info!(app = %request.app, pid, "process started");

    let mut pumps = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        pumps.push(pump_lines(stdout, log.clone(), Some(pid), Stream::Stdout, LineScope::Process));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(pump_lines(stderr, log.clone(), Some(pid), Stream::Stderr, LineScope::Process));
    }

    let (tx, rx) = oneshot::channel();
    let app = request.app.to_string();
    let log = log.clone();
    tokio::spawn(async move {
        let state = match child.wait().await {
            Ok(status) if status.success() => ExitState::Success,
            Ok(status) => ExitState::Failed(status.code().unwrap_or(-1)),
            Err(err) => {
                warn!(app = %app, pid, error = %err, "failed to wait for process");
                ExitState::Failed(-1)
            }
        };

        // The leader is gone; reclaim whatever it left in its group.
        if let Ok(raw) = i32::try_from(pid) {
            match signal::sweep_group(raw) {
                Ok(true) => debug!(app = %app, pid, "killed leftover group members"),
                Ok(false) => {}
                Err(errno) => debug!(app = %app, pid, %errno, "group sweep failed"),
            }
        }

        for pump in pumps {
            if timeout(OUTPUT_DRAIN_TIMEOUT, pump).await.is_err() {
                debug!(app = %app, pid, "output still open after exit");
            }
        }

        match state {
            ExitState::Success => log.status(Some(pid), "successfully exited"),
            ExitState::Failed(code) => log.failure(Some(pid), &format!("exited with code: {code}")),
            ExitState::Running => {}
        }
        debug!(app = %app, pid, ?state, "process exited");
        let _ = tx.send(state);
    });

    Ok(RunningProcess {
        pid,
        started_at: Instant::now(),
        exit_rx: Some(rx),
        state: ExitState::Running,
    })
}

impl RunningProcess {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Exit state as of the last observation, polling without blocking.
    pub fn state(&mut self) -> ExitState {
        if let Some(rx) = self.exit_rx.as_mut() {
            match rx.try_recv() {
                Ok(state) => self.finish(state),
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => self.finish(ExitState::Failed(-1)),
            }
        }
        self.state
    }

    pub fn has_exited(&mut self) -> bool {
        self.state() != ExitState::Running
    }

    /// Wait for the monitor to report exit. Cancel safe, and returns the
    /// cached state on every call after the first completion.
    pub async fn wait(&mut self) -> ExitState {
        if let Some(rx) = self.exit_rx.as_mut() {
            let state = rx.await.unwrap_or(ExitState::Failed(-1));
            self.finish(state);
        }
        self.state
    }

    fn finish(&mut self, state: ExitState) {
        self.state = state;
        self.exit_rx = None;
    }

    /// SIGINT, wait up to `grace`, then SIGKILL the process group once.
    pub async fn terminate(&mut self, grace: Duration) -> Termination {
        if self.has_exited() {
            return Termination::AlreadyExited;
        }
        let Ok(pid) = i32::try_from(self.pid) else {
            error!(pid = self.pid, "pid out of range, cannot signal");
            return Termination::Unresponsive;
        };

        if let Err(errno) = signal::interrupt(pid) {
            debug!(pid, %errno, "SIGINT failed");
        }
        if timeout(grace, self.wait()).await.is_ok() {
            return Termination::Graceful;
        }

        warn!(pid, grace_ms = grace.as_millis() as u64, "process ignored SIGINT, killing");
        if let Err(errno) = signal::kill_group(pid) {
            debug!(pid, %errno, "SIGKILL failed");
        }
        match timeout(KILL_CONFIRM_TIMEOUT, self.wait()).await {
            Ok(_) => Termination::Killed,
            Err(_) => {
                error!(pid, "process did not exit after SIGKILL");
                Termination::Unresponsive
            }
        }
    }
}
