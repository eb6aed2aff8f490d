// src/engine/orchestrator.rs

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::deps::{DependencyGraph, GoModule};
use crate::engine::supervisor::{
    ApplicationSupervisor, SupervisorEnv, SupervisorState, DEFAULT_KILL_TIMEOUT,
    PID_REGISTER_DELAY,
};
use crate::errors::Result;
use crate::exec::output::{LineSink, OutputOptions, StdoutSink};
use crate::exec::{BuildBackend, GoToolchain};
use crate::fs::{FileSystem, RealFileSystem};
use crate::paths::StateDir;
use crate::pids::PidRegistry;
use crate::types::AppName;
use crate::watch::{spawn_watcher, WatcherHandle, WatcherSettings};

/// Interval at which the live pid set is flushed to disk.
pub const PID_PERSIST_INTERVAL: Duration = Duration::from_secs(2);

/// Options of one `gomon run`.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub root: PathBuf,
    /// Directories to watch, relative to `root`.
    pub directories: Vec<PathBuf>,
    pub watch_timeout: Duration,
    pub kill_timeout: Duration,
    pub output: OutputOptions,
    /// Base for the state directory; the system temp dir when `None`.
    pub state_base: Option<PathBuf>,
    pub persist_interval: Duration,
    pub pid_register_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            directories: ["cmd", "pkg", "internal"].into_iter().map(PathBuf::from).collect(),
            watch_timeout: Duration::from_secs(1),
            kill_timeout: DEFAULT_KILL_TIMEOUT,
            output: OutputOptions::default(),
            state_base: None,
            persist_interval: PID_PERSIST_INTERVAL,
            pid_register_delay: PID_REGISTER_DELAY,
        }
    }
}

impl RunOptions {
    pub fn state_dir(&self, fingerprint: &str) -> StateDir {
        match &self.state_base {
            Some(base) => StateDir::under(base, fingerprint),
            None => StateDir::for_fingerprint(fingerprint),
        }
    }
}

/// Sets up and owns everything a run needs.
#[derive(Debug)]
pub struct Orchestrator {
    config: ConfigFile,
    options: RunOptions,
    builder: Arc<dyn BuildBackend>,
    sink: Arc<dyn LineSink>,
    fs: Arc<dyn FileSystem>,
}

impl Orchestrator {
    pub fn new(config: ConfigFile, options: RunOptions) -> Self {
        Self {
            config,
            options,
            builder: Arc::new(GoToolchain::new()),
            sink: Arc::new(StdoutSink),
            fs: Arc::new(RealFileSystem),
        }
    }

    pub fn with_builder(mut self, builder: Arc<dyn BuildBackend>) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn LineSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Run until `shutdown` completes, then stop everything cleanly.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let running = self.start().await?;
        shutdown.await;
        info!("shutdown requested");
        running.shutdown().await
    }

    /// Reap leftovers, start every supervisor and the watcher.
    ///
    /// Errors here are fatal: unreadable project root, state directory,
    /// `go.mod`, or OS watcher.
    pub async fn start(self) -> Result<RunningOrchestrator> {
        let root = self
            .options
            .root
            .canonicalize()
            .with_context(|| format!("resolving project root {:?}", self.options.root))?;

        let state = self.options.state_dir(&self.config.fingerprint);
        state.ensure()?;
        debug!(path = ?state.root(), "state directory ready");

        let reaped = PidRegistry::reap_stale(&state);
        if !reaped.is_empty() {
            info!(count = reaped.len(), "killed processes left over from a previous run");
        }

        let module = GoModule::discover(self.fs.as_ref(), &root)?;
        info!(module = %module.path(), root = ?root, "go module found");

        let pids = Arc::new(PidRegistry::new());
        let env = SupervisorEnv {
            root: root.clone(),
            state: state.clone(),
            graph: Arc::new(DependencyGraph::new(module, Arc::clone(&self.fs))),
            builder: Arc::clone(&self.builder),
            pids: Arc::clone(&pids),
            sink: Arc::clone(&self.sink),
            output: self.options.output,
            name_padding: self.config.name_padding(),
            kill_timeout: self.options.kill_timeout,
            pid_register_delay: self.options.pid_register_delay,
        };

        let supervisors: Vec<ApplicationSupervisor> = self
            .config
            .apps
            .iter()
            .map(|app| ApplicationSupervisor::new(app.clone(), &env))
            .collect();
        let states: BTreeMap<AppName, watch::Receiver<SupervisorState>> = supervisors
            .iter()
            .map(|s| (s.name().to_string(), s.subscribe()))
            .collect();

        let cancel = CancellationToken::new();
        let watcher = spawn_watcher(
            WatcherSettings {
                root: root.clone(),
                directories: self.options.directories.clone(),
                debounce: self.options.watch_timeout,
            },
            supervisors.iter().map(|s| s.watch_handle()).collect(),
            cancel.child_token(),
        )?;

        let mut tasks = JoinSet::new();
        for supervisor in supervisors {
            tasks.spawn(supervisor.run(cancel.clone()));
        }

        let persist = tokio::spawn(run_persist_loop(
            Arc::clone(&pids),
            state.clone(),
            self.options.persist_interval,
            cancel.clone(),
        ));

        info!(apps = states.len(), "supervising");
        Ok(RunningOrchestrator {
            cancel,
            supervisors: tasks,
            watcher,
            persist,
            pids,
            state,
            states,
        })
    }
}

/// A started run. Dropping it without [`RunningOrchestrator::shutdown`]
/// leaves children to `kill_on_drop` and the next run's reaping.
#[derive(Debug)]
pub struct RunningOrchestrator {
    cancel: CancellationToken,
    supervisors: JoinSet<()>,
    watcher: WatcherHandle,
    persist: JoinHandle<()>,
    pids: Arc<PidRegistry>,
    state: StateDir,
    states: BTreeMap<AppName, watch::Receiver<SupervisorState>>,
}

impl RunningOrchestrator {
    /// State channel of each application.
    pub fn states(&self) -> &BTreeMap<AppName, watch::Receiver<SupervisorState>> {
        &self.states
    }

    pub fn pids(&self) -> &PidRegistry {
        &self.pids
    }

    pub fn state_dir(&self) -> &StateDir {
        &self.state
    }

    /// Cancel every loop, wait for children to be terminated and write the
    /// final pid snapshot.
    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel.cancel();
        while let Some(res) = self.supervisors.join_next().await {
            if let Err(err) = res {
                warn!(error = %err, "supervisor task failed");
            }
        }
        self.watcher.join().await;
        if let Err(err) = self.persist.await {
            warn!(error = %err, "pid persist task failed");
        }
        self.pids.persist(&self.state)?;
        info!("all applications stopped");
        Ok(())
    }
}

async fn run_persist_loop(
    pids: Arc<PidRegistry>,
    state: StateDir,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(err) = pids.persist(&state) {
                    warn!(error = %err, "failed to persist pids, retrying next tick");
                }
            }
        }
    }
}
