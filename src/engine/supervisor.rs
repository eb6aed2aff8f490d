// src/engine/supervisor.rs

//! One application's build → run → restart loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ApplicationConfig;
use crate::deps::DependencyGraph;
use crate::errors::Result;
use crate::exec::output::{AppLog, LineFormatter, LineSink, OutputOptions};
use crate::exec::process::{spawn_process, ExitState, RunningProcess, SpawnRequest, Termination};
use crate::exec::{BuildBackend, BuildRequest};
use crate::paths::StateDir;
use crate::pids::PidRegistry;
use crate::watch::{AppWatchHandle, RestartSignal, TrackedFiles};

/// Delay before a freshly spawned pid is recorded in the registry.
pub const PID_REGISTER_DELAY: Duration = Duration::from_millis(500);

/// Default SIGINT grace period before escalating to SIGKILL.
pub const DEFAULT_KILL_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Building,
    Running,
    AwaitingRestartOrExit,
    Stopped,
}

/// Collaborators and settings shared by every supervisor of a run.
#[derive(Debug, Clone)]
pub struct SupervisorEnv {
    /// Canonical project root. Entries are resolved against it.
    pub root: PathBuf,
    pub state: StateDir,
    pub graph: Arc<DependencyGraph>,
    pub builder: Arc<dyn BuildBackend>,
    pub pids: Arc<PidRegistry>,
    pub sink: Arc<dyn LineSink>,
    pub output: OutputOptions,
    pub name_padding: usize,
    pub kill_timeout: Duration,
    pub pid_register_delay: Duration,
}

/// What woke the running-state select.
#[derive(Debug)]
enum LoopEvent {
    Shutdown,
    Restart,
    Exited(ExitState),
    RegisterPid,
}

/// What to do once the current process is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    Rebuild,
    /// Exited on its own and must not be relaunched automatically.
    Park,
    Stop,
}

#[derive(Debug)]
pub struct ApplicationSupervisor {
    config: ApplicationConfig,
    entry: PathBuf,
    binary: PathBuf,
    root: PathBuf,
    watch: AppWatchHandle,
    builder: Arc<dyn BuildBackend>,
    pids: Arc<PidRegistry>,
    log: AppLog,
    kill_timeout: Duration,
    pid_register_delay: Duration,
    state_tx: watch::Sender<SupervisorState>,
}

impl ApplicationSupervisor {
    /// Resolve the application's dependency set and prepare its loop.
    pub fn new(config: ApplicationConfig, env: &SupervisorEnv) -> Self {
        let entry = env.root.join(&config.path);
        let files = TrackedFiles::resolve(Arc::clone(&env.graph), &entry);
        info!(app = %config.name, files = files.len(), "tracking dependencies");

        let watch = AppWatchHandle {
            name: config.name.clone(),
            files,
            restart: RestartSignal::new(),
        };
        let log = AppLog::new(
            LineFormatter::new(config.name.clone(), env.name_padding, config.color, env.output),
            Arc::clone(&env.sink),
        );
        let (state_tx, _) = watch::channel(SupervisorState::Building);

        Self {
            binary: env.state.binary_path(&config.name),
            entry,
            root: env.root.clone(),
            watch,
            builder: Arc::clone(&env.builder),
            pids: Arc::clone(&env.pids),
            log,
            kill_timeout: env.kill_timeout,
            pid_register_delay: env.pid_register_delay,
            state_tx,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Handle given to the file watcher.
    pub fn watch_handle(&self) -> AppWatchHandle {
        self.watch.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.state_tx.subscribe()
    }

    fn publish(&self, state: SupervisorState) {
        debug!(app = %self.config.name, ?state, "supervisor state");
        self.state_tx.send_replace(state);
    }

    async fn build_and_spawn(&self) -> Result<RunningProcess> {
        let request = BuildRequest {
            app: &self.config.name,
            entry: &self.entry,
            output: &self.binary,
            root: &self.root,
        };
        self.builder.build(request, &self.log).await?;

        spawn_process(
            SpawnRequest {
                app: &self.config.name,
                binary: &self.binary,
                env: &self.config.env,
                cwd: &self.root,
            },
            &self.log,
        )
    }

    /// Drive the application until `cancel` fires.
    ///
    /// An application configured with `must_not_restart` that exits on its
    /// own stays `Stopped` until a source change asks for a restart.
    pub async fn run(self, cancel: CancellationToken) {
        let name = self.config.name.clone();

        loop {
            self.publish(SupervisorState::Building);
            let spawned = tokio::select! {
                _ = cancel.cancelled() => break,
                res = self.build_and_spawn() => res,
            };

            let mut process = match spawned {
                Ok(process) => process,
                Err(err) => {
                    error!(app = %name, error = %err, "could not start, waiting for changes");
                    self.publish(SupervisorState::AwaitingRestartOrExit);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.watch.restart.notified() => continue,
                    }
                }
            };

            self.publish(SupervisorState::Running);
            match self.supervise(&mut process, &cancel).await {
                Next::Rebuild => {}
                Next::Stop => break,
                Next::Park => {
                    self.publish(SupervisorState::Stopped);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.watch.restart.notified() => {
                            info!(app = %name, "source changed, starting again");
                        }
                    }
                }
            }
        }

        self.publish(SupervisorState::Stopped);
        info!(app = %name, "supervisor stopped");
    }

    async fn supervise(&self, process: &mut RunningProcess, cancel: &CancellationToken) -> Next {
        let name = &self.config.name;
        let pid = process.pid();
        let register = tokio::time::sleep(self.pid_register_delay);
        tokio::pin!(register);
        let mut registered = false;

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => LoopEvent::Shutdown,
                _ = self.watch.restart.notified() => LoopEvent::Restart,
                state = process.wait() => LoopEvent::Exited(state),
                _ = &mut register, if !registered => LoopEvent::RegisterPid,
            };

            match event {
                LoopEvent::RegisterPid => {
                    registered = true;
                    if !process.has_exited() {
                        self.pids.add(name, pid);
                    }
                }
                LoopEvent::Shutdown => {
                    self.stop_process(process).await;
                    return Next::Stop;
                }
                LoopEvent::Restart => {
                    info!(app = %name, pid, "restarting");
                    self.stop_process(process).await;
                    return Next::Rebuild;
                }
                LoopEvent::Exited(state) => {
                    self.pids.remove(name, pid);
                    let uptime_ms = process.started_at().elapsed().as_millis() as u64;
                    debug!(app = %name, pid, uptime_ms, "process gone");
                    if self.config.must_not_restart {
                        info!(app = %name, pid, ?state, "exited, not restarting");
                        return Next::Park;
                    }
                    debug!(app = %name, pid, ?state, "exited, rebuilding");
                    return Next::Rebuild;
                }
            }
        }
    }

    async fn stop_process(&self, process: &mut RunningProcess) {
        let pid = process.pid();
        match process.terminate(self.kill_timeout).await {
            Termination::Unresponsive => {
                warn!(app = %self.config.name, pid, "process may still be alive");
            }
            outcome => debug!(app = %self.config.name, pid, ?outcome, "process stopped"),
        }
        self.pids.remove(&self.config.name, pid);
    }
}
