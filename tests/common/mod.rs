#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gomon::config::ConfigFile;
use gomon::engine::{Orchestrator, RunOptions, RunningOrchestrator, SupervisorState};
use gomon::exec::{MemorySink, OutputOptions};
use gomon_test_utils::{GoProject, ScriptToolchain};
use tempfile::TempDir;
use tokio::sync::watch;

/// Options tuned for tests: short timeouts, plain output, private state dir.
pub fn fast_options(project: &GoProject, state_base: &TempDir) -> RunOptions {
    RunOptions {
        root: project.root().to_path_buf(),
        directories: ["cmd", "pkg", "internal"].into_iter().map(PathBuf::from).collect(),
        watch_timeout: Duration::from_millis(300),
        kill_timeout: Duration::from_millis(500),
        output: OutputOptions {
            colors: false,
            show_pid: false,
            show_error_marker: true,
        },
        state_base: Some(state_base.path().to_path_buf()),
        persist_interval: Duration::from_millis(100),
        pid_register_delay: Duration::from_millis(50),
    }
}

pub struct Harness {
    pub state_base: TempDir,
    pub toolchain: ScriptToolchain,
    pub sink: MemorySink,
    pub running: RunningOrchestrator,
}

impl Harness {
    pub async fn start(project: &GoProject, config: ConfigFile, toolchain: ScriptToolchain) -> Self {
        let state_base = tempfile::tempdir().unwrap();
        Self::start_in(project, config, toolchain, state_base).await
    }

    pub async fn start_in(
        project: &GoProject,
        config: ConfigFile,
        toolchain: ScriptToolchain,
        state_base: TempDir,
    ) -> Self {
        let sink = MemorySink::new();
        let running = Orchestrator::new(config, fast_options(project, &state_base))
            .with_builder(Arc::new(toolchain.clone()))
            .with_sink(Arc::new(sink.clone()))
            .start()
            .await
            .unwrap();
        Self {
            state_base,
            toolchain,
            sink,
            running,
        }
    }

    pub fn state(&self, app: &str) -> watch::Receiver<SupervisorState> {
        self.running.states()[app].clone()
    }

    pub async fn wait_for_state(&self, app: &str, want: SupervisorState) {
        let mut rx = self.state(app);
        rx.wait_for(|s| *s == want).await.unwrap();
    }
}
