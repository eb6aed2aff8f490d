// src/exec/backend.rs

//! Pluggable build backend.
//!
//! Supervisors never invoke the Go toolchain directly; they go through a
//! [`BuildBackend`]. Production uses [`GoToolchain`]. Tests swap in a backend
//! that produces a shell script instead of a compiled binary.

use std::ffi::OsString;
use std::fmt::Debug;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{GomonError, Result};
use crate::exec::output::{pump_lines, AppLog, LineScope, Stream};

/// Everything a backend needs to produce one application's binary.
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    pub app: &'a str,
    /// Absolute path of the package directory or `.go` file to build.
    pub entry: &'a Path,
    /// Where the binary must be written.
    pub output: &'a Path,
    /// Project root, used as the working directory.
    pub root: &'a Path,
}

pub type BuildFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

pub trait BuildBackend: Send + Sync + Debug {
    /// Build `request.entry` into `request.output`.
    ///
    /// Toolchain output is forwarded through `log` with [`LineScope::Build`].
    /// A failed build is reported as [`GomonError::BuildFailed`].
    fn build<'a>(&'a self, request: BuildRequest<'a>, log: &'a AppLog) -> BuildFuture<'a>;
}

/// Runs `go build -o <output> <entry>`.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    program: OsString,
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self {
            program: OsString::from("go"),
        }
    }
}

impl GoToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `go` executable instead of the one on `PATH`.
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl BuildBackend for GoToolchain {
    fn build<'a>(&'a self, request: BuildRequest<'a>, log: &'a AppLog) -> BuildFuture<'a> {
        Box::pin(async move {
            info!(app = %request.app, entry = ?request.entry, "building");

            let mut cmd = Command::new(&self.program);
            cmd.arg("build")
                .arg("-o")
                .arg(request.output)
                .arg(request.entry)
                .current_dir(request.root)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let mut child = cmd.spawn().map_err(|source| GomonError::Spawn {
                app: request.app.to_string(),
                source,
            })?;
            let pid = child.id();

            let mut pumps = Vec::with_capacity(2);
            if let Some(stdout) = child.stdout.take() {
                pumps.push(pump_lines(stdout, log.clone(), pid, Stream::Stdout, LineScope::Build));
            }
            if let Some(stderr) = child.stderr.take() {
                pumps.push(pump_lines(stderr, log.clone(), pid, Stream::Stderr, LineScope::Build));
            }

            let status = child.wait().await?;
            for pump in pumps {
                let _ = pump.await;
            }

            if !status.success() {
                return Err(GomonError::BuildFailed {
                    app: request.app.to_string(),
                    code: status.code().unwrap_or(-1),
                });
            }
            debug!(app = %request.app, output = ?request.output, "build finished");
            Ok(())
        })
    }
}
