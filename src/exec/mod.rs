// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] builds application binaries behind the [`BuildBackend`]
//!   trait.
//! - [`process`] spawns a built binary, monitors it and implements the
//!   graceful-then-forced termination protocol.
//! - [`output`] formats and forwards every line the children print.
//! - [`signal`] wraps the raw signals sent to process groups.

pub mod backend;
pub mod output;
pub mod process;
pub mod signal;

pub use backend::{BuildBackend, BuildRequest, GoToolchain};
pub use output::{AppLog, LineFormatter, LineSink, MemorySink, OutputOptions, StdoutSink};
pub use process::{spawn_process, ExitState, RunningProcess, SpawnRequest, Termination};
