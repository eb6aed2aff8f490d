// src/engine/mod.rs

//! Supervision engine.
//!
//! - [`supervisor`] drives one application through build, run and restart.
//! - [`orchestrator`] wires every supervisor to the file watcher and the
//!   pid registry, and owns top-level cancellation.
//! - [`signals`] listens for the OS signals that end a run.

pub mod orchestrator;
pub mod signals;
pub mod supervisor;

pub use orchestrator::{Orchestrator, RunOptions, RunningOrchestrator};
pub use signals::wait_for_shutdown_signal;
pub use supervisor::{ApplicationSupervisor, SupervisorEnv, SupervisorState};
