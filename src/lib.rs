// src/lib.rs

pub mod cli;
pub mod config;
pub mod deps;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod paths;
pub mod pids;
pub mod types;
pub mod watch;

use anyhow::Result;
use tracing::warn;

use crate::cli::{CliArgs, Command, RunArgs};
use crate::config::{fingerprint_of, load_and_validate};
use crate::engine::{wait_for_shutdown_signal, Orchestrator, RunOptions};
use crate::paths::StateDir;
use crate::pids::PidRegistry;

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    match &args.command {
        Command::Run(run_args) => run_apps(&args, run_args).await,
        Command::OlderPids => print_older_pids(&args),
    }
}

async fn run_apps(args: &CliArgs, run_args: &RunArgs) -> Result<()> {
    let config = load_and_validate(&args.config)?;
    let options = RunOptions {
        root: run_args.root.clone(),
        directories: run_args.directories.clone(),
        watch_timeout: run_args.watch_timeout,
        kill_timeout: run_args.kill_timeout,
        output: run_args.output_options(),
        ..RunOptions::default()
    };

    Orchestrator::new(config, options)
        .run(async {
            if let Err(err) = wait_for_shutdown_signal().await {
                warn!(error = %err, "cannot listen for shutdown signals, stopping");
            }
        })
        .await?;
    Ok(())
}

fn print_older_pids(args: &CliArgs) -> Result<()> {
    let fingerprint = fingerprint_of(&args.config)?;
    let pids = PidRegistry::load(&StateDir::for_fingerprint(&fingerprint))?;
    if pids.is_empty() {
        println!("no pids recorded");
    }
    for (name, pid) in pids {
        println!("{name}: {pid}");
    }
    Ok(())
}
