// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::exec::OutputOptions;
use crate::types::parse_duration;

/// Command-line arguments for `gomon`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gomon",
    version,
    about = "Run several Go programs and rebuild/restart them when their sources change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(
        short = 'C',
        long,
        global = true,
        value_name = "PATH",
        default_value = crate::config::DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GOMON_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the applications described in the config file.
    Run(RunArgs),

    /// Print the pids recorded for the current config file.
    OlderPids,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Print output without colours.
    #[arg(long)]
    pub no_colors: bool,

    /// Prefix every line with the process id.
    #[arg(short, long)]
    pub pid: bool,

    /// Do not mark stderr lines with `ERR:`.
    #[arg(short, long)]
    pub ignore_error: bool,

    /// Directories to watch, relative to the project root.
    #[arg(
        short,
        long,
        value_delimiter = ',',
        default_values = ["cmd", "pkg", "internal"]
    )]
    pub directories: Vec<PathBuf>,

    /// Quiet period after a change before restarting (e.g. 500ms, 1s).
    #[arg(short = 't', long, value_parser = parse_duration, default_value = "1s")]
    pub watch_timeout: Duration,

    /// How long an application may take to exit after SIGINT.
    #[arg(long, value_parser = parse_duration, default_value = "2s")]
    pub kill_timeout: Duration,

    /// Project root containing `go.mod`.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

impl RunArgs {
    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            colors: !self.no_colors,
            show_pid: self.pid,
            show_error_marker: !self.ignore_error,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults() {
        let args = CliArgs::try_parse_from(["gomon", "run"]).unwrap();
        assert_eq!(args.config, PathBuf::from(".gomon.toml"));
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(
            run.directories,
            vec![PathBuf::from("cmd"), PathBuf::from("pkg"), PathBuf::from("internal")]
        );
        assert_eq!(run.watch_timeout, Duration::from_secs(1));
        assert_eq!(run.kill_timeout, Duration::from_secs(2));
        assert_eq!(run.output_options(), OutputOptions::default());
    }

    #[test]
    fn run_flags() {
        let args = CliArgs::try_parse_from([
            "gomon", "run", "-p", "-i", "--no-colors", "-d", "cmd,lib", "-t", "250ms", "-C",
            "dev.toml",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("dev.toml"));
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.directories, vec![PathBuf::from("cmd"), PathBuf::from("lib")]);
        assert_eq!(run.watch_timeout, Duration::from_millis(250));
        assert_eq!(
            run.output_options(),
            OutputOptions {
                colors: false,
                show_pid: true,
                show_error_marker: false,
            }
        );
    }

    #[test]
    fn older_pids_subcommand() {
        let args = CliArgs::try_parse_from(["gomon", "older-pids", "--config", "x.toml"]).unwrap();
        assert!(matches!(args.command, Command::OlderPids));
        assert_eq!(args.config, PathBuf::from("x.toml"));
    }
}
