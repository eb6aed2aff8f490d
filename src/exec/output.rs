// src/exec/output.rs

//! Line formatting for supervised program output.
//!
//! Every line a build or a running binary prints is re-emitted through a
//! [`LineSink`] with a per-application prefix:
//!
//! ```text
//! [pid ] name  | [ERR:] [[build]] text
//! ```

use std::fmt::Debug;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;

use crate::types::{AppName, Color};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Which step produced a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineScope {
    Build,
    Process,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    pub colors: bool,
    pub show_pid: bool,
    pub show_error_marker: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            colors: true,
            show_pid: false,
            show_error_marker: true,
        }
    }
}

/// Destination of formatted lines.
pub trait LineSink: Send + Sync + Debug {
    fn write_line(&self, line: &str);
}

/// Writes to the supervisor's stdout. Diagnostics go to stderr via tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn write_line(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{line}");
    }
}

/// Collects lines in memory; used by tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of lines that contain `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }
}

impl LineSink for MemorySink {
    fn write_line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

#[derive(Debug, Clone)]
pub struct LineFormatter {
    name: AppName,
    padding: usize,
    color: Color,
    options: OutputOptions,
}

impl LineFormatter {
    pub fn new(name: impl Into<AppName>, padding: usize, color: Color, options: OutputOptions) -> Self {
        Self {
            name: name.into(),
            padding,
            color,
            options,
        }
    }

    pub fn format(&self, pid: Option<u32>, stream: Stream, scope: LineScope, text: &str) -> String {
        let mut prefix = String::new();
        if self.options.show_pid {
            match pid {
                Some(pid) => prefix.push_str(&format!("{pid:05} ")),
                None => prefix.push_str("----- "),
            }
        }
        prefix.push_str(&format!("{:<width$} |", self.name, width = self.padding));

        let mut line = if self.options.colors {
            self.color.paint(&prefix)
        } else {
            prefix
        };

        if stream == Stream::Stderr && self.options.show_error_marker {
            if self.options.colors {
                line.push_str(&" ERR:".red().bold().to_string());
            } else {
                line.push_str(" ERR:");
            }
        }
        if scope == LineScope::Build {
            line.push_str(" [build]");
        }
        line.push(' ');
        line.push_str(text);
        line
    }
}

/// Formatter and sink of one application, cheap to clone into pump tasks.
#[derive(Debug, Clone)]
pub struct AppLog {
    formatter: Arc<LineFormatter>,
    sink: Arc<dyn LineSink>,
}

impl AppLog {
    pub fn new(formatter: LineFormatter, sink: Arc<dyn LineSink>) -> Self {
        Self {
            formatter: Arc::new(formatter),
            sink,
        }
    }

    pub fn line(&self, pid: Option<u32>, stream: Stream, scope: LineScope, text: &str) {
        self.sink
            .write_line(&self.formatter.format(pid, stream, scope, text));
    }

    /// Supervisor-generated status line about the running process.
    pub fn status(&self, pid: Option<u32>, text: &str) {
        self.line(pid, Stream::Stdout, LineScope::Process, text);
    }

    /// Status line reporting a failure; carries the error marker.
    pub fn failure(&self, pid: Option<u32>, text: &str) {
        self.line(pid, Stream::Stderr, LineScope::Process, text);
    }
}

/// Forward every line of `reader` to `log` until EOF.
pub fn pump_lines<R>(
    reader: R,
    log: AppLog,
    pid: Option<u32>,
    stream: Stream,
    scope: LineScope,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            log.line(pid, stream, scope, &line);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(show_pid: bool, show_error_marker: bool) -> OutputOptions {
        OutputOptions {
            colors: false,
            show_pid,
            show_error_marker,
        }
    }

    #[test]
    fn pads_name_to_longest_app() {
        let f = LineFormatter::new("api", 6, Color::Cyan, plain(false, true));
        assert_eq!(
            f.format(Some(7), Stream::Stdout, LineScope::Process, "listening"),
            "api    | listening"
        );
    }

    #[test]
    fn pid_is_zero_padded_to_five_digits() {
        let f = LineFormatter::new("api", 3, Color::Reset, plain(true, true));
        assert_eq!(
            f.format(Some(42), Stream::Stdout, LineScope::Process, "hi"),
            "00042 api | hi"
        );
        assert_eq!(
            f.format(None, Stream::Stdout, LineScope::Build, "compiling"),
            "----- api | [build] compiling"
        );
    }

    #[test]
    fn error_marker_can_be_suppressed() {
        let marked = LineFormatter::new("worker", 6, Color::Reset, plain(false, true));
        assert_eq!(
            marked.format(None, Stream::Stderr, LineScope::Build, "undefined: x"),
            "worker | ERR: [build] undefined: x"
        );

        let quiet = LineFormatter::new("worker", 6, Color::Reset, plain(false, false));
        assert_eq!(
            quiet.format(None, Stream::Stderr, LineScope::Process, "panic"),
            "worker | panic"
        );
    }

    #[test]
    fn colours_wrap_the_prefix_only() {
        let f = LineFormatter::new("api", 3, Color::Red, OutputOptions::default());
        let line = f.format(None, Stream::Stdout, LineScope::Process, "hello");
        assert!(line.starts_with('\u{1b}'));
        assert!(line.ends_with(" hello"));
    }

    #[tokio::test]
    async fn pump_forwards_each_line() {
        let sink = MemorySink::new();
        let log = AppLog::new(
            LineFormatter::new("api", 3, Color::Reset, plain(false, true)),
            Arc::new(sink.clone()),
        );
        let input: &[u8] = b"one\ntwo\n";
        pump_lines(input, log, None, Stream::Stdout, LineScope::Process)
            .await
            .unwrap();
        assert_eq!(sink.lines(), vec!["api | one", "api | two"]);
    }
}
