//! Diagnostics context: console and file log sinks
//!
//! The console sink always reports warnings and errors as `LEVEL: message`.
//! With a log file, every record down to DEBUG is also appended to the file
//! as `timestamp LEVEL @target message`, and the global threshold is lowered
//! to DEBUG so those records reach the file sink. Each sink still applies its
//! own threshold.
//!
//! The context is an explicit value: `in_scope` makes it the default
//! dispatcher while a closure runs, so tests can build isolated contexts.

use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, Registry};

use crate::infrastructure::{InfraError, InfraResult};

/// Minimum severity of the console sink.
pub const CONSOLE_LEVEL: LevelFilter = LevelFilter::WARN;

/// Minimum severity of the file sink.
pub const FILE_LEVEL: LevelFilter = LevelFilter::DEBUG;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Where a sink writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkKind {
    Console,
    File(PathBuf),
}

/// An active sink and its own threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkInfo {
    pub kind: SinkKind,
    pub level: LevelFilter,
}

/// Configured diagnostics for one process run.
pub struct Diagnostics {
    dispatch: Dispatch,
    sinks: Vec<SinkInfo>,
    max_level: LevelFilter,
}

impl Diagnostics {
    pub fn builder() -> DiagnosticsBuilder {
        DiagnosticsBuilder::default()
    }

    /// Active sinks, console first.
    pub fn sinks(&self) -> &[SinkInfo] {
        &self.sinks
    }

    /// Global pre-filter applied before any sink.
    pub fn max_level(&self) -> LevelFilter {
        self.max_level
    }

    /// Run `f` with these diagnostics as the default dispatcher.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("sinks", &self.sinks)
            .field("max_level", &self.max_level)
            .finish()
    }
}

/// Builds a [`Diagnostics`] context.
pub struct DiagnosticsBuilder {
    console: BoxMakeWriter,
    log_file: Option<PathBuf>,
}

impl Default for DiagnosticsBuilder {
    fn default() -> Self {
        Self {
            console: BoxMakeWriter::new(std::io::stderr),
            log_file: None,
        }
    }
}

impl DiagnosticsBuilder {
    /// Replace stderr as the console destination.
    pub fn console_writer<W>(mut self, writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.console = BoxMakeWriter::new(writer);
        self
    }

    /// Also log to `path` at DEBUG and above.
    pub fn log_file(mut self, path: Option<&Path>) -> Self {
        self.log_file = path.map(Path::to_path_buf);
        self
    }

    /// Open the sinks. Fails when the log file cannot be opened for append.
    pub fn build(self) -> InfraResult<Diagnostics> {
        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
        let mut sinks = Vec::new();

        layers.push(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .event_format(ConsoleFormat)
                .with_writer(self.console)
                .with_filter(CONSOLE_LEVEL)
                .boxed(),
        );
        sinks.push(SinkInfo {
            kind: SinkKind::Console,
            level: CONSOLE_LEVEL,
        });
        let mut max_level = CONSOLE_LEVEL;

        if let Some(path) = self.log_file {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| InfraError::io(format!("open log file {}", path.display()), e))?;
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .event_format(FileFormat)
                    .with_writer(Mutex::new(file))
                    .with_filter(FILE_LEVEL)
                    .boxed(),
            );
            sinks.push(SinkInfo {
                kind: SinkKind::File(path),
                level: FILE_LEVEL,
            });
            max_level = FILE_LEVEL;
        }

        let subscriber = Registry::default().with(layers).with(max_level);
        Ok(Diagnostics {
            dispatch: Dispatch::new(subscriber),
            sinks,
            max_level,
        })
    }
}

/// `LEVEL: message`
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "{}: ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// `timestamp LEVEL @target message`
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFormat;

impl<S, N> FormatEvent<S, N> for FileFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        write!(
            writer,
            "{} {} @{} ",
            Local::now().format(TIMESTAMP_FORMAT),
            meta.level(),
            meta.target()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::CaptureWriter;
    use tempfile::TempDir;

    #[test]
    fn test_console_format_is_level_colon_message() {
        let console = CaptureWriter::new();
        let diagnostics = Diagnostics::builder()
            .console_writer(console.clone())
            .build()
            .unwrap();

        diagnostics.in_scope(|| tracing::error!("disk on fire"));

        assert_eq!(console.contents(), "ERROR: disk on fire\n");
    }

    #[test]
    fn test_file_format_has_timestamp_level_and_target() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("debug.log");
        let diagnostics = Diagnostics::builder()
            .console_writer(CaptureWriter::new())
            .log_file(Some(&log))
            .build()
            .unwrap();

        diagnostics.in_scope(|| tracing::debug!(target: "dantalian::probe", "looking"));

        let content = std::fs::read_to_string(&log).unwrap();
        let line = content.lines().next().unwrap();
        let parts: Vec<&str> = line.splitn(5, ' ').collect();
        assert_eq!(parts.len(), 5, "unexpected line: {line}");
        assert!(chrono::NaiveDate::parse_from_str(parts[0], "%Y-%m-%d").is_ok());
        assert_eq!(parts[2], "DEBUG");
        assert_eq!(parts[3], "@dantalian::probe");
        assert_eq!(parts[4], "looking");
    }

    #[test]
    fn test_log_file_appends() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("debug.log");
        std::fs::write(&log, "earlier run\n").unwrap();

        let diagnostics = Diagnostics::builder()
            .console_writer(CaptureWriter::new())
            .log_file(Some(&log))
            .build()
            .unwrap();
        diagnostics.in_scope(|| tracing::info!("later run"));

        let content = std::fs::read_to_string(&log).unwrap();
        assert!(content.starts_with("earlier run\n"));
        assert!(content.contains("INFO"));
        assert!(content.trim_end().ends_with("later run"));
    }
}
