//! Host logging bootstrap.
//!
//! # Responsibility
//! - Initialize the primary (asynchronous, deferred-naming file) logger and
//!   the diagnostic (synchronous stderr) logger exactly once per process.
//! - Expose the runtime controls scripts reach through the core table:
//!   level changes, log file rerouting, source-located records.
//!
//! # Invariants
//! - Logging init is idempotent for the same level.
//! - Logging initialization must not panic.
//! - The diagnostic logger is addressed with the [`DIAGNOSTIC_TARGET`] target;
//!   [`HOST_FATAL_TARGET`] reaches both loggers.
//! - `critical` is stricter than `err`: only records on [`CRITICAL_TARGET`] or
//!   [`HOST_FATAL_TARGET`] pass a critical threshold.

mod level;
mod sink;
mod writer;

pub use level::{supported_log_level_strings, LogLevel};
pub use sink::TempFileSink;
pub use writer::{format_line, DiagnosticWriter, PrimaryWriter};

use crate::config::LoggingConfig;
use crate::error::{HostError, HostResult};
use flexi_logger::{Logger, LoggerHandle};
use log::{error, info, log};
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the additional `flexi_logger` writer backing the diagnostic logger.
pub const DIAGNOSTIC_WRITER: &str = "diag";
/// `log` target routing a record to the diagnostic logger only.
pub const DIAGNOSTIC_TARGET: &str = "{diag}";
/// `log` target routing a record to both loggers; records on it are critical.
pub const HOST_FATAL_TARGET: &str = "{_Default,diag}";
/// `log` target marking a primary-logger record as critical.
pub const CRITICAL_TARGET: &str = "rostrum::critical";

const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct LoggingState {
    initial_level: LogLevel,
    primary: PrimaryWriter,
    logger: LoggerHandle,
}

/// Initializes host logging with `config`.
///
/// Returns `Ok(())` when logging is active, or a human-readable error string
/// when initialization fails.
///
/// # Invariants
/// - Calling this function repeatedly with the same level is idempotent.
/// - Re-initialization with a different level is rejected; use
///   [`set_log_level`] instead.
/// - Initialization never panics.
pub fn init_logging(config: &LoggingConfig) -> Result<(), String> {
    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, String> {
        let sink = match &config.temp_dir {
            Some(dir) => TempFileSink::create_in(dir),
            None => TempFileSink::create(),
        }
        .map_err(|err| format!("cannot create temp file for logger sink: {err}"))?;
        let sink = Arc::new(sink);

        let primary = PrimaryWriter::spawn(
            Arc::clone(&sink),
            config.level,
            config.queue_capacity,
            config.console,
        )
        .map_err(|err| format!("failed to start log worker: {err}"))?;

        let logger = Logger::try_with_str("trace")
            .map_err(|err| format!("invalid log specification: {err}"))?
            .log_to_writer(Box::new(primary.clone()))
            .add_writer(
                DIAGNOSTIC_WRITER,
                Box::new(DiagnosticWriter::new(config.diagnostic_level)),
            )
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;

        install_panic_hook_once();

        info!(
            "event=host_start module=logging status=ok platform={} build_mode={} version={}",
            std::env::consts::OS,
            build_mode(),
            env!("CARGO_PKG_VERSION")
        );
        info!(
            "event=logging_init module=logging status=ok level={} temp_file={}",
            config.level,
            sink.path().display()
        );

        Ok(LoggingState {
            initial_level: config.level,
            primary,
            logger,
        })
    })?;

    if state.initial_level != config.level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.initial_level, config.level
        ));
    }
    Ok(())
}

/// Returns `(current level, current log file)` once logging is active.
pub fn logging_status() -> Option<(LogLevel, PathBuf)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.primary.level(), state.primary.sink_path()))
}

/// Changes the primary logger's level from one of the exact level names.
///
/// # Errors
/// - [`HostError::UnsupportedLogLevel`] for any other input.
/// - [`HostError::LoggingNotInitialized`] before [`init_logging`].
pub fn set_log_level(level: &str) -> HostResult<LogLevel> {
    let parsed = LogLevel::parse(level)?;
    let state = LOGGING_STATE
        .get()
        .ok_or(HostError::LoggingNotInitialized)?;
    state.primary.set_level(parsed);
    info!("event=log_level_change module=logging status=ok level={parsed}");
    Ok(parsed)
}

/// Moves the primary log file from its temp location to `path`.
pub fn reroute_log(path: &Path) -> HostResult<()> {
    let state = LOGGING_STATE
        .get()
        .ok_or(HostError::LoggingNotInitialized)?;
    let from = state.primary.sink_path();
    match state.primary.rename(path) {
        Ok(()) => {
            info!(
                "event=log_reroute module=logging status=ok from={} to={}",
                from.display(),
                path.display()
            );
            Ok(())
        }
        Err(err) => {
            error!("event=log_reroute module=logging status=error error={err}");
            Err(err)
        }
    }
}

/// Blocks until every queued record is written.
pub fn flush_logging() {
    if let Some(state) = LOGGING_STATE.get() {
        state.logger.flush();
    }
}

/// Flushes and stops the log worker. Records logged afterwards are dropped.
pub fn shutdown_logging() {
    if let Some(state) = LOGGING_STATE.get() {
        state.logger.shutdown();
    }
}

/// Caller position reported by the interpreter for script log records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Short chunk name, e.g. `main.lua`.
    pub file: String,
    /// Enclosing function; `None` for the main chunk or anonymous functions.
    pub function: Option<String>,
    pub line: i32,
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file,
            self.function.as_deref().unwrap_or("?"),
            self.line
        )
    }
}

/// Emits `message` on the primary logger prefixed with `[location]`.
pub fn log_with_location(level: LogLevel, location: &SourceLocation, message: &str) {
    if level == LogLevel::Critical {
        log!(
            target: CRITICAL_TARGET,
            level.record_level(),
            "[{location}] severity=critical {message}"
        );
    } else {
        log!(level.record_level(), "[{location}] {message}");
    }
}

fn build_mode() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.get().is_some() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_summary(panic_info);
        error!(
            target: HOST_FATAL_TARGET,
            "event=panic_captured module=logging status=error location={} payload={}",
            location,
            payload
        );
        previous_hook(panic_info);
    }));

    let _ = PANIC_HOOK_INSTALLED.set(());
}

fn panic_payload_summary(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = if let Some(message) = info.payload().downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };

    sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
}

/// Flattens newlines and caps `value` at `max_chars` characters.
pub(crate) fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
