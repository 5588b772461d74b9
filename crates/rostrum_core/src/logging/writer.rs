//! `flexi_logger` writers for the primary and diagnostic loggers.
//!
//! # Responsibility
//! - Primary: gate records by the runtime level, format them, and hand them
//!   to a background worker over a bounded queue.
//! - Diagnostic: write straight to stderr on the calling thread.
//!
//! # Invariants
//! - Flush and rename requests share the record queue, so they apply after
//!   every record enqueued before them.
//! - Enqueueing blocks while the queue is full.

use super::level::LogLevel;
use super::sink::TempFileSink;
use crate::error::{HostError, HostResult};
use crossbeam_channel::{bounded, Receiver, Sender};
use flexi_logger::writers::LogWriter;
use flexi_logger::{DeferredNow, TS_DASHES_BLANK_COLONS_DOT_BLANK};
use log::{LevelFilter, Record};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

const WORKER_THREAD_NAME: &str = "rostrum-log";

const GATE_LEVELS: [LogLevel; 6] = [
    LogLevel::Trace,
    LogLevel::Debug,
    LogLevel::Info,
    LogLevel::Warn,
    LogLevel::Err,
    LogLevel::Critical,
];

/// Runtime-adjustable level threshold.
struct LevelGate(AtomicUsize);

impl LevelGate {
    fn new(level: LogLevel) -> Self {
        Self(AtomicUsize::new(level as usize))
    }

    fn get(&self) -> LogLevel {
        GATE_LEVELS[self.0.load(Ordering::Relaxed)]
    }

    fn set(&self, level: LogLevel) {
        self.0.store(level as usize, Ordering::Relaxed);
    }

    fn allows(&self, record: &Record) -> bool {
        LogLevel::of_record(record) >= self.get()
    }
}

enum Command {
    Record(Vec<u8>),
    Flush(Sender<std::io::Result<()>>),
    Rename(PathBuf, Sender<std::io::Result<()>>),
    Shutdown,
}

/// Asynchronous writer feeding the deferred-naming sink.
#[derive(Clone)]
pub struct PrimaryWriter {
    inner: Arc<PrimaryInner>,
}

struct PrimaryInner {
    sender: Sender<Command>,
    gate: LevelGate,
    sink: Arc<TempFileSink>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PrimaryWriter {
    /// Starts the worker thread draining a queue of `capacity` commands.
    pub fn spawn(
        sink: Arc<TempFileSink>,
        level: LogLevel,
        capacity: usize,
        console: bool,
    ) -> std::io::Result<Self> {
        let (sender, receiver) = bounded(capacity.max(1));
        let worker_sink = Arc::clone(&sink);
        let worker = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || drain(receiver, worker_sink, console))?;

        Ok(Self {
            inner: Arc::new(PrimaryInner {
                sender,
                gate: LevelGate::new(level),
                sink,
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    pub fn level(&self) -> LogLevel {
        self.inner.gate.get()
    }

    pub fn set_level(&self, level: LogLevel) {
        self.inner.gate.set(level);
    }

    pub fn sink_path(&self) -> PathBuf {
        self.inner.sink.path()
    }

    /// Moves the log file to `target` once every queued record is written.
    pub fn rename(&self, target: &Path) -> HostResult<()> {
        let from = self.sink_path();
        let (ack, done) = bounded(1);
        let outcome = self
            .enqueue(Command::Rename(target.to_path_buf(), ack))
            .and_then(|()| done.recv().unwrap_or_else(|_| Err(worker_stopped())));
        outcome.map_err(|source| HostError::LogReroute {
            from,
            to: target.to_path_buf(),
            source,
        })
    }

    fn enqueue(&self, command: Command) -> std::io::Result<()> {
        self.inner
            .sender
            .send(command)
            .map_err(|_| worker_stopped())
    }
}

impl LogWriter for PrimaryWriter {
    fn write(&self, now: &mut DeferredNow, record: &Record) -> std::io::Result<()> {
        if !self.inner.gate.allows(record) {
            return Ok(());
        }
        self.enqueue(Command::Record(format_line(now, record).into_bytes()))
    }

    fn flush(&self) -> std::io::Result<()> {
        let (ack, done) = bounded(1);
        if self.enqueue(Command::Flush(ack)).is_err() {
            // Worker already shut down and flushed.
            return Ok(());
        }
        done.recv().unwrap_or(Ok(()))
    }

    fn max_log_level(&self) -> LevelFilter {
        LevelFilter::Trace
    }

    fn shutdown(&self) {
        let worker = self
            .inner
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            let _ = self.enqueue(Command::Shutdown);
            let _ = worker.join();
        }
    }
}

fn drain(receiver: Receiver<Command>, sink: Arc<TempFileSink>, console: bool) {
    for command in receiver.iter() {
        match command {
            Command::Record(line) => {
                if console {
                    let _ = std::io::stdout().write_all(&line);
                }
                if let Err(err) = sink.append(&line) {
                    eprintln!("rostrum: failed to write log record: {err}");
                }
            }
            Command::Flush(ack) => {
                if console {
                    let _ = std::io::stdout().flush();
                }
                let _ = ack.send(sink.flush());
            }
            Command::Rename(target, ack) => {
                let _ = ack.send(sink.rename(&target));
            }
            Command::Shutdown => break,
        }
    }
    let _ = sink.flush();
}

fn worker_stopped() -> std::io::Error {
    std::io::Error::new(ErrorKind::BrokenPipe, "log worker has stopped")
}

/// Synchronous stderr writer behind the `{diag}` target.
pub struct DiagnosticWriter {
    threshold: LogLevel,
}

impl DiagnosticWriter {
    pub fn new(threshold: LogLevel) -> Self {
        Self { threshold }
    }
}

impl LogWriter for DiagnosticWriter {
    fn write(&self, now: &mut DeferredNow, record: &Record) -> std::io::Result<()> {
        if LogLevel::of_record(record) < self.threshold {
            return Ok(());
        }
        let mut stderr = std::io::stderr().lock();
        stderr.write_all(format_line(now, record).as_bytes())
    }

    fn flush(&self) -> std::io::Result<()> {
        std::io::stderr().flush()
    }

    fn max_log_level(&self) -> LevelFilter {
        self.threshold.level_filter()
    }
}

/// `[<timestamp>] [<level>] <message>` followed by a newline.
pub fn format_line(now: &mut DeferredNow, record: &Record) -> String {
    format!(
        "[{}] [{}] {}\n",
        now.format(TS_DASHES_BLANK_COLONS_DOT_BLANK),
        record.level().as_str().to_ascii_lowercase(),
        record.args()
    )
}

#[cfg(test)]
mod tests {
    use super::{LevelGate, PrimaryWriter};
    use crate::error::HostError;
    use crate::logging::level::LogLevel;
    use crate::logging::{CRITICAL_TARGET, HOST_FATAL_TARGET};
    use crate::logging::sink::TempFileSink;
    use flexi_logger::writers::LogWriter;
    use flexi_logger::DeferredNow;
    use log::{Level, Record};
    use std::sync::Arc;

    fn gate_allows(gate: &LevelGate, level: Level, target: &str) -> bool {
        gate.allows(
            &Record::builder()
                .level(level)
                .target(target)
                .args(format_args!("record"))
                .build(),
        )
    }

    #[test]
    fn gate_follows_runtime_changes() {
        let gate = LevelGate::new(LogLevel::Info);
        assert!(!gate_allows(&gate, Level::Debug, "rostrum_core"));
        assert!(gate_allows(&gate, Level::Warn, "rostrum_core"));

        gate.set(LogLevel::Err);
        assert_eq!(gate.get(), LogLevel::Err);
        assert!(!gate_allows(&gate, Level::Warn, "rostrum_core"));
        assert!(gate_allows(&gate, Level::Error, "rostrum_core"));
    }

    #[test]
    fn critical_gate_admits_only_critical_records() {
        let gate = LevelGate::new(LogLevel::Critical);
        assert!(!gate_allows(&gate, Level::Error, "rostrum_core"));
        assert!(gate_allows(&gate, Level::Error, CRITICAL_TARGET));
        assert!(gate_allows(&gate, Level::Error, HOST_FATAL_TARGET));
    }

    #[test]
    fn critical_level_suppresses_err_records_in_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(TempFileSink::create_in(dir.path()).unwrap());
        let writer =
            PrimaryWriter::spawn(Arc::clone(&sink), LogLevel::Critical, 4, false).unwrap();

        let mut now = DeferredNow::new();
        writer
            .write(
                &mut now,
                &Record::builder()
                    .level(Level::Error)
                    .args(format_args!("plain err record"))
                    .build(),
            )
            .unwrap();
        writer
            .write(
                &mut now,
                &Record::builder()
                    .level(Level::Error)
                    .target(CRITICAL_TARGET)
                    .args(format_args!("critical record"))
                    .build(),
            )
            .unwrap();
        writer.flush().unwrap();
        writer.shutdown();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        assert!(!contents.contains("plain err record"));
        assert!(contents.contains("critical record"));
    }

    #[test]
    fn rename_failure_becomes_a_reroute_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(TempFileSink::create_in(dir.path()).unwrap());
        let temp_path = sink.path();
        let writer = PrimaryWriter::spawn(Arc::clone(&sink), LogLevel::Trace, 4, false).unwrap();

        let target = dir.path().join("missing").join("final.log");
        let err = writer.rename(&target).unwrap_err();
        match err {
            HostError::LogReroute { from, to, .. } => {
                assert_eq!(from, temp_path);
                assert_eq!(to, target);
            }
            other => panic!("unexpected error: {other}"),
        }
        writer.shutdown();
    }

    #[test]
    fn gated_records_never_reach_the_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(TempFileSink::create_in(dir.path()).unwrap());
        let writer = PrimaryWriter::spawn(Arc::clone(&sink), LogLevel::Warn, 4, false).unwrap();

        let mut now = DeferredNow::new();
        writer
            .write(
                &mut now,
                &Record::builder()
                    .level(Level::Info)
                    .args(format_args!("dropped"))
                    .build(),
            )
            .unwrap();
        writer
            .write(
                &mut now,
                &Record::builder()
                    .level(Level::Warn)
                    .args(format_args!("kept"))
                    .build(),
            )
            .unwrap();
        writer.flush().unwrap();
        writer.shutdown();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        assert!(!contents.contains("dropped"));
        assert!(contents.contains("[warn] kept"));
    }
}
