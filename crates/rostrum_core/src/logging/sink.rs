//! Deferred-naming file sink.
//!
//! # Responsibility
//! - Append formatted records to a private temp file until a final path is
//!   known, then move the file there and keep appending.
//!
//! # Invariants
//! - Append, flush and rename hold the same lock.
//! - A failed rename leaves the file open at its previous path; no written
//!   record is lost.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

const TEMP_FILE_PREFIX: &str = "rostrum-";
const TEMP_FILE_SUFFIX: &str = ".log";

pub struct TempFileSink {
    state: Mutex<SinkState>,
}

struct SinkState {
    path: PathBuf,
    /// `None` only when reopening after a rename failed.
    file: Option<BufWriter<File>>,
}

impl TempFileSink {
    /// Creates a fresh temp file in the OS temp directory.
    pub fn create() -> std::io::Result<Self> {
        Self::create_in(&std::env::temp_dir())
    }

    pub fn create_in(dir: &Path) -> std::io::Result<Self> {
        let path = dir.join(format!(
            "{TEMP_FILE_PREFIX}{}{TEMP_FILE_SUFFIX}",
            Uuid::new_v4()
        ));
        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            state: Mutex::new(SinkState {
                path,
                file: Some(BufWriter::new(file)),
            }),
        })
    }

    /// Current location of the log file.
    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    pub fn append(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut state = self.lock();
        state.writer()?.write_all(bytes)
    }

    pub fn flush(&self) -> std::io::Result<()> {
        let mut state = self.lock();
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    /// Flushes, closes and atomically renames the file to `target`, then
    /// reopens `target` for appending.
    ///
    /// On failure the file stays open at its previous path.
    pub fn rename(&self, target: &Path) -> std::io::Result<()> {
        let mut state = self.lock();
        let from = state.path.clone();

        if let Some(mut file) = state.file.take() {
            if let Err(err) = file.flush() {
                state.file = Some(file);
                return Err(err);
            }
        }

        if let Err(err) = std::fs::rename(&from, target) {
            state.file = open_append(&from).ok().map(BufWriter::new);
            return Err(err);
        }

        state.path = target.to_path_buf();
        state.file = Some(BufWriter::new(open_append(target)?));
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SinkState {
    fn writer(&mut self) -> std::io::Result<&mut BufWriter<File>> {
        let file = match self.file.take() {
            Some(file) => file,
            None => BufWriter::new(open_append(&self.path)?),
        };
        Ok(self.file.insert(file))
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
