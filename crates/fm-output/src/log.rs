//! `LogFileSink`: the human-readable, append-only fleet log.
//!
//! ```text
//! === Fleet Management System Log - 2024-05-01 09:14:03.512 ===
//! [09:14:05.031] Robot 1 spawned at vertex V0
//! [09:14:07.880] Assigning task to Robot 1: Move from V0 to V2
//! ```

use std::fs::{self, File};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Local;
use fm_fleet::{EventSink, FleetEvent};

use crate::{OutputError, OutputResult};

/// An [`EventSink`] writing one timestamped line per event.
///
/// Write errors cannot be returned from [`EventSink::record`], so the first
/// one is kept and can be collected with [`take_error`](Self::take_error).
pub struct LogFileSink {
    path:       PathBuf,
    file:       Mutex<LineWriter<File>>,
    last_error: Mutex<Option<OutputError>>,
}

impl LogFileSink {
    /// Create (or truncate) the log at `path` and write the session header.
    /// Missing parent directories are created.
    pub fn create(path: impl AsRef<Path>) -> OutputResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = LineWriter::new(File::create(&path)?);
        writeln!(
            file,
            "=== Fleet Management System Log - {} ===",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
        )?;
        Ok(Self {
            path,
            file: Mutex::new(file),
            last_error: Mutex::new(None),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `[HH:MM:SS.mmm] message`.
    pub fn log(&self, message: &str) -> OutputResult<()> {
        let stamp = Local::now().format("%H:%M:%S%.3f");
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(file, "[{stamp}] {message}")?;
        Ok(())
    }

    /// Take the stored write error, if any.
    pub fn take_error(&self) -> Option<OutputError> {
        self.last_error.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl EventSink for LogFileSink {
    fn record(&self, event: &FleetEvent) {
        if let Err(e) = self.log(&event.to_string()) {
            tracing::warn!(path = %self.path.display(), error = %e, "fleet log write failed");
            let mut slot = self.last_error.lock().unwrap_or_else(PoisonError::into_inner);
            // Keep only the first error.
            if slot.is_none() {
                *slot = Some(e);
            }
        }
    }
}
