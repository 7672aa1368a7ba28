//! JSONL activity log: one self-contained JSON object per line, appended
//! after every mutating command.
//!
//! Lines are assembled in memory and written with a single `write_all` so a
//! concurrent `tail -f` never sees a partial line.
//!
//! Degradation chain:
//! 1. Configured log file
//! 2. stderr with `[DPM-JSONL]` prefix
//! 3. Silent discard (a command never fails because of logging)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::core::errors::{DpmError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

/// What a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Copy,
    Move,
    Remove,
    Template,
    Position,
    Import,
    Export,
    Backup,
    Restore,
    Edit,
    Error,
}

/// A single activity record. Only `ts`, `event` and `severity` are always
/// present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// Virtual path or file the command read from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Virtual path or file the command wrote to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// Documents transferred by a bulk command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    /// `DPM-NNNN` code of a failed command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            source: None,
            destination: None,
            position: None,
            count: None,
            duration_ms: None,
            ok: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }

    /// Successful command, timed from `started`.
    pub fn done(event: EventType, started: Instant) -> Self {
        let mut entry = Self::new(event, Severity::Info);
        entry.ok = Some(true);
        entry.duration_ms = Some(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));
        entry
    }

    /// Failed command.
    pub fn failure(error: &DpmError) -> Self {
        let mut entry = Self::new(EventType::Error, Severity::Error);
        entry.ok = Some(false);
        entry.error_code = Some(error.code().to_string());
        entry.error_message = Some(error.to_string());
        entry
    }

    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    #[must_use]
    pub fn position(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }

    #[must_use]
    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Stderr,
    Discard,
}

#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    /// Rotate once the file would grow past this size.
    pub max_size_bytes: u64,
    /// Number of rotated files to keep.
    pub max_rotated_files: u32,
}

impl JsonlConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            path: config.activity_log_path(),
            max_size_bytes: config.log.max_size_bytes,
            max_rotated_files: config.log.max_rotated_files,
        }
    }
}

/// Append-only JSONL writer with size-based rotation.
#[derive(Debug)]
pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the log file, falling through the degradation chain on failure.
    pub fn open(config: JsonlConfig) -> Self {
        let mut w = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        match open_append(&w.config.path) {
            Ok((file, size)) => {
                w.writer = Some(BufWriter::new(file));
                w.state = WriterState::Normal;
                w.bytes_written = size;
            }
            Err(e) => {
                let _ = writeln!(io::stderr(), "[DPM-JSONL] {e}; logging to stderr");
                w.state = WriterState::Stderr;
            }
        }
        w
    }

    /// Writer that drops everything, for read-only commands.
    pub fn disabled(config: JsonlConfig) -> Self {
        Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        }
    }

    pub fn write_entry(&mut self, entry: &LogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[DPM-JSONL] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    pub fn state(&self) -> &str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    fn write_line(&mut self, line: &str) {
        if self.state == WriterState::Normal
            && self.bytes_written + line.len() as u64 > self.config.max_size_bytes
        {
            self.rotate();
        }

        match self.state {
            WriterState::Normal => {
                let written = self
                    .writer
                    .as_mut()
                    .is_some_and(|w| w.write_all(line.as_bytes()).is_ok());
                if written {
                    self.bytes_written += line.len() as u64;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[DPM-JSONL] {line}").is_err() {
                    self.degrade();
                }
            }
            WriterState::Discard => {}
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        self.state = match self.state {
            WriterState::Normal => {
                let _ = writeln!(io::stderr(), "[DPM-JSONL] log write failed, using stderr");
                WriterState::Stderr
            }
            WriterState::Stderr | WriterState::Discard => WriterState::Discard,
        };
    }

    /// `activity.jsonl` → `.1` → `.2` ...; the oldest beyond the limit is
    /// deleted.
    fn rotate(&mut self) {
        self.flush();
        self.writer = None;
        let base = self.config.path.clone();

        let _ = fs::remove_file(rotated_name(&base, self.config.max_rotated_files));
        for i in (1..self.config.max_rotated_files).rev() {
            let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
        }
        if self.config.max_rotated_files > 0 {
            let _ = rename(&base, rotated_name(&base, 1));
        } else {
            let _ = fs::remove_file(&base);
        }

        match open_append(&base) {
            Ok((file, _)) => {
                self.writer = Some(BufWriter::new(file));
                self.bytes_written = 0;
            }
            Err(_) => self.degrade(),
        }
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| DpmError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| DpmError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

pub fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
