//! JSONL activity log: append-only line-delimited JSON, one line per run phase.
//!
//! Each line is a self-contained JSON object written with a single `write_all`
//! so a tailing process never sees a partial line. When the log file cannot be
//! opened or written, lines go to stderr with a `[FF-JSONL]` prefix; if stderr
//! fails too they are dropped. Logging never aborts a selection.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{FitError, Result};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Log event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SizingComplete,
    SelectionComplete,
    SelectionInfeasible,
    Error,
}

/// A single JSONL log entry; all fields optional except `ts`, `event`, `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// Number of sources or selected items, depending on the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<usize>,
    /// Target capacity in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u64>,
    /// Total bytes of the items this event is about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,
    /// Unused capacity after selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_bytes: Option<u64>,
    /// Quantization divisor used by the selector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divisor: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    /// FF error code if the run failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Freeform details.
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
            item_count: None,
            capacity: None,
            total_bytes: None,
            free_bytes: None,
            divisor: None,
            duration_ms: None,
            config_hash: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }

    /// Entry describing a failed run.
    pub fn from_error(error: &FitError) -> Self {
        let mut entry = Self::new(EventType::Error, Severity::Critical);
        entry.error_code = Some(error.code().to_string());
        entry.error_message = Some(error.to_string());
        entry
    }
}

/// Configuration for the JSONL writer.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    /// Log file path.
    pub path: PathBuf,
    /// Maximum file size before rotation (bytes). Default: 10 MiB.
    pub max_size_bytes: u64,
    /// Number of rotated files to keep. Default: 3.
    pub max_rotated_files: u32,
}

impl JsonlConfig {
    /// Defaults for a given log path.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

/// Where log lines currently go.
enum Sink {
    File {
        writer: BufWriter<File>,
        bytes_written: u64,
    },
    Stderr,
    Discard,
}

/// Append-only JSONL log writer with size-based rotation.
pub struct JsonlWriter {
    config: JsonlConfig,
    sink: Sink,
}

impl JsonlWriter {
    /// Open the log file, or start on stderr if it cannot be opened.
    pub fn open(config: JsonlConfig) -> Self {
        let sink = match open_append(&config.path) {
            Ok(sink) => sink,
            Err(e) => {
                let _ = writeln!(io::stderr(), "[FF-JSONL] {e}; logging to stderr");
                Sink::Stderr
            }
        };
        Self { config, sink }
    }

    /// Write a single log entry as one JSONL line.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[FF-JSONL] serialize error: {e}");
                return;
            }
        };

        self.write_line(&line);
    }

    /// Flush buffers.
    pub fn flush(&mut self) {
        if let Sink::File { writer, .. } = &mut self.sink {
            let _ = writer.flush();
        }
    }

    /// Current sink: `"file"`, `"stderr"`, or `"discard"`.
    pub fn state(&self) -> &'static str {
        match self.sink {
            Sink::File { .. } => "file",
            Sink::Stderr => "stderr",
            Sink::Discard => "discard",
        }
    }

    /// Size of the current log file, including what this writer appended.
    pub fn bytes_written(&self) -> u64 {
        match self.sink {
            Sink::File { bytes_written, .. } => bytes_written,
            Sink::Stderr | Sink::Discard => 0,
        }
    }

    // ──────────────────────── internals ────────────────────────

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        if let Sink::File { bytes_written, .. } = self.sink
            && bytes_written + len > self.config.max_size_bytes
        {
            self.rotate();
        }

        match &mut self.sink {
            Sink::File {
                writer,
                bytes_written,
            } => {
                if let Err(e) = writer.write_all(line.as_bytes()) {
                    let _ = writeln!(
                        io::stderr(),
                        "[FF-JSONL] write to {} failed: {e}; logging to stderr",
                        self.config.path.display()
                    );
                    self.sink = Sink::Stderr;
                    self.write_line(line);
                } else {
                    *bytes_written += len;
                }
            }
            Sink::Stderr => {
                if write!(io::stderr(), "[FF-JSONL] {line}").is_err() {
                    self.sink = Sink::Discard;
                }
            }
            Sink::Discard => {}
        }
    }

    fn rotate(&mut self) {
        self.flush();
        // Close the current handle before renaming underneath it.
        self.sink = Sink::Discard;

        let base = &self.config.path;
        let keep = self.config.max_rotated_files;
        let _ = fs::remove_file(rotated_name(base, keep));
        for i in (1..keep).rev() {
            let _ = fs::rename(rotated_name(base, i), rotated_name(base, i + 1));
        }
        let _ = fs::rename(base, rotated_name(base, 1));

        self.sink = match open_append(base) {
            Ok(sink) => sink,
            Err(e) => {
                let _ = writeln!(io::stderr(), "[FF-JSONL] reopen after rotation: {e}");
                Sink::Stderr
            }
        };
    }
}

// ──────────────────────── helpers ────────────────────────

/// Open or create `path` for appending, creating parent directories.
fn open_append(path: &Path) -> Result<Sink> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| FitError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| FitError::io(path, source))?;
    let bytes_written = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok(Sink::File {
        writer: BufWriter::new(file),
        bytes_written,
    })
}

/// Build a rotated filename: `foo.jsonl` → `foo.jsonl.3`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

/// Format current UTC time as ISO 8601.
fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ──────────────────────── tests ────────────────────────
