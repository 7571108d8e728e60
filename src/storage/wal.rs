//! Write-ahead log and snapshot files.
//!
//! The WAL provides durability by:
//! 1. Appending every mutation to a text log before it hits memory
//! 2. Flushing (and optionally fsyncing) each record
//! 3. Replaying snapshot then log on startup
//!
//! Durability failures are never fatal. A WAL that cannot open or write
//! warns on stderr, flips itself off, and the store continues in memory.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{ChronoError, ChronoResult};
use crate::time::epoch_ms;

use super::record::check_token;

/// Snapshot file name, placed next to the WAL.
const SNAPSHOT_FILE: &str = "snapshot.db";

/// Configuration for the write-ahead log.
#[derive(Debug, Clone)]
pub struct WalConfig {
    /// Whether to fsync after every record (slower but safer).
    pub sync_on_write: bool,
}

impl Default for WalConfig {
    fn default() -> Self {
        Self {
            sync_on_write: true,
        }
    }
}

/// Append-only mutation log with a snapshot-based compaction path.
pub struct Wal {
    wal_path: PathBuf,
    snapshot_path: PathBuf,
    writer: Option<BufWriter<File>>,
    enabled: bool,
    sync_on_write: bool,
}

impl Wal {
    /// Creates a WAL handle for the given log path.
    ///
    /// The snapshot lives at `snapshot.db` in the same directory. The handle
    /// is inert until [`initialize`](Self::initialize) succeeds.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, config: WalConfig) -> Self {
        let wal_path = path.into();
        let snapshot_path = match wal_path.parent() {
            Some(dir) if dir != Path::new("") => dir.join(SNAPSHOT_FILE),
            _ => PathBuf::from(SNAPSHOT_FILE),
        };
        Self {
            wal_path,
            snapshot_path,
            writer: None,
            enabled: false,
            sync_on_write: config.sync_on_write,
        }
    }

    /// Creates the log directory and opens the log for appending.
    ///
    /// # Errors
    ///
    /// Returns `Durability` when the directory or file cannot be opened. The
    /// handle stays disabled in that case; callers may ignore the error and
    /// run non-durably.
    pub fn initialize(&mut self) -> ChronoResult<()> {
        if let Some(dir) = self.wal_path.parent() {
            if dir != Path::new("") {
                if let Err(e) = fs::create_dir_all(dir) {
                    eprintln!("WAL: failed to create directory {}: {e}", dir.display());
                    self.enabled = false;
                    return Err(ChronoError::durability(format!(
                        "failed to create WAL directory {}: {e}",
                        dir.display()
                    )));
                }
            }
        }

        match OpenOptions::new().create(true).append(true).open(&self.wal_path) {
            Ok(file) => {
                self.writer = Some(BufWriter::new(file));
                self.enabled = true;
                Ok(())
            }
            Err(e) => {
                eprintln!(
                    "WAL: failed to open {} ({e}); continuing without durability",
                    self.wal_path.display()
                );
                self.enabled = false;
                Err(ChronoError::durability(format!(
                    "failed to open WAL {}: {e}",
                    self.wal_path.display()
                )))
            }
        }
    }

    /// Returns true if the log is open and accepting records.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.wal_path
    }

    /// The snapshot file path.
    #[must_use]
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Appends a `SET` record.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when key or value contain whitespace (the encoding
    /// cannot represent them); `Durability` when the log is disabled or the
    /// write fails. Both are non-fatal to the in-memory write.
    pub fn log_set(
        &mut self,
        key: &str,
        value: &str,
        timestamp: DateTime<Utc>,
    ) -> ChronoResult<()> {
        check_token("key", key)?;
        check_token("value", value)?;
        self.append_line(&format!("SET {key} {value} {}", epoch_ms(timestamp)))
    }

    /// Appends a `DEL` record.
    ///
    /// # Errors
    ///
    /// Same contract as [`log_set`](Self::log_set).
    pub fn log_del(&mut self, key: &str) -> ChronoResult<()> {
        check_token("key", key)?;
        self.append_line(&format!("DEL {key}"))
    }

    /// Appends a `POLICY SET` record.
    ///
    /// # Errors
    ///
    /// `Durability` when the log is disabled or the write fails.
    pub fn log_policy(&mut self, policy_name: &str) -> ChronoResult<()> {
        self.append_line(&format!("POLICY SET {policy_name}"))
    }

    /// Appends a `GUARD ADD` record. Reserved: replay currently skips these.
    ///
    /// # Errors
    ///
    /// Same contract as [`log_set`](Self::log_set).
    pub fn log_guard_add(
        &mut self,
        guard_type: &str,
        name: &str,
        pattern: &str,
        params: &str,
    ) -> ChronoResult<()> {
        check_token("guard name", name)?;
        check_token("guard pattern", pattern)?;
        self.append_line(&format!("GUARD ADD {guard_type} {name} {pattern} {params}"))
    }

    /// Reads all raw log lines, skipping empty ones.
    ///
    /// A missing file is a fresh start, not an error. Read failures warn and
    /// yield whatever was read.
    #[must_use]
    pub fn read_log(&self) -> Vec<String> {
        Self::read_lines(&self.wal_path)
    }

    /// Reads all raw snapshot lines, skipping empty ones.
    #[must_use]
    pub fn read_snapshot(&self) -> Vec<String> {
        Self::read_lines(&self.snapshot_path)
    }

    /// Writes a snapshot of `latest` and truncates the log.
    ///
    /// The snapshot is `POLICY SET <name>` (omitted when `policy_name` is
    /// empty) followed by one `SET k v` per entry. Write-then-truncate is
    /// not crash-atomic: a crash between the two replays snapshot plus the
    /// stale log, appending duplicate versions. Treat this as best-effort
    /// compaction.
    ///
    /// # Errors
    ///
    /// Returns `Durability` when the snapshot cannot be written (the log is
    /// left untouched) or when the log cannot be truncated afterwards.
    pub fn create_snapshot(
        &mut self,
        latest: &BTreeMap<String, String>,
        policy_name: &str,
    ) -> ChronoResult<()> {
        let result = (|| -> std::io::Result<()> {
            let file = File::create(&self.snapshot_path)?;
            let mut writer = BufWriter::new(file);
            if !policy_name.is_empty() {
                writeln!(writer, "POLICY SET {policy_name}")?;
            }
            for (key, value) in latest {
                writeln!(writer, "SET {key} {value}")?;
            }
            writer.flush()?;
            if self.sync_on_write {
                writer.get_ref().sync_all()?;
            }
            Ok(())
        })();

        if let Err(e) = result {
            eprintln!(
                "WAL: failed to write snapshot {}: {e}",
                self.snapshot_path.display()
            );
            return Err(ChronoError::durability(format!(
                "failed to write snapshot: {e}"
            )));
        }

        self.clear_log()
    }

    /// Flushes buffered records to the OS.
    pub fn flush(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.flush() {
                eprintln!("WAL: flush failed: {e}");
            }
        }
    }

    fn append_line(&mut self, line: &str) -> ChronoResult<()> {
        if !self.enabled {
            return Err(ChronoError::durability("WAL is disabled"));
        }
        let sync = self.sync_on_write;
        let Some(writer) = self.writer.as_mut() else {
            return Err(ChronoError::durability("WAL is not open"));
        };

        write_record(writer, line, sync).map_err(|e| {
            eprintln!("WAL: failed to append record: {e}");
            ChronoError::durability(format!("failed to append record: {e}"))
        })
    }

    fn read_lines(path: &Path) -> Vec<String> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                eprintln!("WAL: failed to open {} for reading: {e}", path.display());
                return Vec::new();
            }
        };

        let mut lines = Vec::new();
        for line in BufReader::new(file).lines() {
            match line {
                Ok(line) if line.is_empty() => {}
                Ok(line) => lines.push(line),
                Err(e) => {
                    eprintln!("WAL: error reading {}: {e}", path.display());
                    break;
                }
            }
        }
        lines
    }

    /// Truncates the log and reopens it for appending.
    fn clear_log(&mut self) -> ChronoResult<()> {
        // Drop the writer first so the handle is released before truncation.
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }

        let truncate = File::create(&self.wal_path);
        if let Err(e) = truncate {
            eprintln!("WAL: failed to truncate {}: {e}", self.wal_path.display());
            self.enabled = false;
            return Err(ChronoError::durability(format!(
                "failed to truncate WAL: {e}"
            )));
        }
        drop(truncate);

        match OpenOptions::new().append(true).open(&self.wal_path) {
            Ok(file) => {
                self.writer = Some(BufWriter::new(file));
                Ok(())
            }
            Err(e) => {
                eprintln!(
                    "WAL: failed to reopen {} after truncation: {e}",
                    self.wal_path.display()
                );
                self.enabled = false;
                Err(ChronoError::durability(format!(
                    "failed to reopen WAL after truncation: {e}"
                )))
            }
        }
    }
}

impl Drop for Wal {
    fn drop(&mut self) {
        self.flush();
    }
}

fn write_record(writer: &mut BufWriter<File>, line: &str, sync: bool) -> std::io::Result<()> {
    writeln!(writer, "{line}")?;
    writer.flush()?;
    if sync {
        writer.get_ref().sync_all()?;
    }
    Ok(())
}
