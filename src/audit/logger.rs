//! Audit logger for append-only audit log
//!
//! Each entry is written as a single JSON line and flushed immediately.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{SealboxError, SealboxResult};

use super::entry::AuditEntry;

/// Handles writing audit entries to the audit log file
///
/// The log file uses a line-delimited JSON format (JSONL) where each line
/// is a complete JSON object representing one audit entry.
pub struct AuditLogger {
    log_path: PathBuf,
    append: Mutex<()>,
}

impl AuditLogger {
    /// Create a new AuditLogger that writes to the specified path
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            log_path,
            append: Mutex::new(()),
        }
    }

    /// Append an entry and flush it
    pub fn log(&self, entry: &AuditEntry) -> SealboxResult<()> {
        let json = serde_json::to_string(entry)
            .map_err(|e| SealboxError::Json(format!("Failed to serialize audit entry: {}", e)))?;

        let _guard = self
            .append
            .lock()
            .map_err(|e| SealboxError::Io(format!("Failed to acquire audit lock: {}", e)))?;

        if let Some(parent) = self.log_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    SealboxError::Io(format!("Failed to create audit log directory: {}", e))
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| SealboxError::Io(format!("Failed to open audit log: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| SealboxError::Io(format!("Failed to write audit entry: {}", e)))?;

        file.flush()
            .map_err(|e| SealboxError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// Read all audit entries from the log file
    ///
    /// Returns entries in chronological order (oldest first).
    pub fn read_all(&self) -> SealboxResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| SealboxError::Io(format!("Failed to open audit log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                SealboxError::Io(format!("Failed to read audit log line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: AuditEntry = serde_json::from_str(&line).map_err(|e| {
                SealboxError::Json(format!(
                    "Failed to parse audit entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            entries.push(entry);
        }

        Ok(entries)
    }

    /// Read the most recent N entries from the log
    pub fn read_recent(&self, count: usize) -> SealboxResult<Vec<AuditEntry>> {
        let mut all_entries = self.read_all()?;
        let start = all_entries.len().saturating_sub(count);
        Ok(all_entries.split_off(start))
    }

    /// Get the number of entries in the audit log
    pub fn entry_count(&self) -> SealboxResult<usize> {
        Ok(self.read_all()?.len())
    }

    /// Check if the audit log file exists
    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    /// Get the path to the audit log file
    pub fn path(&self) -> &Path {
        &self.log_path
    }
}
