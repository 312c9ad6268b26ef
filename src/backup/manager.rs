//! Backup manager for Sealbox
//!
//! Backups are the previous primary files, renamed in place to
//! `<data_file>.<YYYYMMDD_HHMMSS>.backup`. A second backup within the same
//! second gets a sequence suffix (`..._001.backup`) so names stay unique and
//! sort in creation order.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::paths::{SealboxPaths, BACKUP_SUFFIX};
use crate::error::{SealboxError, SealboxResult};

/// Timestamp format embedded in backup names
pub const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const STAMP_LEN: usize = 15;

/// Metadata about a backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupInfo {
    /// Backup filename
    pub filename: String,
    /// Full path to backup
    pub path: PathBuf,
    /// When the backup was taken (local time, from the name)
    pub created_at: NaiveDateTime,
    /// Position among backups taken in the same second
    pub sequence: u32,
    /// Size in bytes
    pub size_bytes: u64,
}

impl BackupInfo {
    fn order_key(&self) -> (NaiveDateTime, u32) {
        (self.created_at, self.sequence)
    }
}

/// Manages backup naming, listing and retention
#[derive(Debug, Clone)]
pub struct BackupManager {
    paths: SealboxPaths,
    retention: usize,
}

impl BackupManager {
    /// Create a new BackupManager
    pub fn new(paths: SealboxPaths, retention: usize) -> Self {
        Self {
            paths,
            retention: retention.max(1),
        }
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// List all backups, newest first
    pub fn list_backups(&self) -> SealboxResult<Vec<BackupInfo>> {
        let dir = self.paths.data_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|e| {
            SealboxError::Persistence(format!(
                "Failed to read backup directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SealboxError::Persistence(format!("Failed to read directory entry: {}", e))
            })?;

            if let Some(info) = self.parse_backup_info(&entry.path()) {
                backups.push(info);
            }
        }

        backups.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
        Ok(backups)
    }

    /// Parse backup info from a path, if it names one of our backups
    fn parse_backup_info(&self, path: &Path) -> Option<BackupInfo> {
        let filename = path.file_name()?.to_string_lossy().to_string();
        let prefix = self.paths.backup_prefix();
        let stamp = filename.strip_prefix(&prefix)?.strip_suffix(BACKUP_SUFFIX)?;
        let (created_at, sequence) = parse_stamp(stamp)?;

        let metadata = fs::metadata(path).ok()?;
        if !metadata.is_file() {
            return None;
        }

        Some(BackupInfo {
            filename,
            path: path.to_path_buf(),
            created_at,
            sequence,
            size_bytes: metadata.len(),
        })
    }

    /// Get the most recent backup
    pub fn latest(&self) -> SealboxResult<Option<BackupInfo>> {
        Ok(self.list_backups()?.into_iter().next())
    }

    /// Find a backup by file name (or `latest`)
    pub fn find(&self, name: &str) -> SealboxResult<BackupInfo> {
        if name.eq_ignore_ascii_case("latest") {
            return self
                .latest()?
                .ok_or_else(|| SealboxError::backup_not_found(name));
        }

        self.list_backups()?
            .into_iter()
            .find(|b| b.filename == name || b.path == Path::new(name))
            .ok_or_else(|| SealboxError::backup_not_found(name))
    }

    /// Path for a new backup taken at `now`
    ///
    /// The result always sorts after every existing backup, even when the
    /// clock has not advanced (or went backwards) since the last one.
    pub fn next_backup_path(&self, now: NaiveDateTime) -> SealboxResult<PathBuf> {
        let now = truncate_to_second(now);
        let (stamp_time, sequence) = match self.latest()? {
            Some(latest) if latest.created_at >= now => (latest.created_at, latest.sequence + 1),
            _ => (now, 0),
        };

        Ok(self.paths.backup_file(&format_stamp(stamp_time, sequence)))
    }

    /// Rename the current primary file into a new backup
    ///
    /// Returns `None` when there is no primary file yet.
    pub fn rotate_primary(&self) -> SealboxResult<Option<PathBuf>> {
        let primary = self.paths.data_file();
        if !primary.exists() {
            return Ok(None);
        }

        let backup_path = self.next_backup_path(Local::now().naive_local())?;
        fs::rename(primary, &backup_path).map_err(|e| {
            SealboxError::Persistence(format!(
                "Failed to create backup {}: {}",
                backup_path.display(),
                e
            ))
        })?;

        debug!(backup = %backup_path.display(), "Primary rotated into backup");
        Ok(Some(backup_path))
    }

    /// Delete all but the newest `retention` backups
    pub fn enforce_retention(&self) -> SealboxResult<Vec<PathBuf>> {
        let backups = self.list_backups()?;
        let mut deleted = Vec::new();

        for backup in backups.into_iter().skip(self.retention) {
            fs::remove_file(&backup.path).map_err(|e| {
                SealboxError::Persistence(format!(
                    "Failed to delete old backup {}: {}",
                    backup.filename, e
                ))
            })?;
            info!(backup = %backup.filename, "Pruned old backup");
            deleted.push(backup.path);
        }

        Ok(deleted)
    }
}

fn truncate_to_second(t: NaiveDateTime) -> NaiveDateTime {
    t.with_nanosecond(0).unwrap_or(t)
}

/// Build the stamp part of a backup name
fn format_stamp(time: NaiveDateTime, sequence: u32) -> String {
    let base = time.format(BACKUP_STAMP_FORMAT).to_string();
    if sequence == 0 {
        base
    } else {
        format!("{}_{:03}", base, sequence)
    }
}

/// Parse `YYYYMMDD_HHMMSS` or `YYYYMMDD_HHMMSS_NNN`
fn parse_stamp(stamp: &str) -> Option<(NaiveDateTime, u32)> {
    let time_part = stamp.get(..STAMP_LEN)?;
    let created_at = NaiveDateTime::parse_from_str(time_part, BACKUP_STAMP_FORMAT).ok()?;

    let rest = stamp.get(STAMP_LEN..)?;
    let sequence = if rest.is_empty() {
        0
    } else {
        let digits = rest.strip_prefix('_')?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()?
    };

    Some((created_at, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 19)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn setup() -> (TempDir, BackupManager) {
        let temp_dir = TempDir::new().unwrap();
        let paths = SealboxPaths::new(temp_dir.path().join("data.json"));
        (temp_dir, BackupManager::new(paths, 5))
    }

    #[test]
    fn test_parse_stamp() {
        assert_eq!(parse_stamp("20240319_101500"), Some((at(10, 15, 0), 0)));
        assert_eq!(parse_stamp("20240319_101500_007"), Some((at(10, 15, 0), 7)));
        assert_eq!(parse_stamp("20240319_1015"), None);
        assert_eq!(parse_stamp("20240319_101500_"), None);
        assert_eq!(parse_stamp("20240319_101500-1"), None);
        assert_eq!(parse_stamp("garbage"), None);
    }

    #[test]
    fn test_stamps_sort_lexicographically() {
        let a = format_stamp(at(10, 15, 0), 0);
        let b = format_stamp(at(10, 15, 0), 1);
        let c = format_stamp(at(10, 15, 1), 0);
        let name = |s: &str| format!("data.json.{}.backup", s);
        assert!(name(&a) < name(&b));
        assert!(name(&b) < name(&c));
    }

    #[test]
    fn test_next_backup_path_same_second() {
        let (temp_dir, manager) = setup();

        let first = manager.next_backup_path(at(10, 15, 0)).unwrap();
        assert_eq!(first, temp_dir.path().join("data.json.20240319_101500.backup"));
        fs::write(&first, "{}").unwrap();

        let second = manager.next_backup_path(at(10, 15, 0)).unwrap();
        assert_eq!(
            second,
            temp_dir.path().join("data.json.20240319_101500_001.backup")
        );
        fs::write(&second, "{}").unwrap();

        // Clock went backwards: still sorts after the newest
        let third = manager.next_backup_path(at(10, 14, 0)).unwrap();
        assert_eq!(
            third,
            temp_dir.path().join("data.json.20240319_101500_002.backup")
        );

        let later = manager.next_backup_path(at(10, 16, 0)).unwrap();
        assert_eq!(later, temp_dir.path().join("data.json.20240319_101600.backup"));
    }

    #[test]
    fn test_list_ignores_unrelated_files() {
        let (temp_dir, manager) = setup();
        let dir = temp_dir.path();

        fs::write(dir.join("data.json"), "{}").unwrap();
        fs::write(dir.join("data.json.20240319_101500.backup"), "{}").unwrap();
        fs::write(dir.join("other.json.20240319_101500.backup"), "{}").unwrap();
        fs::write(dir.join("data.json.notastamp.backup"), "{}").unwrap();
        fs::write(dir.join("data.json.audit.log"), "").unwrap();

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].filename, "data.json.20240319_101500.backup");
        assert_eq!(backups[0].size_bytes, 2);
    }

    #[test]
    fn test_rotate_primary() {
        let (temp_dir, manager) = setup();
        assert_eq!(manager.rotate_primary().unwrap(), None);

        let primary = temp_dir.path().join("data.json");
        fs::write(&primary, "{}").unwrap();

        let backup = manager.rotate_primary().unwrap().unwrap();
        assert!(!primary.exists());
        assert!(backup.exists());
        assert_eq!(manager.list_backups().unwrap().len(), 1);
    }

    #[test]
    fn test_enforce_retention_keeps_newest() {
        let (temp_dir, manager) = setup();
        for minute in 0..7 {
            let path = manager.next_backup_path(at(9, minute, 0)).unwrap();
            fs::write(&path, "{}").unwrap();
        }

        let deleted = manager.enforce_retention().unwrap();
        assert_eq!(deleted.len(), 2);
        assert!(!temp_dir.path().join("data.json.20240319_090000.backup").exists());
        assert!(!temp_dir.path().join("data.json.20240319_090100.backup").exists());

        let remaining = manager.list_backups().unwrap();
        assert_eq!(remaining.len(), 5);
        assert_eq!(remaining[0].created_at, at(9, 6, 0));
        assert_eq!(remaining[4].created_at, at(9, 2, 0));
    }

    #[test]
    fn test_find_backup() {
        let (_temp_dir, manager) = setup();
        assert!(manager.find("latest").unwrap_err().is_not_found());

        for minute in 0..2 {
            let path = manager.next_backup_path(at(9, minute, 0)).unwrap();
            fs::write(&path, "{}").unwrap();
        }

        let latest = manager.find("latest").unwrap();
        assert_eq!(latest.filename, "data.json.20240319_090100.backup");
        let named = manager.find("data.json.20240319_090000.backup").unwrap();
        assert_eq!(named.created_at, at(9, 0, 0));
        assert!(manager.find("nope").unwrap_err().is_not_found());
    }
}
