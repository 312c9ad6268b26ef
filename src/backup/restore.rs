//! Backup validation and restoration
//!
//! A backup is restorable when it parses as a record store. Restoring goes
//! through the persistence layer so the current primary is rotated into a
//! backup first and the write is serialized with ordinary saves.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::{SealboxError, SealboxResult};
use crate::storage::file_io::read_json;
use crate::storage::{PersistenceLayer, RecordStore};

use super::manager::BackupInfo;

/// Handles validating and restoring backups
pub struct RestoreManager<'a> {
    persistence: &'a PersistenceLayer,
}

impl<'a> RestoreManager<'a> {
    /// Create a new RestoreManager
    pub fn new(persistence: &'a PersistenceLayer) -> Self {
        Self { persistence }
    }

    /// Validate a backup file without restoring it
    pub fn validate_backup(&self, backup: &BackupInfo) -> SealboxResult<ValidationResult> {
        let store = read_backup(&backup.path)?;
        Ok(ValidationResult::from_store(backup, &store))
    }

    /// Replace the primary file with a backup's contents
    ///
    /// The backup is parsed before anything on disk changes; a corrupt
    /// backup leaves the primary untouched.
    pub fn restore(&self, backup: &BackupInfo) -> SealboxResult<RestoreResult> {
        let store = read_backup(&backup.path)?;
        let saved = self.persistence.save(&store)?;

        Ok(RestoreResult {
            restored_from: backup.filename.clone(),
            backup_date: backup.created_at,
            owner_count: store.owner_count(),
            record_count: store.record_count(),
            previous_primary: saved
                .backup
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string())),
            store,
        })
    }
}

/// Read a backup, mapping parse failures to a validation error
fn read_backup(path: &Path) -> SealboxResult<RecordStore> {
    read_json(path).map_err(|e| match e {
        SealboxError::Json(detail) => SealboxError::validation(format!(
            "Backup {} is not a valid record store: {}",
            path.display(),
            detail
        )),
        other => other,
    })
}

/// Result of validating a backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub filename: String,
    pub backup_date: NaiveDateTime,
    pub owner_count: usize,
    pub record_count: usize,
}

impl ValidationResult {
    fn from_store(backup: &BackupInfo, store: &RecordStore) -> Self {
        Self {
            filename: backup.filename.clone(),
            backup_date: backup.created_at,
            owner_count: store.owner_count(),
            record_count: store.record_count(),
        }
    }

    /// Get a summary of the backup contents
    pub fn summary(&self) -> String {
        format!(
            "{} record(s) across {} user(s)",
            self.record_count, self.owner_count
        )
    }
}

/// Result of a restore operation
#[derive(Debug)]
pub struct RestoreResult {
    /// Backup the data came from
    pub restored_from: String,
    /// When that backup was taken
    pub backup_date: NaiveDateTime,
    pub owner_count: usize,
    pub record_count: usize,
    /// Backup holding the primary as it was before the restore
    pub previous_primary: Option<String>,
    /// The restored contents
    pub store: RecordStore,
}

impl RestoreResult {
    /// Get a summary of what was restored
    pub fn summary(&self) -> String {
        format!(
            "Restored {} record(s) across {} user(s) from {}",
            self.record_count, self.owner_count, self.restored_from
        )
    }
}
