//! Durable storage of the record store
//!
//! The whole store is one JSON document. Every save that replaces an
//! existing primary first renames it into a timestamped backup, then writes
//! the new snapshot atomically, then prunes old backups. Loading falls back
//! to the newest readable backup when the primary is corrupt.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{error, info, warn};

use super::file_io::{read_json, write_json_atomic};
use super::records::RecordStore;
use crate::backup::BackupManager;
use crate::config::SealboxPaths;
use crate::error::{SealboxError, SealboxResult};

/// How the store was established at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No primary file yet; first run
    Missing,
    /// Primary parsed cleanly
    Loaded,
    /// Primary was corrupt; contents came from this backup
    Recovered { backup: PathBuf },
    /// Primary was corrupt and no backup parsed; starting empty
    Unrecoverable,
}

/// Result of [`PersistenceLayer::load`]
#[derive(Debug)]
pub struct LoadOutcome {
    pub store: RecordStore,
    pub status: LoadStatus,
    /// `CorruptStore` describing what went wrong, for corruption statuses
    pub warning: Option<SealboxError>,
}

impl LoadOutcome {
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self.status,
            LoadStatus::Recovered { .. } | LoadStatus::Unrecoverable
        )
    }
}

/// Result of a successful save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Backup the previous primary was renamed to
    pub backup: Option<PathBuf>,
    /// Backups removed by retention
    pub pruned: Vec<PathBuf>,
}

/// Serializes the record store to disk
pub struct PersistenceLayer {
    paths: SealboxPaths,
    backups: BackupManager,
    writer: Mutex<()>,
}

impl PersistenceLayer {
    pub fn new(paths: SealboxPaths, retention: usize) -> Self {
        Self {
            backups: BackupManager::new(paths.clone(), retention),
            paths,
            writer: Mutex::new(()),
        }
    }

    pub fn paths(&self) -> &SealboxPaths {
        &self.paths
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Write a snapshot of the store
    ///
    /// If the write fails the rotated backup is moved back into place, so
    /// the primary on disk is exactly what it was before the call.
    pub fn save(&self, store: &RecordStore) -> SealboxResult<SaveOutcome> {
        let _guard = self.writer.lock().map_err(|e| {
            SealboxError::Persistence(format!("Failed to acquire writer lock: {}", e))
        })?;

        self.paths.ensure_directories()?;
        let primary = self.paths.data_file();

        let backup = self.backups.rotate_primary()?;

        if let Err(e) = write_json_atomic(primary, self.paths.temp_file(), store) {
            error!(error = %e, "Failed to write data file");
            if let Some(backup_path) = &backup {
                if let Err(restore_err) = fs::rename(backup_path, primary) {
                    error!(
                        backup = %backup_path.display(),
                        error = %restore_err,
                        "Failed to move backup back into place"
                    );
                } else {
                    warn!(backup = %backup_path.display(), "Restored previous data file from backup");
                }
            }
            return Err(match e {
                SealboxError::Persistence(_) => e,
                other => SealboxError::Persistence(other.to_string()),
            });
        }

        let pruned = match self.backups.enforce_retention() {
            Ok(pruned) => pruned,
            Err(e) => {
                warn!(error = %e, "Backup retention failed");
                Vec::new()
            }
        };

        info!(
            records = store.record_count(),
            backup = ?backup.as_ref().map(|p| p.display().to_string()),
            "Data saved"
        );

        Ok(SaveOutcome { backup, pruned })
    }

    /// Load the store, recovering from backups if the primary is corrupt
    ///
    /// The corrupt primary is left on disk untouched.
    pub fn load(&self) -> SealboxResult<LoadOutcome> {
        let primary = self.paths.data_file();

        if !primary.exists() {
            info!(path = %primary.display(), "No data file yet, starting empty");
            return Ok(LoadOutcome {
                store: RecordStore::new(),
                status: LoadStatus::Missing,
                warning: None,
            });
        }

        let detail = match read_json::<RecordStore, _>(primary) {
            Ok(store) => {
                info!(records = store.record_count(), "Data file loaded");
                return Ok(LoadOutcome {
                    store,
                    status: LoadStatus::Loaded,
                    warning: None,
                });
            }
            Err(SealboxError::Json(detail)) => detail,
            Err(e) => return Err(e),
        };

        warn!(path = %primary.display(), error = %detail, "Data file is corrupted, trying backups");

        for backup in self.backups.list_backups()? {
            match read_json::<RecordStore, _>(&backup.path) {
                Ok(store) => {
                    warn!(backup = %backup.filename, "Recovered data from backup");
                    return Ok(LoadOutcome {
                        store,
                        status: LoadStatus::Recovered {
                            backup: backup.path.clone(),
                        },
                        warning: Some(SealboxError::CorruptStore {
                            path: primary.to_path_buf(),
                            detail,
                            recovered_from: Some(backup.path),
                        }),
                    });
                }
                Err(e) => {
                    warn!(backup = %backup.filename, error = %e, "Backup unreadable");
                }
            }
        }

        error!("No usable backup found, starting with an empty store");
        Ok(LoadOutcome {
            store: RecordStore::new(),
            status: LoadStatus::Unrecoverable,
            warning: Some(SealboxError::CorruptStore {
                path: primary.to_path_buf(),
                detail,
                recovered_from: None,
            }),
        })
    }
}
