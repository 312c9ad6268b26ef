//! Backup system for Sealbox
//!
//! Every save that replaces an existing data file keeps the old file as a
//! timestamped backup next to it.
//!
//! # Architecture
//!
//! - `BackupManager`: names, lists and prunes backups
//! - `RestoreManager`: validates backups and restores one to the primary path
//!
//! # Naming
//!
//! `<data_file>.<YYYYMMDD_HHMMSS>.backup`, with `_NNN` appended when more
//! than one backup is taken within the same second. Names sort in creation
//! order.
//!
//! # Example
//!
//! ```rust,ignore
//! use sealbox::backup::RestoreManager;
//! use sealbox::config::SealboxPaths;
//! use sealbox::storage::PersistenceLayer;
//!
//! let layer = PersistenceLayer::new(SealboxPaths::new("encrypted_data.json"), 5);
//! let latest = layer.backups().find("latest")?;
//! let result = RestoreManager::new(&layer).restore(&latest)?;
//! println!("{}", result.summary());
//! ```

mod manager;
mod restore;

pub use manager::{BackupInfo, BackupManager, BACKUP_STAMP_FORMAT};
pub use restore::{RestoreManager, RestoreResult, ValidationResult};
