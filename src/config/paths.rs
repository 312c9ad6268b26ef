//! Path management for Sealbox
//!
//! Everything on disk hangs off the primary data file:
//!
//! - `<data_file>`: the JSON record store
//! - `<data_file>.<YYYYMMDD_HHMMSS>.backup`: rolling backups in the same directory
//! - `<data_file>.audit.log`: default audit trail location
//! - `<data_file>.tmp`: scratch file for atomic writes

use std::path::{Path, PathBuf};

use crate::error::{SealboxError, SealboxResult};

/// Suffix shared by every backup file
pub const BACKUP_SUFFIX: &str = ".backup";

/// Manages all paths derived from the data file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealboxPaths {
    data_file: PathBuf,
}

impl SealboxPaths {
    /// Create paths rooted at a data file
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
        }
    }

    /// Get the primary data file
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Directory holding the data file and its backups
    pub fn data_dir(&self) -> PathBuf {
        match self.data_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Path of a file living next to the data file
    fn sibling(&self, name: String) -> PathBuf {
        match self.data_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
            _ => PathBuf::from(name),
        }
    }

    /// File name of the data file, e.g. `encrypted_data.json`
    pub fn file_name(&self) -> String {
        self.data_file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Prefix shared by every backup file name, e.g. `encrypted_data.json.`
    pub fn backup_prefix(&self) -> String {
        format!("{}.", self.file_name())
    }

    /// Full path of a backup with the given stamp
    pub fn backup_file(&self, stamp: &str) -> PathBuf {
        self.sibling(format!("{}{}{}", self.backup_prefix(), stamp, BACKUP_SUFFIX))
    }

    /// Scratch file used while writing the data file atomically
    pub fn temp_file(&self) -> PathBuf {
        self.sibling(format!("{}.tmp", self.file_name()))
    }

    /// Default audit log location
    pub fn audit_log(&self) -> PathBuf {
        self.sibling(format!("{}.audit.log", self.file_name()))
    }

    /// Ensure the data directory exists
    pub fn ensure_directories(&self) -> SealboxResult<()> {
        std::fs::create_dir_all(self.data_dir()).map_err(|e| {
            SealboxError::Persistence(format!(
                "Failed to create data directory {}: {}",
                self.data_dir().display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_data_file() {
        let paths = SealboxPaths::new("encrypted_data.json");

        assert_eq!(paths.data_dir(), PathBuf::from("."));
        assert_eq!(paths.backup_prefix(), "encrypted_data.json.");
        assert_eq!(
            paths.backup_file("20240319_101500"),
            PathBuf::from("encrypted_data.json.20240319_101500.backup")
        );
    }

    #[test]
    fn test_nested_data_file() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SealboxPaths::new(temp_dir.path().join("store.json"));

        assert_eq!(paths.data_dir(), temp_dir.path());
        assert_eq!(paths.temp_file(), temp_dir.path().join("store.json.tmp"));
        assert_eq!(
            paths.audit_log(),
            temp_dir.path().join("store.json.audit.log")
        );
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SealboxPaths::new(temp_dir.path().join("nested").join("dir").join("store.json"));

        paths.ensure_directories().unwrap();

        assert!(temp_dir.path().join("nested").join("dir").exists());
    }
}
