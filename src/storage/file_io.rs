//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't corrupt data on failure.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{SealboxError, SealboxResult};

/// Read and parse a JSON file
///
/// I/O failures are `Persistence`; a file that exists but does not parse as
/// `T` is `Json`, which callers treat as corruption.
pub fn read_json<T, P>(path: P) -> SealboxResult<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let file = File::open(path).map_err(|e| {
        SealboxError::Persistence(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| SealboxError::Json(e.to_string()))
}

/// Write JSON to a file atomically (write to temp, then rename)
///
/// The file is either completely written or not modified at all. Output is
/// pretty printed with two-space indentation.
pub fn write_json_atomic<T, P, Q>(path: P, temp_path: Q, data: &T) -> SealboxResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = temp_path.as_ref();

    let file = File::create(temp_path).map_err(|e| {
        SealboxError::Persistence(format!(
            "Failed to create temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    if let Err(e) = write_contents(file, data) {
        let _ = fs::remove_file(temp_path);
        return Err(e);
    }

    fs::rename(temp_path, path).map_err(|e| {
        let _ = fs::remove_file(temp_path);
        SealboxError::Persistence(format!("Failed to rename temp file: {}", e))
    })
}

fn write_contents<T: Serialize>(file: File, data: &T) -> SealboxResult<()> {
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| SealboxError::Persistence(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| SealboxError::Persistence(format!("Failed to flush data: {}", e)))?;

    // Sync to disk before rename
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| SealboxError::Persistence(format!("Failed to sync data: {}", e)))
}
