//! Storage layer for Sealbox
//!
//! `RecordStore` is the in-memory owner → label → record map;
//! `PersistenceLayer` moves it to and from a single JSON file with rolling
//! backups and corruption recovery.

pub mod file_io;
pub mod persistence;
pub mod records;

pub use file_io::{read_json, write_json_atomic};
pub use persistence::{LoadOutcome, LoadStatus, PersistenceLayer, SaveOutcome};
pub use records::{OwnerRecords, RecordStore};
