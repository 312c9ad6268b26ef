//! Configuration module for Sealbox
//!
//! This module provides configuration management including:
//! - Environment-style settings with validated defaults
//! - Path derivation for the data file, its backups and the audit log

pub mod paths;
pub mod settings;

pub use paths::SealboxPaths;
pub use settings::Settings;
