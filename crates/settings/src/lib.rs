//! Dropcraft Settings
//!
//! Operator configuration file handling. Every CLI subcommand takes a
//! config file plus flag overrides; the file is plain JSON so it can be
//! templated by deployment tooling.

mod config;

pub use config::Settings;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read config: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write config: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(serde_json::Error),

    #[error("Failed to create config directory: {0}")]
    CreateDirError(std::io::Error),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Default config file location: `~/.dropcraft/config.json`.
pub fn default_settings_path() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".dropcraft")
        .join("config.json")
}
