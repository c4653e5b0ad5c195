//! Error types for cindex-build.

use thiserror::Error;

/// Result type for cindex-build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors that can occur while loading parse settings.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file: {0}")]
    ReadConfig(#[from] std::io::Error),

    /// Failed to parse `cindex.toml`.
    #[error("Failed to parse TOML config: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// Failed to parse `compile_commands.json`.
    #[error("Failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    /// Configuration validation error.
    #[error("Config validation error: {0}")]
    Validation(String),

    /// No compile command covers the requested source file.
    #[error("Source file not found in compilation database: {0}")]
    SourceNotFound(String),
}
