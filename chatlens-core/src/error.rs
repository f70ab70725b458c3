//! Error types for chatlens-core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the chatlens-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Raw message store missing or unreadable
    #[error("message store not found: {} (copy your chat.db there or pass --source)", .0.display())]
    SourceNotFound(PathBuf),

    /// Raw store tables don't match the expected shapes
    #[error("unsupported message store schema: {0}")]
    Schema(String),

    /// Flat table snapshot missing when loading
    #[error("extracted table not found: {} (run chatlens-extract first)", .0.display())]
    DataNotFound(PathBuf),

    /// Identity map document malformed
    #[error("identity map error: {0}")]
    MappingFormat(String),

    /// A date string in a filter can't be parsed
    #[error("date parse error: {0}")]
    Parse(String),

    /// Unknown timezone identifier
    #[error("unknown timezone: {0}")]
    Timezone(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot serialization error
    #[error("snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for chatlens-core
pub type Result<T> = std::result::Result<T, Error>;
