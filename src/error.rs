//! ReplBridge Error Types

use std::path::PathBuf;

use thiserror::Error;

use crate::pool::Backend;

/// Result type alias for ReplBridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// ReplBridge error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot read configuration info from {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse configuration from {}: {reason}", .path.display())]
    ConfigParse { path: PathBuf, reason: String },

    // Pool errors
    #[error("Cannot create {backend} connections pool: {reason}")]
    PoolCreation { backend: Backend, reason: String },

    // Liveness errors
    #[error("{backend} liveness check failed: {reason}")]
    Liveness { backend: Backend, reason: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Every infrastructure failure ends the boot; nothing here is retried.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Cancelled)
    }

    /// The backend this error concerns, if any
    pub fn backend(&self) -> Option<Backend> {
        match self {
            Error::PoolCreation { backend, .. } | Error::Liveness { backend, .. } => Some(*backend),
            _ => None,
        }
    }
}
