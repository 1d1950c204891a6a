//! Errors returned by the index, its configuration and persistence.

use thiserror::Error;

/// Result type alias for termdex operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Configuration value rejected at construction time.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfig {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },

    /// Configuration sources could not be merged or parsed.
    #[error("Failed to parse configuration: {0}")]
    Config(String),

    /// Index was already finished and no longer accepts terms.
    #[error("Index is already finished.")]
    AlreadyFinished,

    /// Query issued against an index without a single term.
    #[error("Index contains no terms.")]
    EmptyIndex,

    /// Ordinals are 32-bit; the index cannot hold more terms.
    #[error("Index cannot hold more than {0} terms")]
    TooManyTerms(usize),

    /// Term id inserted twice while duplicates are rejected.
    #[error("Duplicate term id '{0}'")]
    DuplicateId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Persisted blob is not a termdex index or is internally inconsistent.
    #[error("Invalid index file: {0}")]
    InvalidFormat(String),

    #[error("Unsupported index format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

impl Error {
    pub(crate) fn invalid_config(key: &str, message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(err.to_string())
    }
}
