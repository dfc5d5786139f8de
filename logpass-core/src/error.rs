//! Error kinds per the design's error-handling contract: decode errors
//! and crypto failures surface to the submitter, validation errors are
//! reported without being staged, storage failures are treated as
//! non-recoverable, and a refused rollback is a plain boolean-shaped
//! result rather than a panic.

use thiserror::Error;

/// Raised by the [`crate::serializer::Serializer`] on malformed or
/// oversized input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializerError {
    #[error("unexpected end of buffer")]
    UnexpectedEof,
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("container too large: {0}")]
    TooLarge(String),
}

/// Top-level error type for `logpass-core`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("decode error: {0}")]
    Decode(#[from] SerializerError),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("transaction validation failed: {0}")]
    TransactionValidation(String),

    #[error("settings validation failed: {0}")]
    SettingsValidation(String),

    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("rollback refused: requested {requested} blocks, only {available} available")]
    RollbackRefused { requested: u32, available: u32 },
}

/// Result alias used pervasively throughout the crate, mirroring the
/// teacher's own `CResult<T>` naming.
pub type CResult<T> = Result<T, Error>;

impl Error {
    pub fn transaction_validation(msg: impl Into<String>) -> Self {
        Error::TransactionValidation(msg.into())
    }

    pub fn settings_validation(msg: impl Into<String>) -> Self {
        Error::SettingsValidation(msg.into())
    }

    pub fn crypto(msg: impl Into<String>) -> Self {
        Error::Crypto(msg.into())
    }
}
