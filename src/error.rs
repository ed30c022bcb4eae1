//! Error taxonomy shared across the stores and the selection engine

use thiserror::Error;

/// Errors raised while reading a single verse source
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("verse source not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("invalid verse payload: {message} (line {line}, column {column})")]
    InvalidPayload {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("verse payload is empty")]
    EmptyPayload,
}

impl LoadError {
    pub(crate) fn from_json(err: &serde_json::Error) -> Self {
        LoadError::InvalidPayload {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

/// The recoverable and fatal conditions of a verse session
///
/// Each variant has exactly one fallback tier. Only [`VerseError::NoVerses`]
/// reaches the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerseError {
    /// Primary source failed; the embedded payload is tried next
    #[error("primary verse source unavailable: {0}")]
    SourceUnavailable(LoadError),
    /// Both sources were empty or invalid
    #[error("no verses could be loaded")]
    NoVerses,
    /// The persisted settings record could not be parsed; defaults apply
    #[error("stored settings are corrupt: {0}")]
    SettingsCorrupt(String),
    /// A shuffle cursor pointed at a reference missing from the collection
    #[error("shuffle order references unknown verse '{reference}'")]
    StaleOrderReference { reference: String },
}

/// Errors from a durable key-value backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from the selection engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("shuffle mode requires a shuffle order")]
    MissingShuffleOrder,
}

/// Errors from a verse session action
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
