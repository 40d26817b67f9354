//! Error types surfaced by the index core.

/// Every fallible operation in the workspace returns this.
pub type StratumResult<T> = Result<T, StratumError>;

/// Errors surfaced by the index and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum StratumError {
    #[error("not found: {item}")]
    NotFound { item: String },

    #[error("duplicate identifier: {item}")]
    Duplicate { item: String },

    #[error("bad sequence of calls: {details}")]
    BadSequenceOfCalls { details: String },

    #[error("incompatible schema version {found}, supported range is {minimum}..={maximum}")]
    IncompatibleSchema {
        found: u32,
        minimum: u32,
        maximum: u32,
    },

    #[error("database corruption detected: {details}")]
    Corruption { details: String },

    #[error("storage area failure: {details}")]
    StorageAreaFailure { details: String },

    #[error("SQLite error: {message}")]
    Database { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("main DICOM tag defined twice at the same level: {tag}")]
    MainDicomTagsMultiplyDefined { tag: String },
}

impl StratumError {
    /// Shorthand for a `NotFound` with a formatted item description.
    pub fn not_found(item: impl Into<String>) -> Self {
        StratumError::NotFound { item: item.into() }
    }

    pub fn database(message: impl Into<String>) -> Self {
        StratumError::Database {
            message: message.into(),
        }
    }
}
