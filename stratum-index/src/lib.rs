//! # stratum-index
//!
//! SQLite-backed implementation of the Stratum index: the persistent,
//! transactional catalog of the patient/study/series/instance hierarchy,
//! its attachments and tag projections, the deletion cascade with its
//! listener notifications, the patient recycling queue, and the change
//! and export logs.
//!
//! The engine is single-writer: one [`IndexEngine`] owns the connection,
//! and every externally observable operation runs inside a transaction
//! obtained from [`IndexEngine::start_transaction`].

pub mod connection;
pub mod content;
pub mod engine;
pub mod lookup;
pub mod migrations;
pub mod queries;
pub mod schema;

pub use engine::IndexEngine;

use stratum_core::StratumError;

/// Map a rusqlite error onto the workspace error type. Unique-constraint
/// violations surface as `Duplicate`, foreign-key violations as
/// `Corruption`; everything else is an opaque engine error.
pub(crate) fn db_err(error: rusqlite::Error) -> StratumError {
    match error {
        rusqlite::Error::SqliteFailure(code, ref message)
            if code.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            let details = message.clone().unwrap_or_else(|| error.to_string());
            if details.contains("FOREIGN KEY") {
                StratumError::Corruption { details }
            } else {
                StratumError::Duplicate { item: details }
            }
        }
        other => StratumError::Database {
            message: other.to_string(),
        },
    }
}
