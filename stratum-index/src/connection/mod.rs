//! Thin wrapper around the embedded SQL engine.
//!
//! Adds what rusqlite does not give us directly: startup pragmas, counted
//! transaction nesting with rollback poisoning, and the trigger-invoked
//! signal functions with their per-transaction effect buffer.

pub mod pragmas;
pub mod signals;
pub mod transaction;

use std::cell::Cell;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use stratum_core::{StratumError, StratumResult};

use crate::db_err;
use signals::SignalBuffer;

/// Number of prepared statements kept by the connection's cache. The
/// whole query surface fits comfortably below this.
const STATEMENT_CACHE_CAPACITY: usize = 64;

/// A single-writer connection with nesting-aware transactions.
///
/// Only the outermost begin issues a real `BEGIN`, only the outermost
/// commit issues `COMMIT`. A nested rollback poisons the stack: every
/// further begin fails, every commit turns into a rollback, and the
/// outermost frame issues the real `ROLLBACK`.
pub struct IndexConnection {
    conn: Connection,
    nesting: Cell<u32>,
    needs_rollback: Cell<bool>,
    signals: Arc<Mutex<SignalBuffer>>,
}

impl IndexConnection {
    /// Open the database file, apply the pragmas, and register the signal
    /// functions invoked by the deletion triggers.
    pub fn open(path: &Path) -> StratumResult<Self> {
        Self::from_rusqlite(Connection::open(path).map_err(db_err)?)
    }

    /// In-memory database, for tests and tooling.
    pub fn open_in_memory() -> StratumResult<Self> {
        Self::from_rusqlite(Connection::open_in_memory().map_err(db_err)?)
    }

    fn from_rusqlite(conn: Connection) -> StratumResult<Self> {
        pragmas::apply_pragmas(&conn)?;
        conn.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);

        let signals = Arc::new(Mutex::new(SignalBuffer::default()));
        signals::register_signal_functions(&conn, Arc::clone(&signals))?;

        Ok(IndexConnection {
            conn,
            nesting: Cell::new(0),
            needs_rollback: Cell::new(false),
            signals,
        })
    }

    /// The underlying rusqlite connection, for the query modules.
    pub fn raw(&self) -> &Connection {
        &self.conn
    }

    /// The buffer the signal functions write into.
    pub fn signals(&self) -> &Arc<Mutex<SignalBuffer>> {
        &self.signals
    }

    /// Run a side-effecting statement (or several, separated by `;`).
    pub fn execute(&self, sql: &str) -> StratumResult<()> {
        self.conn.execute_batch(sql).map_err(db_err)
    }

    pub fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Rows affected by the most recent statement.
    pub fn last_change_count(&self) -> usize {
        self.conn.changes() as usize
    }

    pub fn table_exists(&self, name: &str) -> StratumResult<bool> {
        let mut statement = self
            .conn
            .prepare_cached("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")
            .map_err(db_err)?;
        statement.exists([name]).map_err(db_err)
    }

    /// Whether a transaction is currently open on this connection.
    pub fn is_inside_transaction(&self) -> bool {
        self.nesting.get() > 0
    }

    pub fn begin_transaction(&self) -> StratumResult<()> {
        if self.needs_rollback.get() {
            return Err(StratumError::BadSequenceOfCalls {
                details: "beginning a transaction after a nested rollback".to_owned(),
            });
        }

        if self.nesting.get() == 0 {
            self.conn.execute_batch("BEGIN").map_err(db_err)?;
        }

        self.nesting.set(self.nesting.get() + 1);
        Ok(())
    }

    /// Returns `true` when this was the outermost frame and a real
    /// `COMMIT` was issued.
    pub fn commit_transaction(&self) -> StratumResult<bool> {
        if self.nesting.get() == 0 {
            return Err(StratumError::BadSequenceOfCalls {
                details: "committing a nonexistent transaction".to_owned(),
            });
        }

        self.nesting.set(self.nesting.get() - 1);

        if self.nesting.get() > 0 {
            if self.needs_rollback.get() {
                return Err(StratumError::BadSequenceOfCalls {
                    details: "committing a transaction poisoned by a nested rollback".to_owned(),
                });
            }
            return Ok(false);
        }

        if self.needs_rollback.get() {
            self.do_rollback()?;
            return Err(StratumError::BadSequenceOfCalls {
                details: "outer commit rolled back after a nested rollback".to_owned(),
            });
        }

        self.conn.execute_batch("COMMIT").map_err(db_err)?;
        Ok(true)
    }

    /// Returns `true` when this was the outermost frame and a real
    /// `ROLLBACK` was issued.
    pub fn rollback_transaction(&self) -> StratumResult<bool> {
        if self.nesting.get() == 0 {
            return Err(StratumError::BadSequenceOfCalls {
                details: "rolling back a nonexistent transaction".to_owned(),
            });
        }

        self.nesting.set(self.nesting.get() - 1);

        if self.nesting.get() > 0 {
            self.needs_rollback.set(true);
            return Ok(false);
        }

        self.do_rollback()?;
        Ok(true)
    }

    fn do_rollback(&self) -> StratumResult<()> {
        self.needs_rollback.set(false);
        self.conn.execute_batch("ROLLBACK").map_err(db_err)?;

        // The rolled-back statements never happened; neither did their
        // buffered side effects.
        self.signals
            .lock()
            .expect("signal buffer lock poisoned")
            .clear();
        Ok(())
    }
}
