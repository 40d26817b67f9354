//! Scoped transaction guard.

use stratum_core::StratumResult;

use crate::engine::IndexEngine;

/// A transaction frame on the engine's connection.
///
/// Dropped without [`Transaction::commit`], the frame rolls back. Frames
/// nest: only the outermost one issues the real `BEGIN`/`COMMIT`, and a
/// rollback anywhere in the stack forces the whole stack to roll back.
#[must_use = "a transaction that is never committed rolls back on drop"]
#[derive(Debug)]
pub struct Transaction<'a> {
    engine: &'a IndexEngine,
    open: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(engine: &'a IndexEngine) -> StratumResult<Self> {
        engine.connection().begin_transaction()?;
        Ok(Transaction { engine, open: true })
    }

    /// Commit this frame. On the outermost frame this makes the work
    /// durable and delivers the buffered side effects to the listener.
    pub fn commit(mut self) -> StratumResult<()> {
        self.open = false;
        self.engine.commit_transaction()
    }

    /// Roll this frame back, poisoning any enclosing frames.
    pub fn rollback(mut self) -> StratumResult<()> {
        self.open = false;
        self.engine.rollback_transaction()
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(error) = self.engine.rollback_transaction() {
                tracing::warn!(%error, "implicit rollback failed");
            }
        }
    }
}
