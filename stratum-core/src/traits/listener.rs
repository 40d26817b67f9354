//! Observer of index side effects.

use crate::errors::StratumResult;
use crate::models::{Attachment, ChangeEvent, ResourceLevel};

/// Receives the observable side effects of index operations.
///
/// All three callbacks are delivered synchronously after the outermost
/// commit; effects buffered inside a rolled-back transaction are never
/// delivered.
pub trait IDatabaseListener {
    /// An attachment row was removed by a deletion cascade; the blob must
    /// be removed from the storage area. A failure here is reported to the
    /// committing caller as `StorageAreaFailure`.
    fn signal_file_deleted(&mut self, attachment: &Attachment) -> StratumResult<()>;

    /// A change-log event became durable.
    fn signal_change(&mut self, change: &ChangeEvent);

    /// A deletion left the given ancestor without children; it is the
    /// deepest ancestor of the deleted subtree that still exists.
    fn signal_remaining_ancestor(&mut self, level: ResourceLevel, public_id: &str);
}

/// Listener that ignores everything; useful for tooling and tests that do
/// not observe side effects.
#[derive(Default)]
pub struct NullListener;

impl IDatabaseListener for NullListener {
    fn signal_file_deleted(&mut self, _attachment: &Attachment) -> StratumResult<()> {
        Ok(())
    }

    fn signal_change(&mut self, _change: &ChangeEvent) {}

    fn signal_remaining_ancestor(&mut self, _level: ResourceLevel, _public_id: &str) {}
}
