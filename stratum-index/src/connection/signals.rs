//! Scalar functions invoked by the deletion triggers, and the buffer
//! collecting their effects until the outer commit.

use std::sync::{Arc, Mutex};

use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::Connection;

use stratum_core::models::{Attachment, AttachmentType, ChangeEvent, CompressionScheme, ResourceLevel};
use stratum_core::StratumResult;

use crate::db_err;

/// Side effects accumulated inside the current transaction. Drained to
/// the listener after the outer `COMMIT`; discarded on rollback.
#[derive(Default)]
pub struct SignalBuffer {
    /// Attachment rows removed by the cascade, one entry per trigger
    /// firing; each becomes a file-deletion command for the storage area.
    pub deleted_files: Vec<Attachment>,

    /// Resource rows removed by the most recent `DELETE` statement.
    /// Drained by the deletion engine, which turns them into change-log
    /// rows before commit.
    pub deleted_resources: Vec<(String, ResourceLevel)>,

    /// Ancestors reported childless during the most recent `DELETE`
    /// statement. Drained by the deletion engine, which keeps the deepest
    /// one still existing.
    pub ancestor_candidates: Vec<(String, ResourceLevel)>,

    /// Change events to deliver to the listener at commit.
    pub pending_changes: Vec<ChangeEvent>,

    /// Remaining-ancestor notifications to deliver at commit.
    pub pending_ancestors: Vec<(ResourceLevel, String)>,
}

impl SignalBuffer {
    /// Forget everything; called when the outer transaction rolls back.
    pub fn clear(&mut self) {
        self.deleted_files.clear();
        self.deleted_resources.clear();
        self.ancestor_candidates.clear();
        self.pending_changes.clear();
        self.pending_ancestors.clear();
    }
}

fn attachment_from_context(ctx: &Context<'_>) -> rusqlite::Result<Attachment> {
    let content_type = AttachmentType::from_db(ctx.get::<i64>(1)?)
        .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
    let compression = CompressionScheme::from_db(ctx.get::<i64>(3)?)
        .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;

    Ok(Attachment {
        uuid: ctx.get::<String>(0)?,
        content_type,
        uncompressed_size: ctx.get::<i64>(2)? as u64,
        compression,
        compressed_size: ctx.get::<i64>(4)? as u64,
        uncompressed_md5: ctx.get::<Option<String>>(5)?.unwrap_or_default(),
        compressed_md5: ctx.get::<Option<String>>(6)?.unwrap_or_default(),
    })
}

fn level_from_context(ctx: &Context<'_>, index: usize) -> rusqlite::Result<ResourceLevel> {
    ResourceLevel::from_db(ctx.get::<i64>(index)?)
        .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))
}

/// Register the three process-lifetime functions the triggers call back:
///
/// - `SignalFileDeleted(uuid, type, uncompressedSize, compression,
///   compressedSize, uncompressedMD5, compressedMD5)` — once per deleted
///   attachment row;
/// - `SignalResourceDeleted(publicId, resourceType)` — once per deleted
///   resource row;
/// - `SignalRemainingAncestor(publicId, resourceType)` — once per ancestor
///   left childless during the cascade.
pub fn register_signal_functions(
    conn: &Connection,
    signals: Arc<Mutex<SignalBuffer>>,
) -> StratumResult<()> {
    let buffer = Arc::clone(&signals);
    conn.create_scalar_function(
        "SignalFileDeleted",
        7,
        FunctionFlags::SQLITE_UTF8,
        move |ctx| {
            let attachment = attachment_from_context(ctx)?;
            buffer
                .lock()
                .expect("signal buffer lock poisoned")
                .deleted_files
                .push(attachment);
            Ok(0i64)
        },
    )
    .map_err(db_err)?;

    let buffer = Arc::clone(&signals);
    conn.create_scalar_function(
        "SignalResourceDeleted",
        2,
        FunctionFlags::SQLITE_UTF8,
        move |ctx| {
            let public_id = ctx.get::<String>(0)?;
            let level = level_from_context(ctx, 1)?;
            buffer
                .lock()
                .expect("signal buffer lock poisoned")
                .deleted_resources
                .push((public_id, level));
            Ok(0i64)
        },
    )
    .map_err(db_err)?;

    let buffer = signals;
    conn.create_scalar_function(
        "SignalRemainingAncestor",
        2,
        FunctionFlags::SQLITE_UTF8,
        move |ctx| {
            let public_id = ctx.get::<String>(0)?;
            let level = level_from_context(ctx, 1)?;
            tracing::debug!(%public_id, ?level, "remaining ancestor candidate");
            buffer
                .lock()
                .expect("signal buffer lock poisoned")
                .ancestor_candidates
                .push((public_id, level));
            Ok(0i64)
        },
    )
    .map_err(db_err)?;

    Ok(())
}
