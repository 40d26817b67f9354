//! Attachment rows. The blob bytes live in the storage area; these rows
//! only carry the UUID handle and sizing metadata.

use rusqlite::{params, Connection, OptionalExtension};

use stratum_core::models::{Attachment, AttachmentType, CompressionScheme};
use stratum_core::StratumResult;

use crate::db_err;

/// Plain INSERT: re-adding the same `(resource, content type)` pair is
/// not idempotent and fails with `Duplicate`. Delete first to replace.
pub fn add_attachment(conn: &Connection, id: i64, attachment: &Attachment) -> StratumResult<()> {
    let mut statement = conn
        .prepare_cached("INSERT INTO AttachedFiles VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)")
        .map_err(db_err)?;
    statement
        .execute(params![
            id,
            attachment.content_type.to_db(),
            attachment.uuid,
            attachment.compressed_size as i64,
            attachment.uncompressed_size as i64,
            attachment.compression.to_db(),
            attachment.uncompressed_md5,
            attachment.compressed_md5,
        ])
        .map_err(db_err)?;
    Ok(())
}

/// Removing the row fires the deletion trigger, so the listener receives
/// the file-deletion command at commit.
pub fn delete_attachment(
    conn: &Connection,
    id: i64,
    content_type: AttachmentType,
) -> StratumResult<()> {
    let mut statement = conn
        .prepare_cached("DELETE FROM AttachedFiles WHERE id=?1 AND fileType=?2")
        .map_err(db_err)?;
    statement
        .execute(params![id, content_type.to_db()])
        .map_err(db_err)?;
    Ok(())
}

pub fn lookup_attachment(
    conn: &Connection,
    id: i64,
    content_type: AttachmentType,
) -> StratumResult<Option<Attachment>> {
    let mut statement = conn
        .prepare_cached(
            "SELECT uuid, uncompressedSize, compressionType, compressedSize, \
             uncompressedMD5, compressedMD5 FROM AttachedFiles WHERE id=?1 AND fileType=?2",
        )
        .map_err(db_err)?;

    let row = statement
        .query_row(params![id, content_type.to_db()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })
        .optional()
        .map_err(db_err)?;

    match row {
        None => Ok(None),
        Some((uuid, uncompressed, compression, compressed, md5, compressed_md5)) => {
            Ok(Some(Attachment {
                uuid,
                content_type,
                uncompressed_size: uncompressed as u64,
                uncompressed_md5: md5.unwrap_or_default(),
                compression: CompressionScheme::from_db(compression)?,
                compressed_size: compressed as u64,
                compressed_md5: compressed_md5.unwrap_or_default(),
            }))
        }
    }
}

pub fn list_available_attachments(
    conn: &Connection,
    id: i64,
) -> StratumResult<Vec<AttachmentType>> {
    let mut statement = conn
        .prepare_cached("SELECT fileType FROM AttachedFiles WHERE id=?1")
        .map_err(db_err)?;
    let rows = statement
        .query_map(params![id], |row| row.get::<_, i64>(0))
        .map_err(db_err)?;

    let mut types = Vec::new();
    for row in rows {
        types.push(AttachmentType::from_db(row.map_err(db_err)?)?);
    }
    Ok(types)
}
