//! Superseded-file ledger queries.
//!
//! When a submission's photo is replaced, the previous locator is recorded
//! here instead of being forgotten. Entries start pending and become
//! reclaimed once a maintenance pass has removed the file.

use chrono::Utc;
use heirloom_common::{Error, Result, SubmissionId};
use rusqlite::Connection;

use super::{format_timestamp, parse_timestamp};
use crate::models::SupersededFile;

/// Parse a ledger entry from a database row.
///
/// Expects columns in order: id, submission_id, image_path, superseded_at, reclaimed_at.
fn parse_superseded_row(row: &rusqlite::Row) -> rusqlite::Result<SupersededFile> {
    let superseded_at: String = row.get(3)?;
    let reclaimed_at = row
        .get::<_, Option<String>>(4)?
        .map(|value| parse_timestamp(4, &value))
        .transpose()?;

    Ok(SupersededFile {
        id: row.get(0)?,
        submission_id: SubmissionId::from(row.get::<_, i64>(1)?),
        image_path: row.get(2)?,
        superseded_at: parse_timestamp(3, &superseded_at)?,
        reclaimed_at,
    })
}

/// Record that `image_path` no longer backs `submission_id`.
///
/// # Returns
///
/// * `Ok(i64)` - The ledger entry id
/// * `Err(Error)` - If a database error occurs
pub fn record_superseded(
    conn: &Connection,
    submission_id: SubmissionId,
    image_path: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO superseded_files (submission_id, image_path, superseded_at)
         VALUES (:submission_id, :image_path, :superseded_at)",
        rusqlite::named_params! {
            ":submission_id": submission_id.get(),
            ":image_path": image_path,
            ":superseded_at": format_timestamp(Utc::now()),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(conn.last_insert_rowid())
}

/// List ledger entries whose files have not been reclaimed, oldest first.
pub fn list_pending(conn: &Connection) -> Result<Vec<SupersededFile>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, submission_id, image_path, superseded_at, reclaimed_at
             FROM superseded_files
             WHERE reclaimed_at IS NULL
             ORDER BY id ASC",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let entries = stmt
        .query_map([], parse_superseded_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(entries)
}

/// List every ledger entry for one submission, oldest first.
pub fn list_for_submission(
    conn: &Connection,
    submission_id: SubmissionId,
) -> Result<Vec<SupersededFile>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, submission_id, image_path, superseded_at, reclaimed_at
             FROM superseded_files
             WHERE submission_id = :submission_id
             ORDER BY id ASC",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let entries = stmt
        .query_map(
            rusqlite::named_params! { ":submission_id": submission_id.get() },
            parse_superseded_row,
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(entries)
}

/// Mark a ledger entry as reclaimed.
///
/// # Returns
///
/// * `Ok(true)` - If the entry was pending and is now reclaimed
/// * `Ok(false)` - If the entry does not exist or was already reclaimed
pub fn mark_reclaimed(conn: &Connection, id: i64) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "UPDATE superseded_files SET reclaimed_at = :reclaimed_at
             WHERE id = :id AND reclaimed_at IS NULL",
            rusqlite::named_params! {
                ":id": id,
                ":reclaimed_at": format_timestamp(Utc::now()),
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows_affected > 0)
}
