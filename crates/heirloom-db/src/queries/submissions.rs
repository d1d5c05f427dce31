//! Submission catalog queries.
//!
//! This module provides the catalog operations: insert, list (newest first),
//! get by id, partial update, and the photo-replacement update that also
//! records the superseded file.

use chrono::Utc;
use heirloom_common::{Error, Result, SubmissionId};
use rusqlite::Connection;

use super::{format_timestamp, parse_timestamp, superseded_files};
use crate::models::{NewSubmission, Submission, SubmissionUpdate};

const SELECT_COLUMNS: &str =
    "SELECT id, image_path, title, description, submitted_by, approximate_date, created_at
     FROM submissions";

/// Parse a submission from a database row.
///
/// Expects columns in order: id, image_path, title, description,
/// submitted_by, approximate_date, created_at. NULL text columns (written by
/// older releases) read back as empty strings.
fn parse_submission_row(row: &rusqlite::Row) -> rusqlite::Result<Submission> {
    let created_at: String = row.get(6)?;
    Ok(Submission {
        id: SubmissionId::from(row.get::<_, i64>(0)?),
        image_path: row.get(1)?,
        title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        submitted_by: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        approximate_date: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        created_at: parse_timestamp(6, &created_at)?,
    })
}

/// Insert a new submission.
///
/// The catalog assigns the id and stamps `created_at` with the current UTC
/// time.
///
/// # Returns
///
/// * `Ok(SubmissionId)` - The id of the new row
/// * `Err(Error)` - If a database error occurs
pub fn insert_submission(conn: &Connection, new: &NewSubmission) -> Result<SubmissionId> {
    conn.execute(
        "INSERT INTO submissions (
            image_path, title, description, submitted_by, approximate_date, created_at
         ) VALUES (
            :image_path, :title, :description, :submitted_by, :approximate_date, :created_at
         )",
        rusqlite::named_params! {
            ":image_path": &new.image_path,
            ":title": &new.title,
            ":description": &new.description,
            ":submitted_by": &new.submitted_by,
            ":approximate_date": &new.approximate_date,
            ":created_at": format_timestamp(Utc::now()),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(SubmissionId::from(conn.last_insert_rowid()))
}

/// List every submission, most recent first.
///
/// Always re-queries the table; ordering is strictly by id descending.
pub fn list_submissions(conn: &Connection) -> Result<Vec<Submission>> {
    let mut stmt = conn
        .prepare(&format!("{SELECT_COLUMNS} ORDER BY id DESC"))
        .map_err(|e| Error::database(e.to_string()))?;

    let submissions = stmt
        .query_map([], parse_submission_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(submissions)
}

/// Get a submission by id.
///
/// # Returns
///
/// * `Ok(Some(Submission))` - The submission if found
/// * `Ok(None)` - If no row has this id
/// * `Err(Error)` - If a database error occurs
pub fn get_submission(conn: &Connection, id: SubmissionId) -> Result<Option<Submission>> {
    let result = conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = :id"),
        rusqlite::named_params! { ":id": id.get() },
        parse_submission_row,
    );

    match result {
        Ok(submission) => Ok(Some(submission)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Apply a partial update to a submission.
///
/// Columns whose update field is `None` keep their current value.
///
/// # Returns
///
/// * `Ok(true)` - If the row existed and was updated
/// * `Ok(false)` - If no row has this id (nothing is written)
/// * `Err(Error)` - If a database error occurs
pub fn update_submission(
    conn: &Connection,
    id: SubmissionId,
    update: &SubmissionUpdate,
) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "UPDATE submissions
             SET image_path = COALESCE(:image_path, image_path),
                 title = COALESCE(:title, title),
                 description = COALESCE(:description, description),
                 submitted_by = COALESCE(:submitted_by, submitted_by),
                 approximate_date = COALESCE(:approximate_date, approximate_date)
             WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.get(),
                ":image_path": &update.image_path,
                ":title": &update.title,
                ":description": &update.description,
                ":submitted_by": &update.submitted_by,
                ":approximate_date": &update.approximate_date,
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows_affected > 0)
}

/// Point a submission at a replacement photo and record the old file.
///
/// The row update and the superseded-file entry commit together. The old file
/// itself is not touched.
///
/// # Returns
///
/// * `Ok(true)` - If the row existed and now references `update.image_path`
/// * `Ok(false)` - If no row has this id (nothing is written)
/// * `Err(Error)` - If a database error occurs
pub fn replace_submission_image(
    conn: &mut Connection,
    id: SubmissionId,
    update: &SubmissionUpdate,
    previous_path: &str,
) -> Result<bool> {
    let new_path = update
        .image_path
        .as_deref()
        .ok_or_else(|| Error::invalid_input("replacement update has no image path"))?;

    let tx = conn
        .transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    if !update_submission(&tx, id, update)? {
        return Ok(false);
    }

    if new_path != previous_path {
        superseded_files::record_superseded(&tx, id, previous_path)?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;

    Ok(true)
}

/// Whether any submission currently references the given locator.
pub fn is_image_path_referenced(conn: &Connection, image_path: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM submissions WHERE image_path = :image_path)",
        rusqlite::named_params! { ":image_path": image_path },
        |row| row.get::<_, bool>(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::superseded_files::list_pending;

    fn insert(conn: &Connection, path: &str, title: &str) -> SubmissionId {
        insert_submission(conn, &NewSubmission::new(path).with_title(title)).unwrap()
    }

    #[test]
    fn test_insert_and_get_submission() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let new = NewSubmission::new("data/images/a.JPG")
            .with_title("Reunion")
            .with_submitted_by("Jane");
        let id = insert_submission(&conn, &new).unwrap();

        let found = get_submission(&conn, id).unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.image_path, "data/images/a.JPG");
        assert_eq!(found.title, "Reunion");
        assert_eq!(found.description, "");
        assert_eq!(found.submitted_by, "Jane");
        assert_eq!(found.approximate_date, "");
        assert!(found.created_at <= Utc::now());
    }

    #[test]
    fn test_get_submission_not_found() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let found = get_submission(&conn, SubmissionId::from(99)).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_created_at_stored_as_utc_text() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let id = insert(&conn, "a.jpg", "A");

        let raw: String = conn
            .query_row(
                "SELECT created_at FROM submissions WHERE id = ?",
                [id.get()],
                |row| row.get(0),
            )
            .unwrap();
        assert!(raw.ends_with("+00:00"), "unexpected timestamp {raw}");
        assert!(chrono::DateTime::parse_from_rfc3339(&raw).is_ok());
    }

    #[test]
    fn test_list_submissions_newest_first() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let first = insert(&conn, "1.jpg", "first");
        let second = insert(&conn, "2.jpg", "second");
        let third = insert(&conn, "3.jpg", "third");

        let rows = list_submissions(&conn).unwrap();
        let ids: Vec<_> = rows.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![third, second, first]);

        // Re-listing without mutation returns the same sequence
        assert_eq!(list_submissions(&conn).unwrap(), rows);
    }

    #[test]
    fn test_list_submissions_empty() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        assert!(list_submissions(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_update_submission_partial() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let id = insert_submission(
            &conn,
            &NewSubmission::new("a.jpg")
                .with_title("T")
                .with_description("D")
                .with_submitted_by("S")
                .with_approximate_date("1962"),
        )
        .unwrap();

        let update = SubmissionUpdate {
            description: Some("D2".to_string()),
            ..Default::default()
        };
        assert!(update_submission(&conn, id, &update).unwrap());

        let found = get_submission(&conn, id).unwrap().unwrap();
        assert_eq!(found.title, "T");
        assert_eq!(found.description, "D2");
        assert_eq!(found.submitted_by, "S");
        assert_eq!(found.approximate_date, "1962");
        assert_eq!(found.image_path, "a.jpg");
    }

    #[test]
    fn test_update_submission_can_clear_field() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let id = insert(&conn, "a.jpg", "T");

        let update = SubmissionUpdate {
            title: Some(String::new()),
            ..Default::default()
        };
        update_submission(&conn, id, &update).unwrap();

        assert_eq!(get_submission(&conn, id).unwrap().unwrap().title, "");
    }

    #[test]
    fn test_update_submission_missing_id_is_noop() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        insert(&conn, "a.jpg", "T");

        let update = SubmissionUpdate {
            title: Some("X".to_string()),
            ..Default::default()
        };
        assert!(!update_submission(&conn, SubmissionId::from(42), &update).unwrap());

        let rows = list_submissions(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "T");
    }

    #[test]
    fn test_legacy_null_columns_read_as_empty() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO submissions (image_path, created_at) VALUES (?, ?)",
            rusqlite::params!["old.jpg", "2023-12-24T08:00:00.000001+00:00"],
        )
        .unwrap();
        let id = SubmissionId::from(conn.last_insert_rowid());

        let found = get_submission(&conn, id).unwrap().unwrap();
        assert_eq!(found.title, "");
        assert_eq!(found.approximate_date, "");
    }

    #[test]
    fn test_replace_submission_image_records_superseded() {
        let pool = init_memory_pool().unwrap();
        let mut conn = pool.get().unwrap();
        let id = insert(&conn, "old.jpg", "T");

        let update = SubmissionUpdate {
            image_path: Some("new.jpg".to_string()),
            title: Some("T2".to_string()),
            ..Default::default()
        };
        assert!(replace_submission_image(&mut conn, id, &update, "old.jpg").unwrap());

        let found = get_submission(&conn, id).unwrap().unwrap();
        assert_eq!(found.image_path, "new.jpg");
        assert_eq!(found.title, "T2");

        let pending = list_pending(&conn).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].submission_id, id);
        assert_eq!(pending[0].image_path, "old.jpg");

        assert!(!is_image_path_referenced(&conn, "old.jpg").unwrap());
        assert!(is_image_path_referenced(&conn, "new.jpg").unwrap());
    }

    #[test]
    fn test_replace_submission_image_missing_id_writes_nothing() {
        let pool = init_memory_pool().unwrap();
        let mut conn = pool.get().unwrap();

        let update = SubmissionUpdate {
            image_path: Some("new.jpg".to_string()),
            ..Default::default()
        };
        let replaced =
            replace_submission_image(&mut conn, SubmissionId::from(5), &update, "old.jpg")
                .unwrap();
        assert!(!replaced);
        assert!(list_pending(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_replace_submission_image_requires_path() {
        let pool = init_memory_pool().unwrap();
        let mut conn = pool.get().unwrap();
        let id = insert(&conn, "old.jpg", "T");

        let err = replace_submission_image(&mut conn, id, &SubmissionUpdate::default(), "old.jpg")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
