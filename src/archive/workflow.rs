//! Submission create and edit orchestration.
//!
//! Ties the blob store, the metadata embedder, and the catalog together. The
//! catalog write is the commit point of every operation: a storage failure
//! aborts before the catalog is touched, while metadata failures are logged
//! and the operation carries on.

use std::path::Path;

use bytes::Bytes;
use heirloom_common::paths::is_taggable_file;
use heirloom_common::{Error, Result, SubmissionId};
use heirloom_db::models::{NewSubmission, Submission, SubmissionUpdate, SupersededFile};
use heirloom_db::pool::{get_conn, DbPool};
use heirloom_db::queries::{submissions, superseded_files};
use heirloom_iptc::TagUpdate;
use serde::{Serialize, Serializer};

use super::embedder::{non_empty_update, MetadataEmbedder};
use super::storage::BlobStore;

/// Text fields of a submission as supplied by a form.
///
/// `None` means the field was not supplied. On create that stores an empty
/// string; on edit it keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub submitted_by: Option<String>,
    pub approximate_date: Option<String>,
}

impl SubmissionFields {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_submitted_by(mut self, submitted_by: impl Into<String>) -> Self {
        self.submitted_by = Some(submitted_by.into());
        self
    }

    pub fn with_approximate_date(mut self, approximate_date: impl Into<String>) -> Self {
        self.approximate_date = Some(approximate_date.into());
        self
    }

    /// Tag update touching only the supplied fields.
    fn tag_update(&self) -> TagUpdate {
        TagUpdate {
            title: self.title.clone(),
            description: self.description.clone(),
            source: self.submitted_by.clone(),
        }
    }

    fn catalog_update(&self, image_path: Option<String>) -> SubmissionUpdate {
        SubmissionUpdate {
            image_path,
            title: self.title.clone(),
            description: self.description.clone(),
            submitted_by: self.submitted_by.clone(),
            approximate_date: self.approximate_date.clone(),
        }
    }
}

/// An uploaded photo.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Filename as sent by the client, if any.
    pub filename: Option<String>,
    pub data: Bytes,
}

impl Upload {
    pub fn new(filename: Option<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename,
            data: data.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Advisory message attached to an edit or a display view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditNotice {
    /// The backing file is gone, so tags cannot be written.
    MissingFile,
}

impl EditNotice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingFile => "Image file missing; IPTC update will be skipped.",
        }
    }
}

impl std::fmt::Display for EditNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl Serialize for EditNotice {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

/// Outcome of an edit.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EditReport {
    pub id: SubmissionId,
    /// A replacement photo was stored and the row now points at it.
    pub image_replaced: bool,
    /// Embedded tags were rewritten.
    pub tags_written: bool,
    pub notice: Option<EditNotice>,
}

/// A submission prepared for display.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubmissionView {
    #[serde(flatten)]
    pub submission: Submission,
    pub file_exists: bool,
    /// Public image URL, or empty when the file is missing.
    pub display_locator: String,
    pub notice: Option<EditNotice>,
}

/// Outcome of a superseded-file maintenance pass.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ReclaimReport {
    /// Files deleted from the image store.
    pub reclaimed: usize,
    /// Entries whose file was already gone.
    pub already_missing: usize,
    /// Entries left pending because a submission points at the file again.
    pub still_referenced: usize,
    pub failed: usize,
}

/// Outcome of a tag reconciliation pass.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RetagReport {
    pub updated: usize,
    pub unchanged: usize,
    pub missing: usize,
    /// Files in a format that cannot carry tags.
    pub skipped: usize,
    pub failed: usize,
}

/// Public URL of a submission's photo.
pub fn image_url(id: SubmissionId) -> String {
    format!("/image/{}", id)
}

/// Orchestrates the blob store, embedder, and catalog.
///
/// All methods block on file and database I/O.
#[derive(Clone)]
pub struct SubmissionWorkflow {
    storage: BlobStore,
    embedder: MetadataEmbedder,
    pool: DbPool,
}

impl SubmissionWorkflow {
    pub fn new(storage: BlobStore, embedder: MetadataEmbedder, pool: DbPool) -> Self {
        Self {
            storage,
            embedder,
            pool,
        }
    }

    pub fn storage(&self) -> &BlobStore {
        &self.storage
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Store a new photo, embed its non-empty fields, and add it to the catalog.
    pub fn create(&self, upload: &Upload, fields: &SubmissionFields) -> Result<SubmissionId> {
        let locator = self
            .storage
            .store(upload.filename.as_deref(), &upload.data)?;

        let title = fields.title.clone().unwrap_or_default();
        let description = fields.description.clone().unwrap_or_default();
        let submitted_by = fields.submitted_by.clone().unwrap_or_default();

        self.embed(
            Path::new(&locator),
            &non_empty_update(&title, &description, &submitted_by),
        );

        let new = NewSubmission::new(&locator)
            .with_title(title)
            .with_description(description)
            .with_submitted_by(submitted_by)
            .with_approximate_date(fields.approximate_date.clone().unwrap_or_default());

        let inserted = get_conn(&self.pool).and_then(|conn| submissions::insert_submission(&conn, &new));
        let id = match inserted {
            Ok(id) => id,
            Err(e) => {
                // The row never existed, so nothing references the file
                if let Err(cleanup) = self.storage.remove(&locator) {
                    tracing::warn!("{}", cleanup);
                }
                return Err(e);
            }
        };

        tracing::info!("Created submission {} at {}", id, locator);
        Ok(id)
    }

    /// Edit an existing submission, optionally replacing its photo.
    ///
    /// An empty replacement counts as no replacement. The previous file of a
    /// replaced photo stays on disk and is recorded as superseded.
    pub fn edit(
        &self,
        id: SubmissionId,
        fields: &SubmissionFields,
        replacement: Option<&Upload>,
    ) -> Result<EditReport> {
        let mut conn = get_conn(&self.pool)?;
        let existing = submissions::get_submission(&conn, id)?
            .ok_or_else(|| Error::not_found(format!("submission {}", id)))?;

        let mut report = EditReport {
            id,
            image_replaced: false,
            tags_written: false,
            notice: None,
        };

        match replacement.filter(|upload| !upload.is_empty()) {
            Some(upload) => {
                let locator = self
                    .storage
                    .store(upload.filename.as_deref(), &upload.data)?;

                // The new file starts without tags, so it gets the merged row
                let title = fields.title.as_deref().unwrap_or(&existing.title);
                let description = fields.description.as_deref().unwrap_or(&existing.description);
                let source = fields.submitted_by.as_deref().unwrap_or(&existing.submitted_by);
                report.tags_written = self.embed(
                    Path::new(&locator),
                    &non_empty_update(title, description, source),
                );

                let update = fields.catalog_update(Some(locator.clone()));
                let replaced = submissions::replace_submission_image(
                    &mut conn,
                    id,
                    &update,
                    &existing.image_path,
                )
                .and_then(|found| {
                    found
                        .then_some(())
                        .ok_or_else(|| Error::not_found(format!("submission {}", id)))
                });
                if let Err(e) = replaced {
                    // Rolled back, so neither the row nor the ledger knows the new file
                    if let Err(cleanup) = self.storage.remove(&locator) {
                        tracing::warn!("{}", cleanup);
                    }
                    return Err(e);
                }
                report.image_replaced = true;

                tracing::info!(
                    "Replaced photo of submission {}: {} -> {}",
                    id,
                    existing.image_path,
                    locator
                );
            }
            None => {
                if self.storage.exists(&existing.image_path) {
                    report.tags_written =
                        self.embed(Path::new(&existing.image_path), &fields.tag_update());
                } else {
                    tracing::info!(
                        "Submission {} has no file at {}, skipping tag update",
                        id,
                        existing.image_path
                    );
                    report.notice = Some(EditNotice::MissingFile);
                }

                if !submissions::update_submission(&conn, id, &fields.catalog_update(None))? {
                    return Err(Error::not_found(format!("submission {}", id)));
                }
                tracing::info!("Updated submission {}", id);
            }
        }

        Ok(report)
    }

    /// Fetch one submission with its file status. `None` id yields `None`.
    pub fn get_for_display(&self, id: Option<SubmissionId>) -> Result<Option<SubmissionView>> {
        let Some(id) = id else {
            return Ok(None);
        };

        let conn = get_conn(&self.pool)?;
        Ok(submissions::get_submission(&conn, id)?.map(|s| self.view(s)))
    }

    /// All submissions, newest first, with their file status.
    pub fn list_for_display(&self) -> Result<Vec<SubmissionView>> {
        let conn = get_conn(&self.pool)?;
        let rows = submissions::list_submissions(&conn)?;
        Ok(rows.into_iter().map(|s| self.view(s)).collect())
    }

    /// Path of a submission's photo, if the row exists and the file is present.
    pub fn resolve_image_path(&self, id: SubmissionId) -> Result<Option<String>> {
        let conn = get_conn(&self.pool)?;
        Ok(submissions::get_submission(&conn, id)?
            .map(|s| s.image_path)
            .filter(|path| self.storage.exists(path)))
    }

    /// Photos a submission used before its current one, oldest first.
    ///
    /// Unknown ids are `NotFound`, so an empty history means "never replaced".
    pub fn photo_history(&self, id: SubmissionId) -> Result<Vec<SupersededFile>> {
        let conn = get_conn(&self.pool)?;
        if submissions::get_submission(&conn, id)?.is_none() {
            return Err(Error::not_found(format!("submission {}", id)));
        }
        superseded_files::list_for_submission(&conn, id)
    }

    /// Delete superseded files that no submission references any more.
    pub fn reclaim_superseded(&self) -> Result<ReclaimReport> {
        let conn = get_conn(&self.pool)?;
        let mut report = ReclaimReport::default();

        for entry in superseded_files::list_pending(&conn)? {
            if submissions::is_image_path_referenced(&conn, &entry.image_path)? {
                report.still_referenced += 1;
                continue;
            }

            match self.storage.remove(&entry.image_path) {
                Ok(true) => report.reclaimed += 1,
                Ok(false) => report.already_missing += 1,
                Err(e) => {
                    tracing::warn!("{}", e);
                    report.failed += 1;
                    continue;
                }
            }
            superseded_files::mark_reclaimed(&conn, entry.id)?;
            tracing::debug!("Reclaimed {}", entry.image_path);
        }

        tracing::info!(
            "Reclaim finished: {} removed, {} already missing, {} still referenced, {} failed",
            report.reclaimed,
            report.already_missing,
            report.still_referenced,
            report.failed
        );
        Ok(report)
    }

    /// Rewrite every submission's catalog fields into its file.
    pub fn retag_all(&self) -> Result<RetagReport> {
        let rows = {
            let conn = get_conn(&self.pool)?;
            submissions::list_submissions(&conn)?
        };
        let mut report = RetagReport::default();

        for row in rows {
            let path = Path::new(&row.image_path);
            if !self.storage.exists(&row.image_path) {
                report.missing += 1;
                continue;
            }
            if !is_taggable_file(path) {
                report.skipped += 1;
                continue;
            }

            let update = TagUpdate::default()
                .title(row.title.as_str())
                .description(row.description.as_str())
                .source(row.submitted_by.as_str());
            match self.embedder.write_tags(path, &update) {
                Ok(true) => report.updated += 1,
                Ok(false) => report.unchanged += 1,
                Err(e) => {
                    tracing::warn!("Submission {}: {}", row.id, e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Retag finished: {} updated, {} unchanged, {} missing, {} skipped, {} failed",
            report.updated,
            report.unchanged,
            report.missing,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    fn view(&self, submission: Submission) -> SubmissionView {
        let file_exists = self.storage.exists(&submission.image_path);
        SubmissionView {
            display_locator: if file_exists {
                image_url(submission.id)
            } else {
                String::new()
            },
            notice: (!file_exists).then_some(EditNotice::MissingFile),
            file_exists,
            submission,
        }
    }

    /// Best-effort tag write. Formats that cannot carry tags are left alone.
    fn embed(&self, path: &Path, update: &TagUpdate) -> bool {
        if update.is_empty() {
            return false;
        }
        if !is_taggable_file(path) {
            tracing::debug!("{} cannot carry IPTC tags, leaving it as uploaded", path.display());
            return false;
        }
        self.embedder.write_tags_best_effort(path, update)
    }
}
