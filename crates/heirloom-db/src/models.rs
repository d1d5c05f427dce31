//! Rust models matching the catalog schema.

use chrono::{DateTime, Utc};
use heirloom_common::SubmissionId;
use serde::{Deserialize, Serialize};

/// One catalog row: a single photo contribution and its descriptive fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub id: SubmissionId,
    /// Locator of the stored file currently backing this submission.
    pub image_path: String,
    pub title: String,
    pub description: String,
    pub submitted_by: String,
    pub approximate_date: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new catalog row.
///
/// `created_at` is not part of this struct; the catalog stamps it on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSubmission {
    pub image_path: String,
    pub title: String,
    pub description: String,
    pub submitted_by: String,
    pub approximate_date: String,
}

impl NewSubmission {
    /// Start a new row for the given stored file with empty text fields.
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_submitted_by(mut self, submitted_by: impl Into<String>) -> Self {
        self.submitted_by = submitted_by.into();
        self
    }

    pub fn with_approximate_date(mut self, approximate_date: impl Into<String>) -> Self {
        self.approximate_date = approximate_date.into();
        self
    }
}

/// Partial update of a catalog row.
///
/// `None` leaves the stored column unchanged; `Some` replaces it, including
/// with an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionUpdate {
    pub image_path: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub submitted_by: Option<String>,
    pub approximate_date: Option<String>,
}

impl SubmissionUpdate {
    /// True when applying this update would not change any column.
    pub fn is_empty(&self) -> bool {
        self.image_path.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.submitted_by.is_none()
            && self.approximate_date.is_none()
    }
}

/// A stored file that used to back a submission before its photo was replaced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupersededFile {
    pub id: i64,
    pub submission_id: SubmissionId,
    pub image_path: String,
    pub superseded_at: DateTime<Utc>,
    /// Set once the file has been removed from the image store.
    pub reclaimed_at: Option<DateTime<Utc>>,
}

impl SupersededFile {
    pub fn is_pending(&self) -> bool {
        self.reclaimed_at.is_none()
    }
}
