//! Embedded photo metadata.
//!
//! Thin layer over `heirloom_iptc` that speaks the archive's error type and
//! provides the best-effort variant the workflow uses.

use std::path::Path;

use heirloom_common::{Error, Result};
use heirloom_iptc::{IptcTags, TagUpdate};

/// Writes catalog fields into the IPTC block of stored photos.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataEmbedder;

impl MetadataEmbedder {
    pub fn new() -> Self {
        Self
    }

    /// Update the supplied tags of the file at `path`.
    ///
    /// Returns `Ok(false)` when nothing was written, which includes an update
    /// with no supplied fields.
    pub fn write_tags(&self, path: &Path, update: &TagUpdate) -> Result<bool> {
        heirloom_iptc::write_tags(path, update).map_err(|e| {
            Error::metadata(format!("Failed to write tags to {}: {}", path.display(), e))
        })
    }

    /// Like [`write_tags`](Self::write_tags), but failures are logged and
    /// swallowed.
    pub fn write_tags_best_effort(&self, path: &Path, update: &TagUpdate) -> bool {
        match self.write_tags(path, update) {
            Ok(written) => written,
            Err(e) => {
                tracing::warn!("{}", e);
                false
            }
        }
    }

    /// Read the embedded tags of the file at `path`.
    pub fn read_tags(&self, path: &Path) -> Result<IptcTags> {
        heirloom_iptc::read_tags(path).map_err(|e| {
            Error::metadata(format!("Failed to read tags from {}: {}", path.display(), e))
        })
    }
}

/// Build an update that sets only the non-empty values.
pub fn non_empty_update(title: &str, description: &str, source: &str) -> TagUpdate {
    let pick = |value: &str| (!value.is_empty()).then(|| value.to_string());
    TagUpdate {
        title: pick(title),
        description: pick(description),
        source: pick(source),
    }
}
