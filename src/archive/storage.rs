//! Durable storage for uploaded photos.
//!
//! Every upload lands in a new file under the image directory, named with a
//! random UUID and the extension of the client's filename. Bytes are synced
//! to disk before the locator is handed back.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use heirloom_common::paths::extension_suffix;
use heirloom_common::{Error, Result};

/// Filename assumed when the client did not send one.
const DEFAULT_UPLOAD_NAME: &str = "upload";

/// Filesystem store for uploaded photos.
#[derive(Debug, Clone)]
pub struct BlobStore {
    images_dir: PathBuf,
}

impl BlobStore {
    /// Create a store rooted at `images_dir`. The directory is created on
    /// first write.
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Write `data` to a new uniquely named file and return its locator.
    ///
    /// The locator is the path of the new file as a string. On failure no
    /// file is left behind.
    pub fn store(&self, original_filename: Option<&str>, data: &[u8]) -> Result<String> {
        fs::create_dir_all(&self.images_dir).map_err(|e| {
            Error::storage(format!(
                "Failed to create image directory {}: {}",
                self.images_dir.display(),
                e
            ))
        })?;

        let filename = original_filename
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_NAME);
        let name = format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            extension_suffix(filename)
        );
        let path = self.images_dir.join(name);

        let mut file = File::create_new(&path)
            .map_err(|e| Error::storage(format!("Failed to create {}: {}", path.display(), e)))?;

        if let Err(e) = write_synced(&mut file, &path, data) {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&path) {
                tracing::warn!(
                    "Failed to remove partial upload {}: {}",
                    path.display(),
                    cleanup
                );
            }
            return Err(Error::storage(format!(
                "Failed to write {}: {}",
                path.display(),
                e
            )));
        }

        tracing::debug!("Stored {} bytes at {}", data.len(), path.display());
        Ok(path.to_string_lossy().into_owned())
    }

    /// Whether the file behind a locator is currently present.
    pub fn exists(&self, locator: &str) -> bool {
        !locator.is_empty() && Path::new(locator).is_file()
    }

    /// Remove the file behind a locator.
    ///
    /// Returns `Ok(false)` when the file was already gone.
    pub fn remove(&self, locator: &str) -> Result<bool> {
        match fs::remove_file(locator) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage(format!("Failed to remove {}: {}", locator, e))),
        }
    }
}

fn write_synced(file: &mut File, path: &Path, data: &[u8]) -> std::io::Result<()> {
    file.write_all(data)?;
    file.sync_all()?;

    match path.parent() {
        Some(parent) => sync_dir(parent),
        None => Ok(()),
    }
}

/// Make new directory entries durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
