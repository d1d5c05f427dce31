//! The photo archive core: blob storage, metadata embedding, and the
//! submission workflow on top of the catalog.

pub mod embedder;
pub mod storage;
pub mod workflow;

pub use embedder::MetadataEmbedder;
pub use storage::BlobStore;
pub use workflow::{
    image_url, EditNotice, EditReport, ReclaimReport, RetagReport, SubmissionFields,
    SubmissionView, SubmissionWorkflow, Upload,
};

use anyhow::{Context, Result};
use heirloom_db::pool::init_pool;

use crate::config::{prepare_storage, StorageConfig};

/// Build a workflow from the storage config, creating directories and
/// migrating the catalog as needed.
pub fn open_workflow(storage: &StorageConfig) -> Result<SubmissionWorkflow> {
    prepare_storage(storage)?;

    let db_path = storage.database_path();
    let db_path_str = db_path.to_string_lossy();
    tracing::info!("Initializing database at {}", db_path_str);
    let pool = init_pool(&db_path_str)
        .with_context(|| format!("Failed to open catalog at {}", db_path_str))?;

    Ok(SubmissionWorkflow::new(
        BlobStore::new(storage.images_dir()),
        MetadataEmbedder::new(),
        pool,
    ))
}
