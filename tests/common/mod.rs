//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates a scratch directory holding the
//! image store and a file-backed catalog, plus a full [`AppContext`] for
//! driving the router with `oneshot`.

#![allow(dead_code)]

use std::path::PathBuf;

use axum::Router;
use heirloom::archive::{BlobStore, MetadataEmbedder, SubmissionWorkflow};
use heirloom::config::Config;
use heirloom::server::{create_router, AppContext};
use heirloom_db::pool::{init_pool, DbPool};
use tempfile::TempDir;

/// Test harness wrapping a workflow backed by a temporary directory.
pub struct TestHarness {
    pub dir: TempDir,
    pub workflow: SubmissionWorkflow,
    pub ctx: AppContext,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration. Storage paths in the
    /// config are replaced by the scratch directory.
    pub fn with_config(mut config: Config) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        config.storage.data_dir = dir.path().to_path_buf();
        config.storage.images_dir = None;
        config.storage.database_path = None;

        let db_path = config.storage.database_path();
        let pool = init_pool(db_path.to_str().expect("utf-8 temp path"))
            .expect("failed to create catalog");
        let workflow = SubmissionWorkflow::new(
            BlobStore::new(config.storage.images_dir()),
            MetadataEmbedder::new(),
            pool,
        );
        let ctx = AppContext::new(config, workflow.clone());

        Self { dir, workflow, ctx }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone(), None)
    }

    pub fn pool(&self) -> &DbPool {
        self.workflow.pool()
    }

    pub fn images_dir(&self) -> PathBuf {
        self.dir.path().join("images")
    }

    /// Files currently in the image store.
    pub fn stored_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.images_dir()) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Minimal JPEG: SOI, JFIF APP0, SOS with a few entropy bytes, EOI.
pub fn sample_jpeg() -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    data.extend_from_slice(b"JFIF\0");
    data.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
    data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
    data.extend_from_slice(&[0xAB, 0xCD, 0xEF]);
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

/// A different JPEG, distinguishable from [`sample_jpeg`] by its scan bytes.
pub fn other_jpeg() -> Vec<u8> {
    let mut data = sample_jpeg();
    let len = data.len();
    data[len - 3] = 0x42;
    data
}
