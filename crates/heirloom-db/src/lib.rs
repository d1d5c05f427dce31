//! Heirloom-DB: Catalog schema, migrations, and query operations
//!
//! This crate provides the submission catalog for heirloom using SQLite
//! with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching the catalog schema
//! - `queries` - Catalog query operations
//!
//! # Example
//!
//! ```no_run
//! use heirloom_db::models::NewSubmission;
//! use heirloom_db::pool::{get_conn, init_pool};
//! use heirloom_db::queries::submissions;
//!
//! let pool = init_pool("data/submissions.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let id = submissions::insert_submission(
//!     &conn,
//!     &NewSubmission::new("data/images/abc.jpg").with_title("Reunion"),
//! )
//! .unwrap();
//! println!("Created submission {}", id);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
