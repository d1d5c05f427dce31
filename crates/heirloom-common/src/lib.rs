//! Heirloom-Common: Shared types and utilities.
//!
//! This crate provides functionality used across the heirloom workspace:
//!
//! - **Typed IDs**: `SubmissionId`, a newtype over the catalog's integer key
//! - **Path Utilities**: extension handling for uploaded photos
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use heirloom_common::{Error, Result, SubmissionId};
//! use heirloom_common::paths::extension_suffix;
//!
//! let id = SubmissionId::from(7);
//! assert_eq!(id.to_string(), "7");
//!
//! assert_eq!(extension_suffix("photo.JPG"), ".JPG");
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("submission 7"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod paths;

pub use error::{Error, Result};
pub use ids::SubmissionId;
