//! Heirloom-IPTC: embedded photo metadata for JPEG files
//!
//! This crate reads and rewrites the IPTC Information Interchange Model (IIM)
//! block that photo tools store inside JPEG files. Only the metadata segment
//! is touched; compressed image data is copied through byte for byte.
//!
//! # Modules
//!
//! - `jpeg` - JPEG marker segment parsing and serialization
//! - `irb` - Photoshop image resource blocks carried in APP13
//! - `iim` - IPTC IIM dataset encoding
//! - `tags` - Named tags and partial tag updates
//! - `file` - Path-level read/write with atomic replacement
//!
//! # Layout
//!
//! ```text
//! JPEG ── APP13 "Photoshop 3.0\0"
//!           └─ 8BIM resource 0x0404
//!                └─ IIM datasets: 1C <record> <number> <len> <value>
//! ```
//!
//! # Example
//!
//! ```no_run
//! use heirloom_iptc::{read_tags, write_tags, Tag, TagUpdate};
//!
//! let update = TagUpdate::default().title("Reunion").source("Jane");
//! write_tags("photo.jpg", &update).unwrap();
//!
//! let tags = read_tags("photo.jpg").unwrap();
//! assert_eq!(tags.get(Tag::ObjectName).as_deref(), Some("Reunion"));
//! ```

pub mod error;
pub mod file;
pub mod iim;
pub mod irb;
pub mod jpeg;
pub mod tags;

pub use error::{Error, Result};
pub use file::{embed, extract, read_tags, write_tags};
pub use tags::{IptcTags, Tag, TagUpdate};
