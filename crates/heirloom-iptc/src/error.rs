//! Error types for heirloom-iptc.

use std::io;
use thiserror::Error;

/// Result type for heirloom-iptc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for heirloom-iptc operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The data does not start with a JPEG SOI marker.
    #[error("Not a JPEG file")]
    NotJpeg,

    /// Invalid JPEG marker structure.
    #[error("Invalid JPEG: {0}")]
    InvalidJpeg(String),

    /// Invalid Photoshop resource or IIM data.
    #[error("Invalid IPTC data: {0}")]
    InvalidIptc(String),

    /// Buffer too small for operation.
    #[error("Buffer underflow: need {need} bytes, have {have}")]
    BufferUnderflow { need: usize, have: usize },

    /// Encoded metadata does not fit in a single JPEG segment.
    #[error("Metadata segment too large: {size} bytes (max {max})")]
    SegmentTooLarge { size: usize, max: usize },
}

impl Error {
    /// Create an invalid JPEG error.
    pub fn invalid_jpeg(msg: impl Into<String>) -> Self {
        Self::InvalidJpeg(msg.into())
    }

    /// Create an invalid IPTC error.
    pub fn invalid_iptc(msg: impl Into<String>) -> Self {
        Self::InvalidIptc(msg.into())
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Io(err.error)
    }
}
