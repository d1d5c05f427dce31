//! Common error types used throughout heirloom.
//!
//! The variants follow the archive's failure taxonomy: storage failures are
//! fatal to the operation that needed the file, metadata failures are
//! best-effort and normally logged by the caller, and a missing submission is
//! reported explicitly instead of being silently ignored.

/// Common error type for heirloom.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested submission was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Writing an uploaded photo to the image store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Reading or writing embedded image metadata failed.
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new Metadata error.
    pub fn metadata<S: Into<String>>(msg: S) -> Self {
        Self::Metadata(msg.into())
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("submission 3");
        assert_eq!(err.to_string(), "Not found: submission 3");

        let err = Error::storage("disk full");
        assert_eq!(err.to_string(), "Storage error: disk full");

        let err = Error::metadata("not a JPEG");
        assert_eq!(err.to_string(), "Metadata error: not a JPEG");

        let err = Error::database("connection failed");
        assert_eq!(err.to_string(), "Database error: connection failed");

        let err = Error::invalid_input("missing photo");
        assert_eq!(err.to_string(), "Invalid input: missing photo");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_string_into() {
        let err = Error::not_found(String::from("test"));
        assert_eq!(err.to_string(), "Not found: test");
    }
}
