//! Path utilities for uploaded photos.
//!
//! Stored files keep the extension of the uploaded original so that anything
//! sniffing the format by extension (content-type selection when serving, the
//! metadata embedder) keeps working.

use std::path::Path;

/// Extensions that can carry embedded IPTC metadata.
const TAGGABLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "jpe", "jfif"];

/// Longest extension kept from a client-supplied filename.
const MAX_EXTENSION_LEN: usize = 16;

/// Return the extension of a client filename as a `.ext` suffix.
///
/// The case of the extension is preserved. Anything that is not a short ASCII
/// alphanumeric extension is dropped so the suffix is safe to append to a
/// generated file name.
///
/// # Examples
///
/// ```
/// use heirloom_common::paths::extension_suffix;
///
/// assert_eq!(extension_suffix("photo.JPG"), ".JPG");
/// assert_eq!(extension_suffix("scan.final.png"), ".png");
/// assert_eq!(extension_suffix("upload"), "");
/// ```
pub fn extension_suffix(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

/// Check if a path names a format the metadata embedder can write to.
pub fn is_taggable_file(path: &Path) -> bool {
    lowercase_extension(path)
        .map(|ext| TAGGABLE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Guess the HTTP content type of a stored photo from its extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use heirloom_common::paths::content_type_for;
///
/// assert_eq!(content_type_for(Path::new("a.JPG")), "image/jpeg");
/// assert_eq!(content_type_for(Path::new("a.bin")), "application/octet-stream");
/// ```
pub fn content_type_for(path: &Path) -> &'static str {
    match lowercase_extension(path).as_deref() {
        Some("jpg" | "jpeg" | "jpe" | "jfif") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}
