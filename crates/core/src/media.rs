//! Source image media types.

use std::path::Path;

use crate::error::CoreError;

/// Media types the video service accepts as a conditioning image.
pub const ACCEPTED_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// File extensions picked up when scanning an input directory.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Fallback when neither the bytes nor the extension identify the file.
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Detect the media type of an image.
///
/// Magic bytes win over the file extension, so a PNG saved as `.jpg`
/// is still reported as `image/png`. The result is not validated here;
/// see [`validate_media_type`].
pub fn detect_media_type(path: &Path, bytes: &[u8]) -> String {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type().to_string();
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => UNKNOWN_MEDIA_TYPE,
    }
    .to_string()
}

/// Reject anything other than the two accepted raster formats.
pub fn validate_media_type(media_type: &str) -> Result<(), CoreError> {
    if ACCEPTED_MEDIA_TYPES.contains(&media_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported image format '{media_type}'. Must be one of: {}",
            ACCEPTED_MEDIA_TYPES.join(", ")
        )))
    }
}

/// Whether a path has one of the [`SUPPORTED_EXTENSIONS`].
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10];

    #[test]
    fn magic_bytes_win_over_extension() {
        assert_eq!(
            detect_media_type(Path::new("photo.jpg"), PNG_MAGIC),
            "image/png"
        );
        assert_eq!(
            detect_media_type(Path::new("photo.png"), JPEG_MAGIC),
            "image/jpeg"
        );
    }

    #[test]
    fn extension_fallback() {
        assert_eq!(
            detect_media_type(Path::new("photo.JPEG"), b"not an image"),
            "image/jpeg"
        );
        assert_eq!(
            detect_media_type(Path::new("photo.bmp2"), b"???"),
            UNKNOWN_MEDIA_TYPE
        );
    }

    #[test]
    fn only_jpeg_and_png_accepted() {
        assert!(validate_media_type("image/jpeg").is_ok());
        assert!(validate_media_type("image/png").is_ok());
        assert!(validate_media_type("image/webp").is_err());
        assert!(validate_media_type(UNKNOWN_MEDIA_TYPE).is_err());
    }

    #[test]
    fn supported_extensions() {
        assert!(has_supported_extension(Path::new("a/b/c.PNG")));
        assert!(has_supported_extension(Path::new("c.jpeg")));
        assert!(!has_supported_extension(Path::new("c.webp")));
        assert!(!has_supported_extension(Path::new("README")));
    }
}
