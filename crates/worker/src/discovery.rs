//! Input image discovery.

use std::io;
use std::path::{Path, PathBuf};

use showreel_core::media::has_supported_extension;

/// List the supported images directly inside `dir`, sorted by path so
/// batch order (and therefore seeded scenario selection) is stable.
pub fn discover_images(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && has_supported_extension(&path) {
            images.push(path);
        }
    }
    images.sort();
    tracing::debug!(dir = %dir.display(), count = images.len(), "Discovered input images");
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_supported_images_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "c.jpeg", "notes.txt", "d.webp"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let found: Vec<String> = discover_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(found, vec!["a.JPG", "b.png", "c.jpeg"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_images(&dir.path().join("absent")).is_err());
    }
}
