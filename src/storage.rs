// SPDX-License-Identifier: GPL-3.0-only

//! Storage for captured photos and recordings

use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const APP_DIR: &str = "camera-session";

/// Source of destination paths for new recordings
pub trait MediaStorage: Send + Sync {
    /// A unique, not yet existing file path for the next recording
    fn url_for_new_recording(&self) -> PathBuf;
}

/// Media directories on disk
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    photos_dir: PathBuf,
    videos_dir: PathBuf,
}

impl MediaLibrary {
    /// Library under the user's Pictures and Videos directories
    pub fn new() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let photos = dirs::picture_dir().unwrap_or_else(|| home.join("Pictures"));
        let videos = dirs::video_dir().unwrap_or_else(|| home.join("Videos"));
        Self {
            photos_dir: photos.join(APP_DIR),
            videos_dir: videos.join(APP_DIR),
        }
    }

    /// Library with both directories below `root`
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            photos_dir: root.join("photos"),
            videos_dir: root.join("videos"),
        }
    }

    pub fn photos_dir(&self) -> &Path {
        &self.photos_dir
    }

    pub fn videos_dir(&self) -> &Path {
        &self.videos_dir
    }

    /// Encode `image` as PNG and write it to the photos directory
    pub async fn save_photo(&self, image: Arc<RgbaImage>) -> Result<PathBuf, String> {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("IMG_{}_{}.png", timestamp, short_id());
        let dir = self.photos_dir.clone();
        let filepath = dir.join(&filename);

        info!(path = %filepath.display(), "Saving photo");

        let filepath_clone = filepath.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&dir)
                .map_err(|e| format!("Failed to create photo directory: {}", e))?;
            image
                .save_with_format(&filepath_clone, image::ImageFormat::Png)
                .map_err(|e| format!("Failed to save photo: {}", e))
        })
        .await
        .map_err(|e| format!("Save task error: {}", e))??;

        Ok(filepath)
    }
}

impl Default for MediaLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaStorage for MediaLibrary {
    fn url_for_new_recording(&self) -> PathBuf {
        if let Err(e) = std::fs::create_dir_all(&self.videos_dir) {
            warn!(dir = %self.videos_dir.display(), error = %e, "Failed to create video directory");
        }
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        self.videos_dir
            .join(format!("VID_{}_{}.mov", timestamp, short_id()))
    }
}

fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_library() -> MediaLibrary {
        let root = std::env::temp_dir().join(format!("camera-session-storage-{}", uuid::Uuid::new_v4()));
        MediaLibrary::with_root(root)
    }

    #[test]
    fn test_recording_urls_are_unique() {
        let library = temp_library();
        let first = library.url_for_new_recording();
        let second = library.url_for_new_recording();

        assert_ne!(first, second);
        assert!(first.starts_with(library.videos_dir()));
        assert_eq!(first.extension().and_then(|e| e.to_str()), Some("mov"));
        assert!(!first.exists());
    }

    #[tokio::test]
    async fn test_save_photo_writes_png() {
        let library = temp_library();
        let image = Arc::new(RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255])));

        let path = library.save_photo(image).await.unwrap();
        assert!(path.exists());
        assert!(path.starts_with(library.photos_dir()));

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        let _ = std::fs::remove_dir_all(library.photos_dir());
    }
}
