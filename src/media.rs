//! # Media Attachment Module
//!
//! Questo modulo gestisce le operazioni sui file media allegati a post e story.
//!
//! ## Responsabilità:
//! - Determinazione tipo file (immagine vs video) e MIME type per il multipart
//! - Lettura dimensione e modification time dei file
//! - Discovery ricorsiva di media in una directory (supporto `--media-dir`)
//! - Formattazione human-readable delle dimensioni per i log
//!
//! ## Formati supportati:
//! - **Immagini**: JPG, JPEG, PNG, WebP
//! - **Video**: MP4, MOV, AVI, MKV, WebM

use anyhow::Result;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use walkdir::WalkDir;

/// Broad category of a media attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Media file helpers
pub struct MediaFiles;

impl MediaFiles {
    /// Classify a file by extension
    pub fn kind_of(path: &Path) -> Option<MediaKind> {
        if Self::is_image(path) {
            Some(MediaKind::Image)
        } else if Self::is_video(path) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Check if a file format is supported
    pub fn is_supported_format(path: &Path) -> bool {
        Self::kind_of(path).is_some()
    }

    /// Check if a file is an image
    pub fn is_image(path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            matches!(ext_lower.as_str(), "jpg" | "jpeg" | "png" | "webp")
        } else {
            false
        }
    }

    /// Check if a file is a video
    pub fn is_video(path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            matches!(ext_lower.as_str(), "mp4" | "mov" | "avi" | "mkv" | "webm")
        } else {
            false
        }
    }

    /// MIME type used for the multipart upload part
    pub fn mime_type(path: &Path) -> &'static str {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "mp4" => "video/mp4",
            "mov" => "video/quicktime",
            "avi" => "video/x-msvideo",
            "mkv" => "video/x-matroska",
            "webm" => "video/webm",
            _ => "application/octet-stream",
        }
    }

    /// Get information about a file (size and modification time)
    pub async fn get_file_info(path: &Path) -> Result<(u64, u64)> {
        let metadata = fs::metadata(path).await?;
        let size = metadata.len();
        let modified = metadata
            .modified()?
            .duration_since(SystemTime::UNIX_EPOCH)?
            .as_secs();
        Ok((size, modified))
    }

    /// Total size of a batch of attachments, fetched concurrently
    pub async fn total_size(paths: &[PathBuf]) -> Result<u64> {
        let infos = join_all(paths.iter().map(|p| Self::get_file_info(p))).await;
        let mut total = 0u64;
        for info in infos {
            total += info?.0;
        }
        Ok(total)
    }

    /// Find all supported media files in a directory
    pub fn collect_media_files(media_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(media_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if Self::is_supported_format(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_kind_detection() {
        assert_eq!(MediaFiles::kind_of(Path::new("a.JPG")), Some(MediaKind::Image));
        assert_eq!(MediaFiles::kind_of(Path::new("b.webm")), Some(MediaKind::Video));
        assert_eq!(MediaFiles::kind_of(Path::new("c.txt")), None);
        assert_eq!(MediaFiles::kind_of(Path::new("noext")), None);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(MediaFiles::mime_type(Path::new("x.jpeg")), "image/jpeg");
        assert_eq!(MediaFiles::mime_type(Path::new("x.mov")), "video/quicktime");
        assert_eq!(MediaFiles::mime_type(Path::new("x.bin")), "application/octet-stream");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(MediaFiles::format_size(512), "512 B");
        assert_eq!(MediaFiles::format_size(1536), "1.50 KB");
        assert_eq!(MediaFiles::format_size(1024 * 1024), "1.00 MB");
    }

    #[test]
    fn test_collect_media_files() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::write(temp_dir.path().join("b.mp4"), b"x").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(temp_dir.path().join("sub")).unwrap();
        std::fs::write(temp_dir.path().join("sub/c.png"), b"x").unwrap();

        let files = MediaFiles::collect_media_files(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| MediaFiles::is_supported_format(f)));
    }

    #[tokio::test]
    async fn test_total_size() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.jpg");
        let b = temp_dir.path().join("b.png");
        std::fs::write(&a, vec![0u8; 10]).unwrap();
        std::fs::write(&b, vec![0u8; 20]).unwrap();

        let total = MediaFiles::total_size(&[a, b]).await.unwrap();
        assert_eq!(total, 30);
    }
}
