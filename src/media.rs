use std::fmt;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::forms::multipart::UploadedFile;

/// Per-file upload limit for attachments, avatars and timeline images.
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// URL prefix the uploads directory is served under.
pub const MEDIA_URL: &str = "/media";

/// Upload subdirectories below the storage root.
pub const ATTACHMENTS_DIR: &str = "attachments";
pub const TIMELINE_DIR: &str = "timeline";
pub const AVATARS_DIR: &str = "avatars";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Gif,
    Audio,
    Other,
}

impl MediaKind {
    /// Tag a file by the last dot-separated segment of its name, case-insensitively.
    pub fn from_file_name(name: &str) -> Self {
        match extension(name).as_str() {
            "jpg" | "jpeg" | "png" => MediaKind::Image,
            "gif" => MediaKind::Gif,
            "mp3" | "wav" => MediaKind::Audio,
            _ => MediaKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Gif => "gif",
            MediaKind::Audio => "audio",
            MediaKind::Other => "other",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased text after the last dot; the whole name when there is none.
pub fn extension(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_lowercase()
}

/// Extensions accepted for avatars and timeline images.
pub fn is_image_name(name: &str) -> bool {
    matches!(extension(name).as_str(), "jpg" | "jpeg" | "png" | "gif")
}

/// Stored uploads directory. Files land at `<root>/<subdir>/<uuid>.<ext>`;
/// the client-supplied name only contributes a sanitized extension.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an uploaded file and return its path relative to the uploads root.
    pub async fn save(&self, subdir: &str, file: &UploadedFile) -> std::io::Result<String> {
        let dir = self.root.join(subdir);
        tokio::fs::create_dir_all(&dir).await?;

        let ext = safe_extension(&file.file_name);
        let name = match ext {
            Some(ext) => format!("{}.{}", uuid::Uuid::now_v7(), ext),
            None => uuid::Uuid::now_v7().to_string(),
        };

        let mut out = tokio::fs::File::create(dir.join(&name)).await?;
        out.write_all(&file.data).await?;
        out.flush().await?;

        tracing::debug!("Stored upload {} ({} bytes)", name, file.data.len());
        Ok(format!("{}/{}", subdir, name))
    }

    /// Remove files written by `save` whose database rows never landed.
    pub async fn discard(&self, relative: &[String]) {
        for path in relative {
            if let Err(e) = tokio::fs::remove_file(self.root.join(path)).await {
                tracing::warn!("Failed to remove orphaned upload {}: {}", path, e);
            }
        }
    }

    pub fn url(relative: &str) -> String {
        format!("{}/{}", MEDIA_URL, relative)
    }
}

fn safe_extension(name: &str) -> Option<String> {
    if !name.contains('.') {
        return None;
    }
    let ext = extension(name);
    let valid = !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(ext)
}
