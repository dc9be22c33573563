use mime_guess::MimeGuess;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs;

use crate::error::{Result, StudioError};

/// Image or video media type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn extension(self) -> &'static str {
        match self {
            MediaType::Image => "png",
            MediaType::Video => "mp4",
        }
    }
}

/// A user-supplied reference image, not yet read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceFile {
    pub path: PathBuf,
    pub mime_type: String,
}

impl ReferenceFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let mime = guess_mime(path);
        if media_type_from_mime(&mime) != Some(MediaType::Image) {
            return Err(StudioError::InvalidInput(format!(
                "reference must be an image, got {mime} for {}",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            mime_type: mime,
        })
    }
}

/// Bytes of a reference file together with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMedia {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Read a reference file into memory.
pub async fn encode(file: &ReferenceFile) -> Result<EncodedMedia> {
    let bytes = fs::read(&file.path)
        .await
        .map_err(|source| StudioError::io(&file.path, source))?;
    Ok(EncodedMedia {
        bytes,
        mime_type: file.mime_type.clone(),
    })
}

/// A materialized artifact that can be shown or downloaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceHandle {
    pub media_type: MediaType,
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Writes generated bytes to a directory using the download naming
/// convention `{prefix}-{unix_millis}.{png|mp4}`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
    prefix: String,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn materialize(&self, bytes: &[u8], mime_type: &str) -> Result<ResourceHandle> {
        let media_type = media_type_from_mime(mime_type).unwrap_or(MediaType::Image);
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StudioError::io(&self.dir, source))?;

        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let mut file_name = format!("{}-{millis}.{}", self.prefix, media_type.extension());
        let mut path = self.dir.join(&file_name);
        let mut suffix = 1;
        while fs::try_exists(&path)
            .await
            .map_err(|source| StudioError::io(&path, source))?
        {
            file_name = format!(
                "{}-{millis}-{suffix}.{}",
                self.prefix,
                media_type.extension()
            );
            path = self.dir.join(&file_name);
            suffix += 1;
        }

        fs::write(&path, bytes)
            .await
            .map_err(|source| StudioError::io(&path, source))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "materialized artifact");

        Ok(ResourceHandle {
            media_type,
            path,
            file_name,
            mime_type: mime_type.to_string(),
            size_bytes: bytes.len() as u64,
        })
    }
}

fn guess_mime(path: &Path) -> String {
    let mime = MimeGuess::from_path(path).first_or_octet_stream();
    mime.essence_str().to_string()
}

pub fn media_type_from_mime(mime: &str) -> Option<MediaType> {
    if mime.starts_with("image/") {
        Some(MediaType::Image)
    } else if mime.starts_with("video/") {
        Some(MediaType::Video)
    } else {
        None
    }
}
