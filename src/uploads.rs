use axum::extract::multipart::Field;
use chrono::Utc;
use rand::Rng;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tempfile::TempPath;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Multipart field that carries the image.
pub const IMAGE_FIELD: &str = "image";
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
/// URL prefix the uploads directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_IMAGE_TYPES: &[&str] = &["jpeg", "jpg", "png", "gif", "webp"];
const INCOMING_DIR: &str = ".incoming";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Only images are allowed (jpeg, jpg, png, gif, webp)")]
    UnsupportedFileType,
    #[error("File exceeds the {} MiB limit", .limit / (1024 * 1024))]
    TooLarge { limit: usize },
    #[error("Only one image per request is allowed")]
    TooManyFiles,
    #[error("Unexpected file field '{0}'")]
    UnexpectedField(String),
    #[error("Malformed upload: {0}")]
    Malformed(String),
    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    News,
    Gallery,
}

impl UploadKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            UploadKind::News => "news",
            UploadKind::Gallery => "gallery",
        }
    }

    /// Gallery routes always store under `gallery`. Anything else does too
    /// when the form says `type=gallery`.
    pub fn resolve(route: UploadKind, declared_type: Option<&str>) -> Self {
        match (route, declared_type) {
            (UploadKind::Gallery, _) | (_, Some("gallery")) => UploadKind::Gallery,
            _ => UploadKind::News,
        }
    }
}

/// An accepted image sitting in the incoming directory. Dropping it without
/// calling [`StagedImage::commit`] deletes the file.
#[derive(Debug)]
pub struct StagedImage {
    temp: TempPath,
    file_name: String,
    size: usize,
}

impl StagedImage {
    /// Moves the image into its category directory and returns its public path.
    pub async fn commit(self, uploads: &Uploads, kind: UploadKind) -> Result<String, UploadError> {
        let dir = uploads.directory(kind);
        fs::create_dir_all(&dir).await?;

        let destination = dir.join(&self.file_name);
        self.temp.persist(&destination).map_err(|e| e.error)?;

        tracing::info!(path = %destination.display(), bytes = self.size, "Stored upload");
        Ok(format!("{}/{}/{}", PUBLIC_PREFIX, kind.dir_name(), self.file_name))
    }
}

/// The uploads directory, partitioned by category.
#[derive(Debug, Clone)]
pub struct Uploads {
    root: PathBuf,
    max_bytes: usize,
}

impl Uploads {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }

    pub fn directory(&self, kind: UploadKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    pub fn incoming_dir(&self) -> PathBuf {
        self.root.join(INCOMING_DIR)
    }

    /// Validates the part headers, then streams the body into a temp file,
    /// giving up as soon as the size limit is crossed.
    pub async fn stage(&self, mut field: Field<'_>) -> Result<StagedImage, UploadError> {
        let original_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);

        tracing::debug!(
            file = %original_name,
            content_type = ?content_type,
            "Receiving upload"
        );

        let extension = validate_image(&original_name, content_type.as_deref())?;

        let incoming = self.incoming_dir();
        fs::create_dir_all(&incoming).await?;
        let temp = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(&incoming)?
            .into_temp_path();

        let mut file = fs::File::create(&temp).await?;
        let mut size = 0usize;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| UploadError::Malformed(e.to_string()))?
        {
            size += chunk.len();
            if size > self.max_bytes {
                tracing::warn!(file = %original_name, "Rejected oversized upload");
                return Err(UploadError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(StagedImage {
            temp,
            file_name: generate_file_name(&extension),
            size,
        })
    }

    /// Maps a stored public path such as `/uploads/news/x.png` back to disk.
    /// Paths outside the uploads prefix or with `..`-style parts map to nothing.
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let relative = public_path
            .strip_prefix(PUBLIC_PREFIX)?
            .strip_prefix('/')?;
        let relative = Path::new(relative);

        if relative.as_os_str().is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }

        Some(self.root.join(relative))
    }

    /// Best-effort removal of a stored image. Never fails the caller.
    pub async fn remove(&self, public_path: &str) {
        let Some(path) = self.resolve(public_path) else {
            tracing::warn!(image = public_path, "Refusing to remove image outside uploads");
            return;
        };

        match fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed image"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Image already gone")
            }
            Err(e) => tracing::warn!(path = %path.display(), "Failed to remove image: {}", e),
        }
    }
}

/// Checks the original file name and the declared MIME type against the image
/// allow-list. Returns the lowercased extension.
pub fn validate_image(file_name: &str, content_type: Option<&str>) -> Result<String, UploadError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|e| ALLOWED_IMAGE_TYPES.contains(&e.as_str()))
        .ok_or(UploadError::UnsupportedFileType)?;

    let declared: mime::Mime = content_type
        .and_then(|ct| ct.parse().ok())
        .ok_or(UploadError::UnsupportedFileType)?;
    if declared.type_() != mime::IMAGE
        || !ALLOWED_IMAGE_TYPES.contains(&declared.subtype().as_str())
    {
        return Err(UploadError::UnsupportedFileType);
    }

    Ok(extension)
}

/// `{millis}-{random below 1e9}.{ext}`
fn generate_file_name(extension: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{}-{}.{}", Utc::now().timestamp_millis(), suffix, extension)
}
