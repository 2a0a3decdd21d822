use async_trait::async_trait;
use image::{imageops::FilterType, DynamicImage, ImageOutputFormat};
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::{
    config::Config,
    errors::{AppError, Result},
    storage::{BlobKind, BlobStore, StoredBlob},
};

const PDF_MAGIC: &[u8] = b"%PDF-";

pub struct LocalBlobStore {
    base_path: PathBuf,
    public_url: String,
    max_dimension: u32,
    quality: u8,
}

impl LocalBlobStore {
    pub fn new<P: AsRef<Path>>(
        base_path: P,
        public_url: &str,
        max_dimension: u32,
        quality: u8,
    ) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            AppError::UpstreamUpload(format!("Failed to create storage directory: {}", e))
        })?;

        Ok(Self {
            base_path,
            public_url: public_url.trim_end_matches('/').to_string(),
            max_dimension,
            quality,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.upload_dir,
            &config.public_upload_url,
            config.image_max_dimension,
            config.image_quality,
        )
    }

    fn full_path(&self, relative: &str) -> PathBuf {
        self.base_path.join(relative)
    }

    /// Maps a public URL back to a path under the store root, refusing
    /// anything that would escape it.
    fn relative_from_url<'a>(&self, url: &'a str) -> Result<&'a str> {
        let relative = url
            .strip_prefix(self.public_url.as_str())
            .map(|rest| rest.trim_start_matches('/'))
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| AppError::InvalidInput(format!("Not a stored file: {}", url)))?;

        let escapes = Path::new(relative)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(AppError::InvalidInput(format!("Not a stored file: {}", url)));
        }

        Ok(relative)
    }

    async fn write(&self, relative: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(relative);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::UpstreamUpload(format!("Failed to create directory: {}", e))
            })?;
        }

        fs::write(&full_path, data)
            .await
            .map_err(|e| AppError::UpstreamUpload(format!("Failed to write file: {}", e)))
    }
}

/// Decodes an uploaded image, shrinks it to fit within `max_dimension`
/// (never enlarging) and re-encodes it as JPEG.
pub fn transcode_image(data: &[u8], max_dimension: u32, quality: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::InvalidInput(format!("Invalid image data: {}", e)))?;

    let img = if img.width() > max_dimension || img.height() > max_dimension {
        img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        img
    };

    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_to(&mut Cursor::new(&mut buffer), ImageOutputFormat::Jpeg(quality))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode image: {}", e)))?;

    Ok(buffer)
}

pub fn validate_pdf(data: &[u8]) -> Result<()> {
    if data.starts_with(PDF_MAGIC) {
        Ok(())
    } else {
        Err(AppError::InvalidInput("Only PDF files are allowed".to_string()))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, data: Vec<u8>, kind: BlobKind, original_name: &str) -> Result<StoredBlob> {
        let (bytes, extension) = match kind {
            BlobKind::Image => {
                let (max_dimension, quality) = (self.max_dimension, self.quality);
                let encoded = tokio::task::spawn_blocking(move || {
                    transcode_image(&data, max_dimension, quality)
                })
                .await
                .map_err(|e| AppError::Internal(e.into()))??;
                (encoded, "jpg")
            }
            BlobKind::Pdf => {
                validate_pdf(&data)?;
                (data, "pdf")
            }
        };

        let path = format!("{}/{}.{}", kind.directory(), Uuid::new_v4(), extension);
        self.write(&path, &bytes).await?;

        tracing::debug!(
            original_name,
            path = %path,
            size = bytes.len(),
            "Stored uploaded file"
        );

        Ok(StoredBlob {
            url: format!("{}/{}", self.public_url, path),
            path,
            size: bytes.len() as i64,
        })
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let relative = self.relative_from_url(url)?;

        fs::remove_file(self.full_path(relative))
            .await
            .map_err(|e| AppError::UpstreamUpload(format!("Failed to delete file: {}", e)))
    }
}
