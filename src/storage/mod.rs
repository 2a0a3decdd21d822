use async_trait::async_trait;

use crate::{errors::Result, models::ItemKind};

pub mod local;

pub use local::LocalBlobStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    Image,
    Pdf,
}

impl BlobKind {
    pub fn directory(&self) -> &'static str {
        match self {
            BlobKind::Image => "images",
            BlobKind::Pdf => "pdfs",
        }
    }

    pub fn item_kind(&self) -> ItemKind {
        match self {
            BlobKind::Image => ItemKind::Image,
            BlobKind::Pdf => ItemKind::Pdf,
        }
    }
}

/// Result of persisting an uploaded binary.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    /// Public URL, recorded as the item's `filePath`.
    pub url: String,
    /// Location relative to the store root.
    pub path: String,
    /// Bytes actually written, which differs from the upload for transcoded images.
    pub size: i64,
}

/// Binary persistence for image and PDF items.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store(&self, data: Vec<u8>, kind: BlobKind, original_name: &str) -> Result<StoredBlob>;

    /// Removes a blob previously returned by `store`, addressed by its URL.
    async fn delete(&self, url: &str) -> Result<()>;
}
