//! Shared item plumbing used by the per-type services and the generic file
//! façade: owner and folder resolution, quota pre-checks, the two-phase
//! upload-then-commit create for binaries and the delete path.

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    database::Repository,
    errors::{AppError, Result},
    ledger::bytes_to_gb,
    models::{Item, ItemBody, ItemFilter, ItemKind, NewItem, User},
    services::MetricsService,
    storage::{BlobKind, BlobStore},
};

/// An uploaded binary on its way into the store.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: Option<String>,
    pub original_name: String,
    pub content_type: Option<String>,
    pub folder_id: Option<Uuid>,
    pub data: Vec<u8>,
}

impl Upload {
    /// The explicit `name` field, falling back to the uploaded file name.
    fn display_name(&self) -> Result<String> {
        let explicit = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        required_name(explicit.or(Some(self.original_name.as_str())), ITEM_NAME_MAX)
    }
}

/// Longest name accepted for notes, images, PDFs and links.
pub const ITEM_NAME_MAX: usize = 200;

/// Trims `name` and enforces it is present and at most `max_chars` characters.
pub fn required_name(name: Option<&str>, max_chars: usize) -> Result<String> {
    let name = name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Name is required".to_string()))?;

    if name.chars().count() > max_chars {
        return Err(AppError::InvalidInput(format!(
            "Name cannot exceed {} characters",
            max_chars
        )));
    }
    Ok(name.to_string())
}

#[derive(Clone)]
pub struct ItemStore {
    repository: Arc<dyn Repository>,
    blobs: Arc<dyn BlobStore>,
    metrics: MetricsService,
}

impl ItemStore {
    pub fn new(repository: Arc<dyn Repository>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            repository,
            blobs,
            metrics: MetricsService::new(),
        }
    }

    pub fn repository(&self) -> &dyn Repository {
        self.repository.as_ref()
    }

    pub async fn owner(&self, user_id: Uuid) -> Result<User> {
        self.repository
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Items may only be placed in folders owned by the same user.
    pub async fn ensure_folder(&self, user_id: Uuid, folder_id: Option<Uuid>) -> Result<()> {
        if let Some(folder_id) = folder_id {
            self.repository
                .find_folder(folder_id, user_id)
                .await?
                .ok_or_else(|| AppError::not_found("Folder"))?;
        }
        Ok(())
    }

    pub async fn list(&self, user_id: Uuid, filter: &ItemFilter) -> Result<Vec<Item>> {
        self.repository.list_items(user_id, filter).await
    }

    /// Looks up an owned item, optionally restricted to one kind. The error
    /// names the kind the caller asked for.
    pub async fn get(&self, id: Uuid, user_id: Uuid, kind: Option<ItemKind>) -> Result<Item> {
        self.repository
            .find_item(id, user_id, kind)
            .await?
            .ok_or_else(|| AppError::not_found(kind.map_or("File", |kind| kind.label())))
    }

    /// Records quota rejections on the way out.
    pub fn observe<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(AppError::QuotaExceeded(_)) = &result {
            self.metrics.record_quota_rejection();
        }
        result
    }

    /// Inserts a text-backed item (note or link) and charges its size.
    pub async fn insert(&self, new_item: NewItem) -> Result<Item> {
        let owner = self.owner(new_item.user_id).await?;
        self.ensure_folder(owner.id, new_item.folder_id).await?;
        self.observe(owner.ledger().ensure_fits(bytes_to_gb(new_item.size)))?;

        let item = self.observe(self.repository.insert_item(new_item).await)?;
        self.metrics.record_item_created(item.kind(), item.size);
        tracing::info!(
            item_id = %item.id,
            user_id = %item.user_id,
            kind = %item.kind(),
            size = item.size,
            "Item created"
        );
        Ok(item)
    }

    /// Two-phase create for binaries: quota pre-check, upload, then the
    /// record and ledger commit. A failed commit deletes the uploaded blob
    /// before the original error is returned.
    pub async fn upload(&self, user_id: Uuid, kind: BlobKind, upload: Upload) -> Result<Item> {
        if upload.data.is_empty() {
            return Err(AppError::InvalidInput("Uploaded file is empty".to_string()));
        }
        let name = upload.display_name()?;

        let owner = self.owner(user_id).await?;
        self.ensure_folder(owner.id, upload.folder_id).await?;

        let size = upload.data.len() as i64;
        self.observe(owner.ledger().ensure_fits(bytes_to_gb(size)))?;

        let blob = self
            .blobs
            .store(upload.data, kind, &upload.original_name)
            .await?;

        let new_item = NewItem {
            user_id,
            name,
            body: ItemBody::binary(kind.item_kind(), blob.url.clone())?,
            size,
            folder_id: upload.folder_id,
        };

        match self.observe(self.repository.insert_item(new_item).await) {
            Ok(item) => {
                self.metrics.record_item_created(item.kind(), item.size);
                tracing::info!(
                    item_id = %item.id,
                    user_id = %user_id,
                    kind = %item.kind(),
                    size = item.size,
                    stored_size = blob.size,
                    "File uploaded"
                );
                Ok(item)
            }
            Err(error) => {
                if let Err(cleanup) = self.blobs.delete(&blob.url).await {
                    tracing::warn!(
                        url = %blob.url,
                        "Failed to remove uploaded file after rejected commit: {}",
                        cleanup
                    );
                } else {
                    tracing::warn!(url = %blob.url, "Removed uploaded file after rejected commit");
                }
                Err(error)
            }
        }
    }

    /// Deletes an owned item. Blob removal is best-effort; the record is
    /// removed and its size refunded even when the blob cannot be deleted.
    pub async fn remove(&self, id: Uuid, user_id: Uuid, kind: Option<ItemKind>) -> Result<Item> {
        let item = self.get(id, user_id, kind).await?;

        if let Some(url) = item.body.file_path() {
            if let Err(e) = self.blobs.delete(url).await {
                tracing::warn!(item_id = %item.id, url, "Failed to delete stored file: {}", e);
            }
        }

        let removed = self.repository.delete_item(item.id, user_id).await?;
        self.metrics.record_item_deleted(removed.kind());
        tracing::info!(
            item_id = %removed.id,
            user_id = %user_id,
            kind = %removed.kind(),
            size = removed.size,
            "Item deleted"
        );
        Ok(removed)
    }
}
