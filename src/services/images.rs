use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::{FolderScope, Item, ItemFilter, ItemKind},
    services::items::{ItemStore, Upload},
    storage::BlobKind,
};

pub const INVALID_IMAGE_TYPE: &str = "Invalid file type. Only JPEG, PNG, and WebP images are allowed.";

/// Accepts `image/jpeg` (or the common `image/jpg` alias), `image/png` and
/// `image/webp` uploads.
pub fn validate_image_type(content_type: Option<&str>) -> Result<()> {
    let mime: mime::Mime = content_type
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| AppError::InvalidInput(INVALID_IMAGE_TYPE.to_string()))?;

    let allowed = mime.type_() == mime::IMAGE
        && (mime.subtype() == mime::JPEG
            || mime.subtype() == "jpg"
            || mime.subtype() == mime::PNG
            || mime.subtype() == "webp");
    if allowed {
        Ok(())
    } else {
        Err(AppError::InvalidInput(INVALID_IMAGE_TYPE.to_string()))
    }
}

pub struct ImageService {
    store: ItemStore,
}

impl ImageService {
    pub fn new(store: ItemStore) -> Self {
        Self { store }
    }

    pub async fn list(&self, user_id: Uuid, folder: FolderScope) -> Result<Vec<Item>> {
        self.store
            .list(user_id, &ItemFilter::of_kind(ItemKind::Image, folder))
            .await
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Item> {
        self.store.get(id, user_id, Some(ItemKind::Image)).await
    }

    pub async fn upload(&self, user_id: Uuid, upload: Upload) -> Result<Item> {
        validate_image_type(upload.content_type.as_deref())?;
        self.store.upload(user_id, BlobKind::Image, upload).await
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<Item> {
        self.store.remove(id, user_id, Some(ItemKind::Image)).await
    }
}
