use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::{FolderScope, Item, ItemFilter, ItemKind},
    services::items::{ItemStore, Upload},
    storage::BlobKind,
};

pub fn validate_pdf_type(content_type: Option<&str>) -> Result<()> {
    let is_pdf = content_type
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .map_or(false, |mime| mime.essence_str() == mime::APPLICATION_PDF.essence_str());

    if is_pdf {
        Ok(())
    } else {
        Err(AppError::InvalidInput("Only PDF files are allowed".to_string()))
    }
}

pub struct PdfService {
    store: ItemStore,
}

impl PdfService {
    pub fn new(store: ItemStore) -> Self {
        Self { store }
    }

    pub async fn list(&self, user_id: Uuid, folder: FolderScope) -> Result<Vec<Item>> {
        self.store
            .list(user_id, &ItemFilter::of_kind(ItemKind::Pdf, folder))
            .await
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Item> {
        self.store.get(id, user_id, Some(ItemKind::Pdf)).await
    }

    pub async fn upload(&self, user_id: Uuid, upload: Upload) -> Result<Item> {
        validate_pdf_type(upload.content_type.as_deref())?;
        self.store.upload(user_id, BlobKind::Pdf, upload).await
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<Item> {
        self.store.remove(id, user_id, Some(ItemKind::Pdf)).await
    }
}
