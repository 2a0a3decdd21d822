use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::{parse_parent_ref, CreateLinkRequest, FolderScope, Item, ItemBody, ItemFilter, ItemKind, NewItem},
    services::items::{required_name, ItemStore, ITEM_NAME_MAX},
};

/// Links never count against the storage quota.
pub struct LinkService {
    store: ItemStore,
}

fn validate_url(url: Option<&str>) -> Result<String> {
    let url = url.map(str::trim).unwrap_or_default();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(AppError::InvalidInput("A valid http(s) URL is required".to_string()))
    }
}

impl LinkService {
    pub fn new(store: ItemStore) -> Self {
        Self { store }
    }

    pub async fn list(&self, user_id: Uuid, folder: FolderScope) -> Result<Vec<Item>> {
        self.store
            .list(user_id, &ItemFilter::of_kind(ItemKind::Link, folder))
            .await
    }

    pub async fn create(&self, user_id: Uuid, request: CreateLinkRequest) -> Result<Item> {
        let url = validate_url(request.url.as_deref())?;
        let name = match request.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => required_name(Some(name), ITEM_NAME_MAX)?,
            // Untitled links are named after their URL, cut to fit.
            _ => url.chars().take(ITEM_NAME_MAX).collect(),
        };
        let folder_id = parse_parent_ref(request.folder_id.as_deref())?;

        self.store
            .insert(NewItem {
                user_id,
                name,
                body: ItemBody::Link { url },
                size: 0,
                folder_id,
            })
            .await
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<Item> {
        self.store.remove(id, user_id, Some(ItemKind::Link)).await
    }
}
