use uuid::Uuid;

use crate::{
    errors::Result,
    models::{FileListQuery, FolderScope, Item, ItemFilter, ItemKind},
    services::items::ItemStore,
};

/// Kind-agnostic access to a user's items.
pub struct FileService {
    store: ItemStore,
}

impl FileService {
    pub fn new(store: ItemStore) -> Self {
        Self { store }
    }

    pub async fn list(&self, user_id: Uuid, query: &FileListQuery) -> Result<Vec<Item>> {
        let filter = ItemFilter {
            kind: query
                .kind
                .as_deref()
                .filter(|kind| !kind.is_empty())
                .map(str::parse::<ItemKind>)
                .transpose()?,
            folder: FolderScope::parse(query.folder_id.as_deref())?,
            favorite: query.is_favorite,
        };

        self.store.list(user_id, &filter).await
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Item> {
        self.store.get(id, user_id, None).await
    }

    /// Same quota reversal and blob cleanup as the per-type deletes.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<Item> {
        self.store.remove(id, user_id, None).await
    }
}
