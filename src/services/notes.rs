use uuid::Uuid;

use crate::{
    errors::Result,
    models::{
        parse_parent_ref, CreateNoteRequest, FolderScope, Item, ItemBody, ItemFilter, ItemKind,
        NewItem, NoteChanges, UpdateNoteRequest,
    },
    services::items::{required_name, ItemStore, ITEM_NAME_MAX},
};

pub struct NoteService {
    store: ItemStore,
}

impl NoteService {
    pub fn new(store: ItemStore) -> Self {
        Self { store }
    }

    pub async fn list(&self, user_id: Uuid, folder: FolderScope) -> Result<Vec<Item>> {
        self.store
            .list(user_id, &ItemFilter::of_kind(ItemKind::Note, folder))
            .await
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Item> {
        self.store.get(id, user_id, Some(ItemKind::Note)).await
    }

    pub async fn create(&self, user_id: Uuid, request: CreateNoteRequest) -> Result<Item> {
        let name = required_name(request.name.as_deref(), ITEM_NAME_MAX)?;
        let folder_id = parse_parent_ref(request.folder_id.as_deref())?;
        let content = request.content.unwrap_or_default();

        self.store
            .insert(NewItem {
                user_id,
                name,
                size: content.len() as i64,
                body: ItemBody::Note { content },
                folder_id,
            })
            .await
    }

    /// Size is recomputed from the new content; only a net increase is
    /// checked against the quota. A blank name leaves the current one.
    pub async fn update(&self, id: Uuid, user_id: Uuid, request: UpdateNoteRequest) -> Result<Item> {
        let name = match request.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(required_name(Some(name), ITEM_NAME_MAX)?),
            _ => None,
        };

        let changes = NoteChanges {
            name,
            content: request.content,
        };
        let note = self
            .store
            .observe(self.store.repository().update_note(id, user_id, changes).await)?;

        tracing::info!(item_id = %note.id, user_id = %user_id, size = note.size, "Note updated");
        Ok(note)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<Item> {
        self.store.remove(id, user_id, Some(ItemKind::Note)).await
    }
}
