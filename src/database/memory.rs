use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    database::Repository,
    errors::{AppError, Result},
    ledger::{bytes_to_gb, resize_delta_gb},
    models::*,
};

/// In-process store. Every operation runs under one lock, which serialises
/// ledger updates the same way the conditional SQL updates do.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    // Kept in creation order; reverse iteration yields newest first.
    items: Vec<Item>,
    folders: Vec<Folder>,
}

impl MemoryState {
    fn active_user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users.get_mut(&id).filter(|user| !user.is_deleted)
    }

    fn owned_folder(&self, id: Uuid, user_id: Uuid) -> Option<&Folder> {
        self.folders
            .iter()
            .find(|folder| folder.id == id && folder.user_id == user_id)
    }

    fn owned_item_index(&self, id: Uuid, user_id: Uuid) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.id == id && item.user_id == user_id)
    }

    fn charge(&mut self, user_id: Uuid, delta_gb: f64) -> Result<()> {
        let user = self
            .active_user_mut(user_id)
            .ok_or_else(|| AppError::not_found("User"))?;

        let mut ledger = user.ledger();
        user.used_storage = ledger.charge(delta_gb)?;
        user.updated_at = Utc::now();
        tracing::debug!(%user_id, delta_gb, used = user.used_storage, "Storage ledger updated");
        Ok(())
    }

    fn newest_first<'a>(&'a self, user_id: Uuid) -> impl Iterator<Item = &'a Item> + 'a {
        self.items
            .iter()
            .rev()
            .filter(move |item| item.user_id == user_id)
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|user| user.email == new_user.email) {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            storage_limit: new_user.storage_limit,
            used_storage: 0.0,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).filter(|user| !user.is_deleted).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|user| user.email == email && !user.is_deleted)
            .cloned())
    }

    async fn update_user_name(&self, id: Uuid, name: &str) -> Result<Option<User>> {
        let mut state = self.state.lock().await;
        Ok(state.active_user_mut(id).map(|user| {
            user.name = name.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        Ok(state
            .active_user_mut(id)
            .map(|user| {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn soft_delete_user(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().await;
        Ok(state
            .active_user_mut(id)
            .map(|user| {
                let now = Utc::now();
                user.is_deleted = true;
                user.deleted_at = Some(now);
                user.updated_at = now;
            })
            .is_some())
    }

    async fn list_items(&self, user_id: Uuid, filter: &ItemFilter) -> Result<Vec<Item>> {
        let state = self.state.lock().await;
        Ok(state
            .newest_first(user_id)
            .filter(|item| filter.matches(item))
            .cloned()
            .collect())
    }

    async fn find_item(&self, id: Uuid, user_id: Uuid, kind: Option<ItemKind>) -> Result<Option<Item>> {
        let state = self.state.lock().await;
        Ok(state
            .owned_item_index(id, user_id)
            .map(|index| &state.items[index])
            .filter(|item| kind.map_or(true, |kind| item.kind() == kind))
            .cloned())
    }

    async fn insert_item(&self, new_item: NewItem) -> Result<Item> {
        let mut state = self.state.lock().await;

        if let Some(folder_id) = new_item.folder_id {
            state
                .owned_folder(folder_id, new_item.user_id)
                .ok_or_else(|| AppError::not_found("Folder"))?;
        }

        state.charge(new_item.user_id, bytes_to_gb(new_item.size))?;

        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4(),
            user_id: new_item.user_id,
            name: new_item.name,
            body: new_item.body,
            size: new_item.size,
            folder_id: new_item.folder_id,
            is_favorite: false,
            created_at: now,
            updated_at: now,
        };
        state.items.push(item.clone());
        Ok(item)
    }

    async fn update_note(&self, id: Uuid, user_id: Uuid, changes: NoteChanges) -> Result<Item> {
        let mut state = self.state.lock().await;

        let index = state
            .owned_item_index(id, user_id)
            .filter(|&index| state.items[index].kind() == ItemKind::Note)
            .ok_or_else(|| AppError::not_found("Note"))?;

        if let Some(content) = &changes.content {
            let delta = resize_delta_gb(state.items[index].size, content.len() as i64);
            state.charge(user_id, delta)?;
        }

        let note = &mut state.items[index];
        if let Some(name) = changes.name {
            note.name = name;
        }
        if let Some(content) = changes.content {
            note.size = content.len() as i64;
            note.body = ItemBody::Note { content };
        }
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    async fn set_favorite(&self, id: Uuid, user_id: Uuid, change: FavoriteChange) -> Result<Item> {
        let mut state = self.state.lock().await;
        let index = state
            .owned_item_index(id, user_id)
            .ok_or_else(|| AppError::not_found("Item"))?;

        let item = &mut state.items[index];
        item.is_favorite = change.apply(item.is_favorite);
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete_item(&self, id: Uuid, user_id: Uuid) -> Result<Item> {
        let mut state = self.state.lock().await;
        let index = state
            .owned_item_index(id, user_id)
            .ok_or_else(|| AppError::not_found("Item"))?;

        let size_gb = bytes_to_gb(state.items[index].size);
        if let Some(user) = state.users.get_mut(&user_id) {
            let mut ledger = user.ledger();
            user.used_storage = ledger.refund(size_gb);
            user.updated_at = Utc::now();
        }

        Ok(state.items.remove(index))
    }

    async fn kind_totals(&self, user_id: Uuid) -> Result<Vec<KindTotals>> {
        let state = self.state.lock().await;
        let mut totals: HashMap<ItemKind, (i64, i64)> = HashMap::new();
        for item in state.newest_first(user_id) {
            let entry = totals.entry(item.kind()).or_default();
            entry.0 += 1;
            entry.1 += item.size;
        }

        Ok(totals
            .into_iter()
            .map(|(kind, (count, total_size))| KindTotals {
                kind: kind.as_str().to_string(),
                count,
                total_size,
            })
            .collect())
    }

    async fn recent_items(&self, user_id: Uuid, limit: usize) -> Result<Vec<Item>> {
        let state = self.state.lock().await;
        Ok(state.newest_first(user_id).take(limit).cloned().collect())
    }

    async fn search_items(&self, user_id: Uuid, keyword: &str) -> Result<Vec<Item>> {
        let needle = keyword.to_lowercase();
        let state = self.state.lock().await;
        Ok(state
            .newest_first(user_id)
            .filter(|item| item.matches_keyword(&needle))
            .cloned()
            .collect())
    }

    async fn list_folders(&self, user_id: Uuid, parent: FolderScope) -> Result<Vec<Folder>> {
        let state = self.state.lock().await;
        Ok(state
            .folders
            .iter()
            .rev()
            .filter(|folder| folder.user_id == user_id && parent.matches(folder.parent_id))
            .cloned()
            .collect())
    }

    async fn find_folder(&self, id: Uuid, user_id: Uuid) -> Result<Option<Folder>> {
        let state = self.state.lock().await;
        Ok(state.owned_folder(id, user_id).cloned())
    }

    async fn insert_folder(&self, user_id: Uuid, name: &str, parent_id: Option<Uuid>) -> Result<Folder> {
        let mut state = self.state.lock().await;

        if let Some(parent_id) = parent_id {
            state
                .owned_folder(parent_id, user_id)
                .ok_or_else(|| AppError::not_found("Parent folder"))?;
        }

        let now = Utc::now();
        let folder = Folder {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            parent_id,
            created_at: now,
            updated_at: now,
        };
        state.folders.push(folder.clone());
        Ok(folder)
    }

    async fn rename_folder(&self, id: Uuid, user_id: Uuid, name: &str) -> Result<Option<Folder>> {
        let mut state = self.state.lock().await;
        Ok(state
            .folders
            .iter_mut()
            .find(|folder| folder.id == id && folder.user_id == user_id)
            .map(|folder| {
                folder.name = name.to_string();
                folder.updated_at = Utc::now();
                folder.clone()
            }))
    }

    async fn delete_empty_folder(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;

        state
            .owned_folder(id, user_id)
            .ok_or_else(|| AppError::not_found("Folder"))?;

        let has_subfolders = state
            .folders
            .iter()
            .any(|folder| folder.parent_id == Some(id) && folder.user_id == user_id);
        let has_items = state
            .items
            .iter()
            .any(|item| item.folder_id == Some(id) && item.user_id == user_id);
        if has_subfolders || has_items {
            return Err(AppError::NonEmptyFolder);
        }

        state.folders.retain(|folder| folder.id != id);
        Ok(())
    }

    async fn count_folders(&self, user_id: Uuid) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state
            .folders
            .iter()
            .filter(|folder| folder.user_id == user_id)
            .count() as i64)
    }
}
