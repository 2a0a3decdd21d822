use std::sync::Arc;
use uuid::Uuid;

use crate::{
    database::Repository,
    errors::{AppError, Result},
    models::{parse_parent_ref, CreateFolderRequest, Folder, FolderScope, Item, ItemFilter},
    services::items::required_name,
};

/// Longest folder name accepted on create and rename.
pub const FOLDER_NAME_MAX: usize = 100;

pub struct FolderService {
    repository: Arc<dyn Repository>,
}

impl FolderService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self, user_id: Uuid, parent: FolderScope) -> Result<Vec<Folder>> {
        self.repository.list_folders(user_id, parent).await
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Folder> {
        self.repository
            .find_folder(id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder"))
    }

    pub async fn create(&self, user_id: Uuid, request: CreateFolderRequest) -> Result<Folder> {
        let name = required_name(request.name.as_deref(), FOLDER_NAME_MAX)?;
        let parent_id = parse_parent_ref(request.parent_id.as_deref())?;

        let folder = self.repository.insert_folder(user_id, &name, parent_id).await?;
        tracing::info!(folder_id = %folder.id, user_id = %user_id, "Folder created");
        Ok(folder)
    }

    /// Sibling names are not required to be unique.
    pub async fn rename(&self, id: Uuid, user_id: Uuid, name: Option<&str>) -> Result<Folder> {
        let name = required_name(name, FOLDER_NAME_MAX)?;
        self.repository
            .rename_folder(id, user_id, &name)
            .await?
            .ok_or_else(|| AppError::not_found("Folder"))
    }

    /// Never cascades: a folder with subfolders or items is left untouched.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        self.repository.delete_empty_folder(id, user_id).await?;
        tracing::info!(folder_id = %id, user_id = %user_id, "Folder deleted");
        Ok(())
    }

    pub async fn files(&self, id: Uuid, user_id: Uuid) -> Result<Vec<Item>> {
        let folder = self.get(id, user_id).await?;
        self.repository
            .list_items(user_id, &ItemFilter {
                folder: FolderScope::Folder(folder.id),
                ..ItemFilter::default()
            })
            .await
    }
}
