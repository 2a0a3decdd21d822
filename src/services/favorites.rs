use std::sync::Arc;
use uuid::Uuid;

use crate::{
    database::Repository,
    errors::Result,
    models::{FavoriteChange, Item, ItemFilter},
};

/// Favorite flags have no storage impact.
pub struct FavoriteService {
    repository: Arc<dyn Repository>,
}

impl FavoriteService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Item>> {
        self.repository.list_items(user_id, &ItemFilter::favorites()).await
    }

    pub async fn add(&self, id: Uuid, user_id: Uuid) -> Result<Item> {
        self.repository.set_favorite(id, user_id, FavoriteChange::Set(true)).await
    }

    pub async fn remove(&self, id: Uuid, user_id: Uuid) -> Result<Item> {
        self.repository.set_favorite(id, user_id, FavoriteChange::Set(false)).await
    }

    pub async fn toggle(&self, id: Uuid, user_id: Uuid) -> Result<Item> {
        self.repository.set_favorite(id, user_id, FavoriteChange::Toggle).await
    }
}
