use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::Config,
    errors::Result,
    models::{
        FavoriteChange, Folder, FolderScope, Item, ItemFilter, ItemKind, KindTotals, NewItem,
        NewUser, NoteChanges, User,
    },
};

pub mod memory;
pub mod postgres;
pub mod queries;

pub use memory::MemoryRepository;
pub use postgres::Database;

/// Persistence seam for users, items and folders.
///
/// Every method filters by the owning user; a record owned by someone else
/// is reported exactly like a missing one. Methods that touch the storage
/// ledger apply the ledger change and the item write as one atomic step.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn ping(&self) -> Result<()>;

    // Users. Soft-deleted users are never returned.
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn update_user_name(&self, id: Uuid, name: &str) -> Result<Option<User>>;
    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> Result<bool>;
    async fn soft_delete_user(&self, id: Uuid) -> Result<bool>;

    // Items.
    async fn list_items(&self, user_id: Uuid, filter: &ItemFilter) -> Result<Vec<Item>>;
    async fn find_item(
        &self,
        id: Uuid,
        user_id: Uuid,
        kind: Option<ItemKind>,
    ) -> Result<Option<Item>>;

    /// Inserts the item and charges `bytes_to_gb(item.size)` to the owner.
    /// Fails with `QuotaExceeded` (nothing written) if the charge would
    /// overflow the owner's limit, and `NotFound` if the target folder is
    /// missing or not owned by the same user.
    async fn insert_item(&self, item: NewItem) -> Result<Item>;

    /// Renames and/or rewrites a note, charging the size difference.
    async fn update_note(&self, id: Uuid, user_id: Uuid, changes: NoteChanges) -> Result<Item>;

    async fn set_favorite(&self, id: Uuid, user_id: Uuid, change: FavoriteChange) -> Result<Item>;

    /// Removes the item and refunds its size, clamped at zero.
    async fn delete_item(&self, id: Uuid, user_id: Uuid) -> Result<Item>;

    async fn kind_totals(&self, user_id: Uuid) -> Result<Vec<KindTotals>>;
    async fn recent_items(&self, user_id: Uuid, limit: usize) -> Result<Vec<Item>>;
    /// `keyword` is matched case-insensitively as a plain substring.
    async fn search_items(&self, user_id: Uuid, keyword: &str) -> Result<Vec<Item>>;

    // Folders.
    async fn list_folders(&self, user_id: Uuid, parent: FolderScope) -> Result<Vec<Folder>>;
    async fn find_folder(&self, id: Uuid, user_id: Uuid) -> Result<Option<Folder>>;
    async fn insert_folder(
        &self,
        user_id: Uuid,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Folder>;
    async fn rename_folder(&self, id: Uuid, user_id: Uuid, name: &str) -> Result<Option<Folder>>;
    /// Deletes the folder only if it has no direct subfolders and no direct
    /// items; otherwise fails with `NonEmptyFolder`.
    async fn delete_empty_folder(&self, id: Uuid, user_id: Uuid) -> Result<()>;
    async fn count_folders(&self, user_id: Uuid) -> Result<i64>;
}

pub async fn connect(config: &Config) -> Result<Arc<dyn Repository>> {
    if config.uses_memory_store() {
        tracing::warn!("Using in-memory store; data will not survive a restart");
        return Ok(Arc::new(MemoryRepository::new()));
    }

    let database = Database::new(&config.database_url).await?;
    database.migrate().await?;
    tracing::info!("Connected to Postgres and applied migrations");
    Ok(Arc::new(database))
}
