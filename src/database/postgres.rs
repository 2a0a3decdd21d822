use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    database::{
        queries::{FolderQueries, ItemQueries, UserQueries},
        Repository,
    },
    errors::{AppError, Result},
    ledger::{bytes_to_gb, resize_delta_gb},
    models::*,
};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

fn sql_state(error: &AppError) -> Option<String> {
    match error {
        AppError::Database(sqlx::Error::Database(db_error)) => {
            db_error.code().map(|code| code.into_owned())
        }
        _ => None,
    }
}

fn rows_to_items(rows: Vec<ItemRow>) -> Result<Vec<Item>> {
    rows.into_iter().map(Item::try_from).collect()
}

/// Charges `delta_gb` to the user inside the caller's transaction,
/// distinguishing a missing owner from an overflowing charge.
async fn charge_in_tx(conn: &mut PgConnection, user_id: Uuid, delta_gb: f64) -> Result<()> {
    if delta_gb == 0.0 {
        return Ok(());
    }

    match UserQueries::apply_storage_delta(conn, user_id, delta_gb).await? {
        Some(user) => {
            tracing::debug!(%user_id, delta_gb, used = user.used_storage, "Storage ledger updated");
            Ok(())
        }
        None => match UserQueries::find_by_id(conn, user_id).await? {
            Some(_) => Err(AppError::storage_limit_exceeded()),
            None => Err(AppError::not_found("User")),
        },
    }
}

#[async_trait]
impl Repository for Database {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        UserQueries::create_user(&mut conn, &user).await.map_err(|e| {
            if sql_state(&e).as_deref() == Some(UNIQUE_VIOLATION) {
                AppError::Conflict("User with this email already exists".to_string())
            } else {
                e
            }
        })
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        UserQueries::find_by_id(&mut conn, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        UserQueries::find_by_email(&mut conn, email).await
    }

    async fn update_user_name(&self, id: Uuid, name: &str) -> Result<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        UserQueries::update_name(&mut conn, id, name).await
    }

    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        UserQueries::update_password(&mut conn, id, password_hash).await
    }

    async fn soft_delete_user(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        UserQueries::soft_delete(&mut conn, id).await
    }

    async fn list_items(&self, user_id: Uuid, filter: &ItemFilter) -> Result<Vec<Item>> {
        let mut conn = self.pool.acquire().await?;
        rows_to_items(ItemQueries::list(&mut conn, user_id, filter).await?)
    }

    async fn find_item(&self, id: Uuid, user_id: Uuid, kind: Option<ItemKind>) -> Result<Option<Item>> {
        let mut conn = self.pool.acquire().await?;
        ItemQueries::find(&mut conn, id, user_id, kind, false)
            .await?
            .map(Item::try_from)
            .transpose()
    }

    async fn insert_item(&self, item: NewItem) -> Result<Item> {
        let mut tx = self.pool.begin().await?;

        if let Some(folder_id) = item.folder_id {
            FolderQueries::find(&mut tx, folder_id, item.user_id, Some("SHARE"))
                .await?
                .ok_or_else(|| AppError::not_found("Folder"))?;
        }

        charge_in_tx(&mut tx, item.user_id, bytes_to_gb(item.size)).await?;
        let row = ItemQueries::insert(&mut tx, &item).await?;

        tx.commit().await?;
        Item::try_from(row)
    }

    async fn update_note(&self, id: Uuid, user_id: Uuid, changes: NoteChanges) -> Result<Item> {
        let mut tx = self.pool.begin().await?;

        let current: Item = ItemQueries::find(&mut tx, id, user_id, Some(ItemKind::Note), true)
            .await?
            .ok_or_else(|| AppError::not_found("Note"))?
            .try_into()?;

        let name = changes.name.unwrap_or_else(|| current.name.clone());
        let (content, size) = match changes.content {
            Some(content) => {
                let size = content.len() as i64;
                charge_in_tx(&mut tx, user_id, resize_delta_gb(current.size, size)).await?;
                (content, size)
            }
            None => (current.body.content().unwrap_or_default().to_string(), current.size),
        };

        let row = ItemQueries::update_note(&mut tx, id, &name, Some(&content), size).await?;
        tx.commit().await?;
        Item::try_from(row)
    }

    async fn set_favorite(&self, id: Uuid, user_id: Uuid, change: FavoriteChange) -> Result<Item> {
        let mut conn = self.pool.acquire().await?;
        ItemQueries::set_favorite(&mut conn, id, user_id, change)
            .await?
            .ok_or_else(|| AppError::not_found("Item"))?
            .try_into()
    }

    async fn delete_item(&self, id: Uuid, user_id: Uuid) -> Result<Item> {
        let mut tx = self.pool.begin().await?;

        let item: Item = ItemQueries::find(&mut tx, id, user_id, None, true)
            .await?
            .ok_or_else(|| AppError::not_found("Item"))?
            .try_into()?;

        UserQueries::refund_storage(&mut tx, user_id, bytes_to_gb(item.size)).await?;
        ItemQueries::delete(&mut tx, id, user_id).await?;

        tx.commit().await?;
        Ok(item)
    }

    async fn kind_totals(&self, user_id: Uuid) -> Result<Vec<KindTotals>> {
        let mut conn = self.pool.acquire().await?;
        ItemQueries::kind_totals(&mut conn, user_id).await
    }

    async fn recent_items(&self, user_id: Uuid, limit: usize) -> Result<Vec<Item>> {
        let mut conn = self.pool.acquire().await?;
        rows_to_items(ItemQueries::recent(&mut conn, user_id, limit as i64).await?)
    }

    async fn search_items(&self, user_id: Uuid, keyword: &str) -> Result<Vec<Item>> {
        let mut conn = self.pool.acquire().await?;
        rows_to_items(ItemQueries::search(&mut conn, user_id, keyword).await?)
    }

    async fn list_folders(&self, user_id: Uuid, parent: FolderScope) -> Result<Vec<Folder>> {
        let mut conn = self.pool.acquire().await?;
        FolderQueries::list(&mut conn, user_id, parent).await
    }

    async fn find_folder(&self, id: Uuid, user_id: Uuid) -> Result<Option<Folder>> {
        let mut conn = self.pool.acquire().await?;
        FolderQueries::find(&mut conn, id, user_id, None).await
    }

    async fn insert_folder(&self, user_id: Uuid, name: &str, parent_id: Option<Uuid>) -> Result<Folder> {
        let mut tx = self.pool.begin().await?;

        if let Some(parent_id) = parent_id {
            FolderQueries::find(&mut tx, parent_id, user_id, Some("SHARE"))
                .await?
                .ok_or_else(|| AppError::not_found("Parent folder"))?;
        }

        let folder = FolderQueries::insert(&mut tx, user_id, name, parent_id).await?;
        tx.commit().await?;
        Ok(folder)
    }

    async fn rename_folder(&self, id: Uuid, user_id: Uuid, name: &str) -> Result<Option<Folder>> {
        let mut conn = self.pool.acquire().await?;
        FolderQueries::rename(&mut conn, id, user_id, name).await
    }

    async fn delete_empty_folder(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        FolderQueries::find(&mut tx, id, user_id, Some("UPDATE"))
            .await?
            .ok_or_else(|| AppError::not_found("Folder"))?;

        let subfolders = FolderQueries::count_children(&mut tx, id, user_id).await?;
        let items = ItemQueries::count_in_folder(&mut tx, id, user_id).await?;
        if subfolders > 0 || items > 0 {
            return Err(AppError::NonEmptyFolder);
        }

        // The foreign keys are ON DELETE RESTRICT, so anything that slipped in
        // still blocks the delete.
        FolderQueries::delete(&mut tx, id, user_id).await.map_err(|e| {
            if sql_state(&e).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                AppError::NonEmptyFolder
            } else {
                e
            }
        })?;

        tx.commit().await?;
        Ok(())
    }

    async fn count_folders(&self, user_id: Uuid) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        FolderQueries::count_for_user(&mut conn, user_id).await
    }
}
