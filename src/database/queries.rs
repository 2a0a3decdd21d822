use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::Result;
use crate::models::*;

const USER_COLUMNS: &str = "id, email, name, password_hash, storage_limit, used_storage, \
     is_deleted, deleted_at, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, user_id, kind, name, content, url, file_path, size, \
     folder_id, is_favorite, created_at, updated_at";

const FOLDER_COLUMNS: &str = "id, user_id, name, parent_id, created_at, updated_at";

/// Escapes LIKE metacharacters so the keyword matches literally.
pub fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub struct UserQueries;

impl UserQueries {
    pub async fn create_user(conn: &mut PgConnection, user: &NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (email, name, password_hash, storage_limit, used_storage) \
             VALUES ($1, $2, $3, $4, 0) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.storage_limit)
            .fetch_one(conn)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND is_deleted = FALSE",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(conn: &mut PgConnection, email: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE email = $1 AND is_deleted = FALSE",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(conn)
            .await?;

        Ok(user)
    }

    pub async fn update_name(conn: &mut PgConnection, id: Uuid, name: &str) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET name = $2, updated_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(name)
            .fetch_optional(conn)
            .await?;

        Ok(user)
    }

    pub async fn update_password(conn: &mut PgConnection, id: Uuid, password_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .bind(password_hash)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET is_deleted = TRUE, deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Conditional ledger update: applies `delta_gb` only if it is a decrease
    /// or still fits under the limit. Returns `None` when the user is missing
    /// or the charge would overflow.
    pub async fn apply_storage_delta(
        conn: &mut PgConnection,
        id: Uuid,
        delta_gb: f64,
    ) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET used_storage = GREATEST(0, used_storage + $2), updated_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE \
               AND ($2 <= 0 OR used_storage + $2 <= storage_limit) \
             RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(delta_gb)
            .fetch_optional(conn)
            .await?;

        Ok(user)
    }

    /// Unconditional decrement, clamped at zero.
    pub async fn refund_storage(conn: &mut PgConnection, id: Uuid, gb: f64) -> Result<()> {
        sqlx::query(
            "UPDATE users SET used_storage = GREATEST(0, used_storage - $2), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(gb)
        .execute(conn)
        .await?;

        Ok(())
    }
}

pub struct ItemQueries;

impl ItemQueries {
    pub async fn insert(conn: &mut PgConnection, item: &NewItem) -> Result<ItemRow> {
        let sql = format!(
            "INSERT INTO items (user_id, kind, name, content, url, file_path, size, folder_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            ITEM_COLUMNS
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(item.user_id)
            .bind(item.body.kind().as_str())
            .bind(&item.name)
            .bind(item.body.content())
            .bind(item.body.url())
            .bind(item.body.file_path())
            .bind(item.size)
            .bind(item.folder_id)
            .fetch_one(conn)
            .await?;

        Ok(row)
    }

    pub async fn find(
        conn: &mut PgConnection,
        id: Uuid,
        user_id: Uuid,
        kind: Option<ItemKind>,
        lock: bool,
    ) -> Result<Option<ItemRow>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM items WHERE id = ", ITEM_COLUMNS));
        builder.push_bind(id);
        builder.push(" AND user_id = ").push_bind(user_id);
        if let Some(kind) = kind {
            builder.push(" AND kind = ").push_bind(kind.as_str());
        }
        if lock {
            builder.push(" FOR UPDATE");
        }

        let row = builder
            .build_query_as::<ItemRow>()
            .fetch_optional(conn)
            .await?;

        Ok(row)
    }

    pub async fn list(conn: &mut PgConnection, user_id: Uuid, filter: &ItemFilter) -> Result<Vec<ItemRow>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM items WHERE user_id = ", ITEM_COLUMNS));
        builder.push_bind(user_id);
        if let Some(kind) = filter.kind {
            builder.push(" AND kind = ").push_bind(kind.as_str());
        }
        match filter.folder {
            FolderScope::Any => {}
            FolderScope::Root => {
                builder.push(" AND folder_id IS NULL");
            }
            FolderScope::Folder(folder_id) => {
                builder.push(" AND folder_id = ").push_bind(folder_id);
            }
        }
        if let Some(favorite) = filter.favorite {
            builder.push(" AND is_favorite = ").push_bind(favorite);
        }
        builder.push(" ORDER BY created_at DESC");

        let rows = builder.build_query_as::<ItemRow>().fetch_all(conn).await?;
        Ok(rows)
    }

    pub async fn update_note(
        conn: &mut PgConnection,
        id: Uuid,
        name: &str,
        content: Option<&str>,
        size: i64,
    ) -> Result<ItemRow> {
        let sql = format!(
            "UPDATE items SET name = $2, content = $3, size = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            ITEM_COLUMNS
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .bind(name)
            .bind(content)
            .bind(size)
            .fetch_one(conn)
            .await?;

        Ok(row)
    }

    pub async fn set_favorite(
        conn: &mut PgConnection,
        id: Uuid,
        user_id: Uuid,
        change: FavoriteChange,
    ) -> Result<Option<ItemRow>> {
        let assignment = match change {
            FavoriteChange::Set(_) => "$3",
            FavoriteChange::Toggle => "NOT is_favorite",
        };
        let sql = format!(
            "UPDATE items SET is_favorite = {}, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING {}",
            assignment, ITEM_COLUMNS
        );
        let mut query = sqlx::query_as::<_, ItemRow>(&sql).bind(id).bind(user_id);
        if let FavoriteChange::Set(value) = change {
            query = query.bind(value);
        }

        let row = query.fetch_optional(conn).await?;
        Ok(row)
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid, user_id: Uuid) -> Result<Option<ItemRow>> {
        let sql = format!(
            "DELETE FROM items WHERE id = $1 AND user_id = $2 RETURNING {}",
            ITEM_COLUMNS
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(conn)
            .await?;

        Ok(row)
    }

    pub async fn kind_totals(conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<KindTotals>> {
        let totals = sqlx::query_as::<_, KindTotals>(
            "SELECT kind, COUNT(*) AS count, COALESCE(SUM(size), 0)::BIGINT AS total_size \
             FROM items WHERE user_id = $1 GROUP BY kind",
        )
        .bind(user_id)
        .fetch_all(conn)
        .await?;

        Ok(totals)
    }

    pub async fn recent(conn: &mut PgConnection, user_id: Uuid, limit: i64) -> Result<Vec<ItemRow>> {
        let sql = format!(
            "SELECT {} FROM items WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            ITEM_COLUMNS
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(conn)
            .await?;

        Ok(rows)
    }

    pub async fn search(conn: &mut PgConnection, user_id: Uuid, keyword: &str) -> Result<Vec<ItemRow>> {
        let sql = format!(
            "SELECT {} FROM items WHERE user_id = $1 \
               AND (name ILIKE $2 OR content ILIKE $2 OR url ILIKE $2) \
             ORDER BY created_at DESC",
            ITEM_COLUMNS
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(user_id)
            .bind(like_pattern(keyword))
            .fetch_all(conn)
            .await?;

        Ok(rows)
    }

    pub async fn count_in_folder(conn: &mut PgConnection, folder_id: Uuid, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM items WHERE folder_id = $1 AND user_id = $2",
        )
        .bind(folder_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;

        Ok(count)
    }
}

pub struct FolderQueries;

impl FolderQueries {
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: Uuid,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Folder> {
        let sql = format!(
            "INSERT INTO folders (user_id, name, parent_id) VALUES ($1, $2, $3) RETURNING {}",
            FOLDER_COLUMNS
        );
        let folder = sqlx::query_as::<_, Folder>(&sql)
            .bind(user_id)
            .bind(name)
            .bind(parent_id)
            .fetch_one(conn)
            .await?;

        Ok(folder)
    }

    /// `lock` is a row-lock mode (`SHARE` or `UPDATE`) held until the
    /// surrounding transaction ends.
    pub async fn find(
        conn: &mut PgConnection,
        id: Uuid,
        user_id: Uuid,
        lock: Option<&str>,
    ) -> Result<Option<Folder>> {
        let sql = format!(
            "SELECT {} FROM folders WHERE id = $1 AND user_id = $2{}",
            FOLDER_COLUMNS,
            lock.map(|mode| format!(" FOR {}", mode)).unwrap_or_default()
        );
        let folder = sqlx::query_as::<_, Folder>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(conn)
            .await?;

        Ok(folder)
    }

    pub async fn list(conn: &mut PgConnection, user_id: Uuid, parent: FolderScope) -> Result<Vec<Folder>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM folders WHERE user_id = ", FOLDER_COLUMNS));
        builder.push_bind(user_id);
        match parent {
            FolderScope::Any => {}
            FolderScope::Root => {
                builder.push(" AND parent_id IS NULL");
            }
            FolderScope::Folder(parent_id) => {
                builder.push(" AND parent_id = ").push_bind(parent_id);
            }
        }
        builder.push(" ORDER BY created_at DESC");

        let folders = builder.build_query_as::<Folder>().fetch_all(conn).await?;
        Ok(folders)
    }

    pub async fn rename(conn: &mut PgConnection, id: Uuid, user_id: Uuid, name: &str) -> Result<Option<Folder>> {
        let sql = format!(
            "UPDATE folders SET name = $3, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING {}",
            FOLDER_COLUMNS
        );
        let folder = sqlx::query_as::<_, Folder>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(name)
            .fetch_optional(conn)
            .await?;

        Ok(folder)
    }

    pub async fn count_children(conn: &mut PgConnection, id: Uuid, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM folders WHERE parent_id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;

        Ok(count)
    }

    pub async fn count_for_user(conn: &mut PgConnection, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM folders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(conn)
            .await?;

        Ok(count)
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("report"), "%report%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\tmp"), "%c:\\\\tmp%");
    }
}
