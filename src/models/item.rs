use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::FolderScope,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Note,
    Image,
    Pdf,
    Link,
}

impl ItemKind {
    pub const ALL: [ItemKind; 4] = [ItemKind::Note, ItemKind::Image, ItemKind::Pdf, ItemKind::Link];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Note => "note",
            ItemKind::Image => "image",
            ItemKind::Pdf => "pdf",
            ItemKind::Link => "link",
        }
    }

    /// Display name used in "... not found" messages.
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Note => "Note",
            ItemKind::Image => "Image",
            ItemKind::Pdf => "PDF",
            ItemKind::Link => "Link",
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, ItemKind::Image | ItemKind::Pdf)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "note" => Ok(ItemKind::Note),
            "image" => Ok(ItemKind::Image),
            "pdf" => Ok(ItemKind::Pdf),
            "link" => Ok(ItemKind::Link),
            other => Err(AppError::InvalidInput(format!("Unknown item type: {}", other))),
        }
    }
}

/// Kind-specific payload. A note never carries a file path and a PDF never
/// carries text content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemBody {
    Note {
        content: String,
    },
    Image {
        #[serde(rename = "filePath")]
        file_path: String,
    },
    Pdf {
        #[serde(rename = "filePath")]
        file_path: String,
    },
    Link {
        url: String,
    },
}

impl ItemBody {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemBody::Note { .. } => ItemKind::Note,
            ItemBody::Image { .. } => ItemKind::Image,
            ItemBody::Pdf { .. } => ItemKind::Pdf,
            ItemBody::Link { .. } => ItemKind::Link,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            ItemBody::Note { content } => Some(content),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ItemBody::Link { url } => Some(url),
            _ => None,
        }
    }

    pub fn file_path(&self) -> Option<&str> {
        match self {
            ItemBody::Image { file_path } | ItemBody::Pdf { file_path } => Some(file_path),
            _ => None,
        }
    }

    pub fn binary(kind: ItemKind, file_path: String) -> Result<Self> {
        match kind {
            ItemKind::Image => Ok(ItemBody::Image { file_path }),
            ItemKind::Pdf => Ok(ItemBody::Pdf { file_path }),
            other => Err(AppError::InvalidInput(format!("{} items are not binary", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub body: ItemBody,
    /// Bytes; authoritative for quota math.
    pub size: i64,
    pub folder_id: Option<Uuid>,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        self.body.kind()
    }

    /// Case-insensitive substring match over name, note content and link url.
    /// `needle` must already be lowercased.
    pub fn matches_keyword(&self, needle: &str) -> bool {
        [Some(self.name.as_str()), self.body.content(), self.body.url()]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub user_id: Uuid,
    pub name: String,
    pub body: ItemBody,
    pub size: i64,
    pub folder_id: Option<Uuid>,
}

/// Flat row as stored in the `items` table.
#[derive(Debug, Clone, FromRow)]
pub struct ItemRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub name: String,
    pub content: Option<String>,
    pub url: Option<String>,
    pub file_path: Option<String>,
    pub size: i64,
    pub folder_id: Option<Uuid>,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = AppError;

    fn try_from(row: ItemRow) -> Result<Self> {
        let kind: ItemKind = row.kind.parse()?;
        let missing = |field: &str| {
            AppError::Internal(anyhow::anyhow!(
                "item {} of type {} has no {}",
                row.id,
                kind,
                field
            ))
        };

        let body = match kind {
            ItemKind::Note => ItemBody::Note {
                content: row.content.clone().unwrap_or_default(),
            },
            ItemKind::Image => ItemBody::Image {
                file_path: row.file_path.clone().ok_or_else(|| missing("file_path"))?,
            },
            ItemKind::Pdf => ItemBody::Pdf {
                file_path: row.file_path.clone().ok_or_else(|| missing("file_path"))?,
            },
            ItemKind::Link => ItemBody::Link {
                url: row.url.clone().ok_or_else(|| missing("url"))?,
            },
        };

        Ok(Item {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            body,
            size: row.size,
            folder_id: row.folder_id,
            is_favorite: row.is_favorite,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub kind: Option<ItemKind>,
    pub folder: FolderScope,
    pub favorite: Option<bool>,
}

impl ItemFilter {
    pub fn of_kind(kind: ItemKind, folder: FolderScope) -> Self {
        Self {
            kind: Some(kind),
            folder,
            favorite: None,
        }
    }

    pub fn favorites() -> Self {
        Self {
            favorite: Some(true),
            ..Self::default()
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.kind.map_or(true, |kind| item.kind() == kind)
            && self.folder.matches(item.folder_id)
            && self.favorite.map_or(true, |fav| item.is_favorite == fav)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteChange {
    Set(bool),
    Toggle,
}

impl FavoriteChange {
    pub fn apply(&self, current: bool) -> bool {
        match self {
            FavoriteChange::Set(value) => *value,
            FavoriteChange::Toggle => !current,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub name: Option<String>,
    pub content: Option<String>,
}

/// Count and byte total for one item kind.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct KindTotals {
    pub kind: String,
    pub count: i64,
    pub total_size: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub name: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "folderId")]
    pub folder_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub name: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub name: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "folderId")]
    pub folder_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemListQuery {
    pub folder_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub folder_id: Option<String>,
    pub is_favorite: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(kind: &str) -> ItemRow {
        ItemRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: kind.to_string(),
            name: "Quarterly Report".to_string(),
            content: None,
            url: None,
            file_path: None,
            size: 0,
            folder_id: None,
            is_favorite: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion_rejects_binary_without_path() {
        assert!(Item::try_from(row("image")).is_err());

        let mut pdf = row("pdf");
        pdf.file_path = Some("/uploads/pdfs/a.pdf".to_string());
        let item = Item::try_from(pdf).unwrap();
        assert_eq!(item.kind(), ItemKind::Pdf);
        assert_eq!(item.body.file_path(), Some("/uploads/pdfs/a.pdf"));
        assert_eq!(item.body.content(), None);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(Item::try_from(row("video")).is_err());
    }

    #[test]
    fn test_serialized_shape_keeps_api_field_names() {
        let mut note = row("note");
        note.content = Some("hello".to_string());
        note.size = 5;
        let item = Item::try_from(note).unwrap();

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], json!("note"));
        assert_eq!(value["content"], json!("hello"));
        assert_eq!(value["size"], json!(5));
        assert_eq!(value["isFavorite"], json!(false));
        assert!(value.get("filePath").is_none());
        assert!(value.get("userId").is_some());
        assert!(value.get("folderId").is_some());
    }

    #[test]
    fn test_keyword_matches_name_content_and_url() {
        let mut link = row("link");
        link.url = Some("https://Example.com/Docs".to_string());
        let link = Item::try_from(link).unwrap();

        assert!(link.matches_keyword("example.com"));
        assert!(link.matches_keyword("quarterly"));
        assert!(!link.matches_keyword("invoice"));
    }

    #[test]
    fn test_favorite_change() {
        assert!(FavoriteChange::Toggle.apply(false));
        assert!(!FavoriteChange::Toggle.apply(true));
        assert!(FavoriteChange::Set(true).apply(true));
        assert!(!FavoriteChange::Set(false).apply(true));
    }
}
