use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::{AppError, Result};

/// Sentinel accepted by list endpoints for "items/folders with no parent".
pub const ROOT_SENTINEL: &str = "root";

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Folder restriction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderScope {
    #[default]
    Any,
    Root,
    Folder(Uuid),
}

impl FolderScope {
    /// Parses a `folderId` / `parentId` query value. Absent or empty means no
    /// filter; `"root"` means "no parent".
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") => Ok(FolderScope::Any),
            Some(ROOT_SENTINEL) => Ok(FolderScope::Root),
            Some(value) => Uuid::parse_str(value)
                .map(FolderScope::Folder)
                .map_err(|_| AppError::InvalidInput(format!("Invalid folder id: {}", value))),
        }
    }

    pub fn matches(&self, folder_id: Option<Uuid>) -> bool {
        match self {
            FolderScope::Any => true,
            FolderScope::Root => folder_id.is_none(),
            FolderScope::Folder(id) => folder_id == Some(*id),
        }
    }
}

/// Parses an optional folder reference on create requests; empty and
/// `"root"` both place the new entry at the root.
pub fn parse_parent_ref(raw: Option<&str>) -> Result<Option<Uuid>> {
    match FolderScope::parse(raw)? {
        FolderScope::Any | FolderScope::Root => Ok(None),
        FolderScope::Folder(id) => Ok(Some(id)),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub name: Option<String>,
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameFolderRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderListQuery {
    pub parent_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_parsing() {
        let id = Uuid::new_v4();

        assert_eq!(FolderScope::parse(None).unwrap(), FolderScope::Any);
        assert_eq!(FolderScope::parse(Some("")).unwrap(), FolderScope::Any);
        assert_eq!(FolderScope::parse(Some("root")).unwrap(), FolderScope::Root);
        assert_eq!(
            FolderScope::parse(Some(&id.to_string())).unwrap(),
            FolderScope::Folder(id)
        );
        assert!(matches!(
            FolderScope::parse(Some("not-a-folder")),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_root_scope_matches_only_unparented() {
        let id = Uuid::new_v4();

        assert!(FolderScope::Root.matches(None));
        assert!(!FolderScope::Root.matches(Some(id)));
        assert!(FolderScope::Any.matches(Some(id)));
        assert!(FolderScope::Folder(id).matches(Some(id)));
        assert!(!FolderScope::Folder(id).matches(None));
    }

    #[test]
    fn test_parent_ref_treats_root_as_none() {
        assert_eq!(parse_parent_ref(Some("root")).unwrap(), None);
        assert_eq!(parse_parent_ref(None).unwrap(), None);
    }
}
