use std::sync::Arc;
use uuid::Uuid;

use crate::{
    database::Repository,
    errors::{AppError, Result},
    ledger::bytes_to_gb,
    models::{CategorySummary, DashboardSummary, Item, ItemKind, StorageSummary},
};

pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Read-only rollups over a user's items and storage ledger.
pub struct DashboardService {
    repository: Arc<dyn Repository>,
    recent_limit_max: usize,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn Repository>, recent_limit_max: usize) -> Self {
        Self {
            repository,
            recent_limit_max,
        }
    }

    pub async fn summary(&self, user_id: Uuid) -> Result<DashboardSummary> {
        let user = self
            .repository
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let mut summary = DashboardSummary {
            storage: StorageSummary::from(user.ledger()),
            folders: CategorySummary {
                total: self.repository.count_folders(user_id).await?,
                storage: 0.0,
            },
            notes: CategorySummary::default(),
            images: CategorySummary::default(),
            pdfs: CategorySummary::default(),
            links: CategorySummary::default(),
        };

        for totals in self.repository.kind_totals(user_id).await? {
            let category = CategorySummary {
                total: totals.count,
                storage: bytes_to_gb(totals.total_size),
            };
            match totals.kind.parse::<ItemKind>()? {
                ItemKind::Note => summary.notes = category,
                ItemKind::Image => summary.images = category,
                ItemKind::Pdf => summary.pdfs = category,
                ItemKind::Link => summary.links = category,
            }
        }

        Ok(summary)
    }

    /// Newest items across all kinds. `limit` defaults to 10 and is capped.
    pub async fn recent(&self, user_id: Uuid, limit: Option<usize>) -> Result<Vec<Item>> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT);
        if limit == 0 {
            return Err(AppError::InvalidInput("limit must be at least 1".to_string()));
        }

        self.repository
            .recent_items(user_id, limit.min(self.recent_limit_max))
            .await
    }

    /// Case-insensitive substring search over name, note content and link URL.
    pub async fn search(&self, user_id: Uuid, keyword: Option<&str>) -> Result<Vec<Item>> {
        let keyword = keyword.unwrap_or_default();
        if keyword.trim().is_empty() {
            return Err(AppError::InvalidInput("Search keyword is required".to_string()));
        }

        self.repository.search_items(user_id, keyword).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ledger::BYTES_PER_GB,
        models::{ItemBody, NewItem},
        services::items::tests::repository_with_user,
    };

    fn note(user_id: Uuid, name: &str, content: &str) -> NewItem {
        NewItem {
            user_id,
            name: name.to_string(),
            body: ItemBody::Note { content: content.to_string() },
            size: content.len() as i64,
            folder_id: None,
        }
    }

    #[tokio::test]
    async fn test_summary_rolls_up_per_kind() {
        let (repository, user) = repository_with_user(1.0).await;
        repository.insert_item(note(user.id, "a", "hello")).await.unwrap();
        repository.insert_item(note(user.id, "b", "world!")).await.unwrap();
        repository.insert_folder(user.id, "A", None).await.unwrap();

        let dashboard = DashboardService::new(repository, 100);
        let summary = dashboard.summary(user.id).await.unwrap();

        assert_eq!(summary.notes.total, 2);
        assert_eq!(summary.notes.storage, 11.0 / BYTES_PER_GB);
        assert_eq!(summary.images, CategorySummary::default());
        assert_eq!(summary.folders, CategorySummary { total: 1, storage: 0.0 });
        assert_eq!(summary.storage.total, 1.0);
        assert_eq!(summary.storage.used_percentage, 0.0);
    }

    #[tokio::test]
    async fn test_zero_limit_reports_zero_percent() {
        let (repository, user) = repository_with_user(0.0).await;
        let dashboard = DashboardService::new(repository, 100);

        let summary = dashboard.summary(user.id).await.unwrap();
        assert_eq!(summary.storage.used_percentage, 0.0);
        assert_eq!(summary.storage.available, 0.0);
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_bounded() {
        let (repository, user) = repository_with_user(1.0).await;
        for name in ["first", "second", "third"] {
            repository.insert_item(note(user.id, name, "x")).await.unwrap();
        }
        let dashboard = DashboardService::new(repository, 2);

        let recent = dashboard.recent(user.id, Some(50)).await.unwrap();
        let names: Vec<_> = recent.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["third", "second"]);

        assert!(matches!(
            dashboard.recent(user.id, Some(0)).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_search_matches_case_insensitively() {
        let (repository, user) = repository_with_user(1.0).await;
        repository.insert_item(note(user.id, "Groceries", "Milk and EGGS")).await.unwrap();
        repository.insert_item(note(user.id, "Todo", "call bob")).await.unwrap();
        let dashboard = DashboardService::new(repository, 100);

        let hits = dashboard.search(user.id, Some("eggs")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Groceries");

        for blank in [None, Some(""), Some("   ")] {
            assert!(matches!(
                dashboard.search(user.id, blank).await,
                Err(AppError::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_search_keeps_surrounding_whitespace() {
        let (repository, user) = repository_with_user(1.0).await;
        repository.insert_item(note(user.id, "Breakfast", "big eggs")).await.unwrap();
        repository.insert_item(note(user.id, "Garden", "eggsplant")).await.unwrap();
        let dashboard = DashboardService::new(repository, 100);

        let hits = dashboard.search(user.id, Some(" eggs")).await.unwrap();
        let names: Vec<_> = hits.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["Breakfast"]);

        assert_eq!(dashboard.search(user.id, Some("eggs")).await.unwrap().len(), 2);
    }
}
