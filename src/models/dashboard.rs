use serde::{Deserialize, Serialize};

use crate::ledger::StorageLedger;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSummary {
    pub total: f64,
    pub used: f64,
    pub available: f64,
    pub used_percentage: f64,
}

impl From<StorageLedger> for StorageSummary {
    fn from(ledger: StorageLedger) -> Self {
        Self {
            total: ledger.storage_limit,
            used: ledger.used_storage,
            available: ledger.available(),
            used_percentage: ledger.used_percentage(),
        }
    }
}

/// Count and storage (GB) of one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategorySummary {
    pub total: i64,
    pub storage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub storage: StorageSummary,
    pub folders: CategorySummary,
    pub notes: CategorySummary,
    pub images: CategorySummary,
    pub pdfs: CategorySummary,
    pub links: CategorySummary,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}
