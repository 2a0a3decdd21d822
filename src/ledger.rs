//! Per-user storage accounting.
//!
//! Item sizes are tracked in bytes while the user's quota is kept in GB as a
//! float, so every charge goes through [`bytes_to_gb`]. The ledger is updated
//! incrementally on each create, resize and delete; it is never rebuilt from
//! the item table.

use serde::Serialize;

use crate::errors::{AppError, Result};

pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

pub fn bytes_to_gb(bytes: i64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}

/// GB delta for an item whose size changes from `old_bytes` to `new_bytes`.
pub fn resize_delta_gb(old_bytes: i64, new_bytes: i64) -> f64 {
    bytes_to_gb(new_bytes - old_bytes)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLedger {
    pub storage_limit: f64,
    pub used_storage: f64,
}

impl StorageLedger {
    pub fn new(storage_limit: f64, used_storage: f64) -> Self {
        Self {
            storage_limit,
            used_storage,
        }
    }

    /// Decreases and zero-sized deltas always fit.
    pub fn would_fit(&self, delta_gb: f64) -> bool {
        delta_gb <= 0.0 || self.used_storage + delta_gb <= self.storage_limit
    }

    pub fn ensure_fits(&self, delta_gb: f64) -> Result<()> {
        if self.would_fit(delta_gb) {
            Ok(())
        } else {
            Err(AppError::storage_limit_exceeded())
        }
    }

    /// Applies a signed delta. Increases that would overflow the limit are
    /// rejected without touching the ledger; the result is clamped at zero.
    pub fn charge(&mut self, delta_gb: f64) -> Result<f64> {
        self.ensure_fits(delta_gb)?;
        self.used_storage = (self.used_storage + delta_gb).max(0.0);
        Ok(self.used_storage)
    }

    pub fn refund(&mut self, gb: f64) -> f64 {
        self.used_storage = (self.used_storage - gb).max(0.0);
        self.used_storage
    }

    pub fn available(&self) -> f64 {
        (self.storage_limit - self.used_storage).max(0.0)
    }

    pub fn used_percentage(&self) -> f64 {
        if self.storage_limit > 0.0 {
            round_to_hundredths(self.used_storage / self.storage_limit * 100.0)
        } else {
            0.0
        }
    }
}

pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
