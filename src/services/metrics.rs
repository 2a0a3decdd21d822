use metrics::{counter, histogram};
use std::time::Instant;

use crate::models::ItemKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsService;

impl MetricsService {
    pub fn new() -> Self {
        Self
    }

    pub fn record_item_created(&self, kind: ItemKind, bytes: i64) {
        counter!("items_created_total", "kind" => kind.as_str()).increment(1);
        if bytes > 0 {
            counter!("bytes_charged_total").increment(bytes as u64);
        }
    }

    pub fn record_item_deleted(&self, kind: ItemKind) {
        counter!("items_deleted_total", "kind" => kind.as_str()).increment(1);
    }

    pub fn record_quota_rejection(&self) {
        counter!("quota_rejections_total").increment(1);
    }

    pub fn record_error(&self, error_type: &'static str) {
        counter!("errors_total", "type" => error_type).increment(1);
    }

    pub fn record_request_duration(&self, duration: std::time::Duration, method: &str, status: u16) {
        histogram!(
            "request_duration_seconds",
            "method" => method.to_string(),
            "status" => status.to_string()
        )
        .record(duration.as_secs_f64());
    }
}

pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
