//! Bounded alert history.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use fieldwatch_core::{defaults, AlertDetails, AlertRecord, StatusKind};

/// Ring buffer of the most recent alert records.
///
/// Appends go to the back; once `capacity` is exceeded the oldest record is
/// evicted. Reads return newest first.
#[derive(Clone)]
pub struct AlertLog {
    records: Arc<RwLock<VecDeque<AlertRecord>>>,
    capacity: usize,
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(defaults::ALERT_LOG_CAPACITY)
    }
}

impl AlertLog {
    /// Create a log holding at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Create from `ALERT_LOG_CAPACITY` (default 100).
    pub fn from_env() -> Self {
        let capacity = std::env::var(defaults::ENV_ALERT_LOG_CAPACITY)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::ALERT_LOG_CAPACITY);
        Self::new(capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a new alert and return it.
    pub async fn append(&self, kind: StatusKind, details: AlertDetails) -> AlertRecord {
        let record = AlertRecord {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            kind,
            details,
        };

        let mut records = self.records.write().await;
        records.push_back(record.clone());
        while records.len() > self.capacity {
            records.pop_front();
        }

        info!(alert_id = %record.id, status = %kind, "Alert recorded");
        record
    }

    /// Up to `limit` records, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<AlertRecord> {
        self.records
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn last(&self) -> Option<AlertRecord> {
        self.records.read().await.back().cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
