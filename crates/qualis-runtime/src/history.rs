//! Historical non-conformance counts.
//!
//! The anomaly agent asks how many records of a category were raised in a
//! recent window. Lookups are read-only; a failing lookup never fails a
//! validation.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use qualis_core::NonConformanceType;

/// Errors from history lookups.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History source unavailable: {0}")]
    Unavailable(String),

    #[error("History query failed: {0}")]
    QueryFailed(String),
}

/// Read-only source of recent record counts.
#[async_trait]
pub trait HistoryLookup: Send + Sync {
    /// Number of records of `category` raised in the last `window_days` days.
    ///
    /// `Ok(None)` means the source has no data for the category.
    async fn count_recent_by_category(
        &self,
        category: NonConformanceType,
        window_days: u32,
    ) -> Result<Option<u64>, HistoryError>;
}

/// History source that never knows anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

#[async_trait]
impl HistoryLookup for NoHistory {
    async fn count_recent_by_category(
        &self,
        _category: NonConformanceType,
        _window_days: u32,
    ) -> Result<Option<u64>, HistoryError> {
        Ok(None)
    }
}

/// One historical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub category: NonConformanceType,
    pub reported_at: DateTime<Utc>,
}

/// In-memory history, safe to share between concurrent validations.
pub struct InMemoryHistory {
    entries: RwLock<Vec<HistoryEntry>>,

    /// Fixed "now" for reproducible windows; wall clock when unset
    as_of: Option<DateTime<Utc>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::with_entries(Vec::new())
    }

    pub fn with_entries(entries: Vec<HistoryEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
            as_of: None,
        }
    }

    /// Parse a YAML (or JSON) list of entries.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let entries: Vec<HistoryEntry> = serde_yaml::from_str(yaml)?;
        Ok(Self::with_entries(entries))
    }

    /// Measure windows from a fixed instant instead of the wall clock.
    pub fn as_of(mut self, now: DateTime<Utc>) -> Self {
        self.as_of = Some(now);
        self
    }

    pub fn record(&self, entry: HistoryEntry) {
        self.entries.write().push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryLookup for InMemoryHistory {
    async fn count_recent_by_category(
        &self,
        category: NonConformanceType,
        window_days: u32,
    ) -> Result<Option<u64>, HistoryError> {
        let now = self.as_of.unwrap_or_else(Utc::now);
        let since = now - Duration::days(i64::from(window_days));

        let count = self
            .entries
            .read()
            .iter()
            .filter(|e| e.category == category && e.reported_at >= since && e.reported_at <= now)
            .count();

        Ok(Some(count as u64))
    }
}
