//! Forecast store trait and error types.
//!
//! The store is an append-only log of rendered forecast days. It has no
//! update or delete path.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tenki_core::DatabaseError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite failure, classified.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Entry rejected before reaching storage.
    #[error("Invalid entry: {0}")]
    Invalid(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One forecast day to persist
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEntry {
    /// Area display name, `<office> - <sub-area>`
    pub location: String,
    pub date: String,
    pub condition: String,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
}

impl ForecastEntry {
    pub(crate) fn validate(&self) -> StoreResult<()> {
        if self.location.trim().is_empty() {
            return Err(StoreError::Invalid("location is empty".into()));
        }
        if self.date.trim().is_empty() {
            return Err(StoreError::Invalid("date is empty".into()));
        }
        Ok(())
    }
}

/// A persisted row
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReport {
    pub id: i64,
    pub entry: ForecastEntry,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only forecast log.
///
/// Appends are independent; a batch of appends is not transactional.
pub trait ForecastStore: Send {
    fn append(&self, entry: &ForecastEntry) -> StoreResult<()>;

    /// All rows in insertion order.
    fn list(&self) -> StoreResult<Vec<StoredReport>>;

    fn count(&self) -> StoreResult<usize>;
}

impl<T: ForecastStore + Sync + ?Sized> ForecastStore for Arc<T> {
    fn append(&self, entry: &ForecastEntry) -> StoreResult<()> {
        (**self).append(entry)
    }

    fn list(&self) -> StoreResult<Vec<StoredReport>> {
        (**self).list()
    }

    fn count(&self) -> StoreResult<usize> {
        (**self).count()
    }
}
