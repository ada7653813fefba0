pub mod backend;
pub mod sqlite;

pub use backend::{ForecastEntry, ForecastStore, StoreError, StoreResult, StoredReport};
pub use sqlite::SqliteForecastStore;
