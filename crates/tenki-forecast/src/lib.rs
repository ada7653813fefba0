//! Forecast aggregation for Tenki
//!
//! Loads the JMA area catalog, fetches per-area forecast documents, normalizes
//! them into three-day forecasts and aggregates them per region.

pub mod aggregator;
pub mod catalog;
pub mod client;
pub mod document;
pub mod error;
pub mod normalize;
pub mod types;

pub use aggregator::BatchAggregator;
pub use catalog::{AreaCatalog, Region};
pub use client::{ForecastClient, ForecastSource};
pub use document::{ForecastDocument, SeriesArea, TimeSeries};
pub use error::{BatchError, CatalogError, FetchError};
pub use normalize::{normalize, SHORT_RANGE_DAYS};
pub use types::*;
