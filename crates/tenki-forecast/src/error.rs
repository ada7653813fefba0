//! Forecast error types.
//!
//! `FetchError` is area-level and travels inside a `BatchResult`.
//! `BatchError` is batch-level and ends a selection.

use tenki_core::NetworkError;
use thiserror::Error;

use crate::types::RegionCode;

/// Failure of one area's fetch or normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("{0}")]
    Network(#[from] NetworkError),

    #[error("Malformed forecast document: {0}")]
    Malformed(String),

    #[error("Fetch cancelled")]
    Cancelled,

    #[error("Fetch task aborted: {0}")]
    Aborted(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Network(NetworkError::Timeout))
    }
}

/// The area catalog could not be retrieved or parsed.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Area catalog unavailable: {0}")]
    Unavailable(String),
}

/// Batch-level failure of `BatchAggregator::run`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("Unknown region: {0}")]
    UnknownRegion(RegionCode),

    #[error("Area catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Batch cancelled")]
    Cancelled,
}

impl From<CatalogError> for BatchError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Unavailable(reason) => BatchError::CatalogUnavailable(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_detected() {
        assert!(FetchError::Network(NetworkError::Timeout).is_timeout());
        assert!(!FetchError::Malformed("x".into()).is_timeout());
    }

    #[test]
    fn catalog_error_becomes_batch_error() {
        let err: BatchError = CatalogError::Unavailable("503".into()).into();
        assert_eq!(err, BatchError::CatalogUnavailable("503".into()));
    }

    #[test]
    fn fetch_error_display_keeps_network_detail() {
        let err = FetchError::Network(NetworkError::ServerError {
            status: 502,
            message: "bad gateway".into(),
        });
        assert!(err.to_string().contains("502"));
    }
}
