use tenki_core::{AppError, ForecastError, NetworkError};
use tenki_forecast::{BatchError, FetchError};

/// Batch-level failure as an application error.
pub fn batch_error(e: &BatchError) -> AppError {
    match e {
        BatchError::UnknownRegion(region) => {
            AppError::Forecast(ForecastError::UnknownRegion(region.to_string()))
        }
        BatchError::CatalogUnavailable(s) => {
            AppError::Forecast(ForecastError::CatalogUnavailable(s.clone()))
        }
        BatchError::Cancelled => AppError::Forecast(ForecastError::ServiceUnavailable),
    }
}

/// Area-level failure as an application error, for per-area failure lines.
pub fn fetch_error(e: &FetchError) -> AppError {
    match e {
        FetchError::Network(n) => AppError::Network(n.clone()),
        FetchError::Malformed(s) => AppError::Network(NetworkError::InvalidResponse(s.clone())),
        FetchError::Cancelled | FetchError::Aborted(_) => {
            AppError::Forecast(ForecastError::ServiceUnavailable)
        }
    }
}
