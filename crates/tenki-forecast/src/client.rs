//! JMA forecast endpoint client.

use async_trait::async_trait;
use std::time::Duration;
use tenki_core::{NetworkError, ReqwestErrorExt};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::document::ForecastDocument;
use crate::error::FetchError;
use crate::types::AreaCode;

const JMA_FORECAST_BASE: &str = "https://www.jma.go.jp/bosai/forecast/data/forecast";

/// Source of raw per-area forecast documents.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetch one area's document. Resolves to `FetchError::Cancelled` once
    /// `cancel` fires; no partial document is returned.
    async fn fetch(
        &self,
        area: &AreaCode,
        cancel: &CancellationToken,
    ) -> Result<ForecastDocument, FetchError>;
}

/// HTTP client for `<base>/<area>.json`.
///
/// One attempt per call. The per-request timeout is set on the underlying
/// client and surfaces as `NetworkError::Timeout`.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: reqwest::Client,
    base_url: String,
}

impl ForecastClient {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing client (and its connection pool).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn jma(timeout: Duration) -> reqwest::Result<Self> {
        Self::new(JMA_FORECAST_BASE, timeout)
    }

    pub fn url_for(&self, area: &AreaCode) -> String {
        format!("{}/{}.json", self.base_url, area)
    }

    async fn request(&self, area: &AreaCode) -> Result<ForecastDocument, FetchError> {
        let response = self
            .client
            .get(self.url_for(area))
            .send()
            .await
            .map_err(|e| FetchError::Network(e.into_network_error()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::Network(NetworkError::ServerError {
                status: status.as_u16(),
                message,
            }));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.into_network_error()))?;

        ForecastDocument::from_slice(&body)
    }
}

#[async_trait]
impl ForecastSource for ForecastClient {
    #[instrument(skip(self, cancel), fields(area = %area), level = "debug")]
    async fn fetch(
        &self,
        area: &AreaCode,
        cancel: &CancellationToken,
    ) -> Result<ForecastDocument, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Fetch for {} cancelled", area);
                Err(FetchError::Cancelled)
            }
            result = self.request(area) => result,
        }
    }
}
