//! Application services bootstrap.
//!
//! `AppServices` owns the tokio runtime, the shared HTTP client, the area
//! catalog and the forecast store. It is built once at startup; a catalog that
//! cannot be loaded is a startup failure.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tenki_core::{AppError, Config, ForecastError, ReqwestErrorExt};
use tenki_forecast::{AreaCatalog, BatchAggregator, ForecastClient};
use tenki_store::SqliteForecastStore;

use crate::coordinator::SelectionCoordinator;
use crate::presenter::Presenter;

pub struct AppServices {
    /// Tokio runtime for batch work
    runtime: tokio::runtime::Runtime,

    catalog: Arc<AreaCatalog>,

    aggregator: BatchAggregator,

    /// SQLite forecast log, shared with the coordinator
    store: Arc<SqliteForecastStore>,
}

impl AppServices {
    /// Build every service from `config`.
    ///
    /// Must be called outside any tokio runtime; the catalog is loaded with a
    /// blocking call on the runtime created here.
    pub fn init(config: &Config) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("tenki-tokio")
            .build()
            .context("Failed to create tokio runtime")?;

        let http = reqwest::Client::builder()
            .timeout(config.forecast.request_timeout())
            .build()
            .map_err(|e| AppError::Network(e.into_network_error()))
            .context("Failed to create HTTP client")?;

        let catalog = runtime
            .block_on(AreaCatalog::load(
                &http,
                &config.forecast.catalog_url,
                &config.regions,
            ))
            .map_err(|e| {
                tracing::error!("Area catalog unavailable: {}", e);
                AppError::Forecast(ForecastError::CatalogUnavailable(e.to_string()))
            })
            .context("Cannot start without the area catalog")?;
        let catalog = Arc::new(catalog);

        let client = ForecastClient::with_client(http, &config.forecast.forecast_base_url);
        let aggregator = BatchAggregator::new(Arc::clone(&catalog), Arc::new(client));

        let db_path = config.database_path();
        let store = SqliteForecastStore::open(&db_path)
            .with_context(|| format!("Failed to open forecast store at {}", db_path.display()))?;

        tracing::info!(
            "AppServices ready: {} regions, store at {}",
            catalog.regions().len(),
            db_path.display()
        );

        Ok(Self {
            runtime,
            catalog,
            aggregator,
            store: Arc::new(store),
        })
    }

    /// Get the tokio runtime handle.
    pub fn runtime(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    pub fn catalog(&self) -> &Arc<AreaCatalog> {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<SqliteForecastStore> {
        &self.store
    }

    /// A coordinator for the calling (presentation) thread.
    pub fn coordinator<P: Presenter>(
        &self,
        presenter: P,
    ) -> SelectionCoordinator<P, Arc<SqliteForecastStore>> {
        SelectionCoordinator::new(
            self.runtime(),
            self.aggregator.clone(),
            presenter,
            Arc::clone(&self.store),
        )
    }

    /// Stop the runtime, giving in-flight batches a moment to unwind.
    pub fn shutdown(self) {
        tracing::info!("AppServices shutdown initiated");
        self.runtime.shutdown_timeout(Duration::from_secs(1));
    }
}
