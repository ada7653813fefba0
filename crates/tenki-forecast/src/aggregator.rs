//! Concurrent per-region fan-out.

use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::catalog::AreaCatalog;
use crate::client::ForecastSource;
use crate::error::{BatchError, FetchError};
use crate::normalize::normalize;
use crate::types::{AreaCode, AreaFailure, AreaForecast, BatchResult, RegionCode};

type Slot = Option<Result<AreaForecast, FetchError>>;

/// Fetches every area of a region in parallel and aggregates the results.
#[derive(Clone)]
pub struct BatchAggregator {
    catalog: Arc<AreaCatalog>,
    source: Arc<dyn ForecastSource>,
}

impl BatchAggregator {
    pub fn new(catalog: Arc<AreaCatalog>, source: Arc<dyn ForecastSource>) -> Self {
        Self { catalog, source }
    }

    pub fn catalog(&self) -> &Arc<AreaCatalog> {
        &self.catalog
    }

    /// Run one batch for `region`.
    ///
    /// Area failures are collected into `BatchResult::failures` and never end
    /// the batch. Successes keep the region's configured area order. When
    /// `cancel` fires, outstanding fetches are cancelled and aborted and the
    /// call returns `BatchError::Cancelled` without waiting for them.
    #[instrument(skip(self, cancel), fields(region = %region), level = "info")]
    pub async fn run(
        &self,
        region: &RegionCode,
        cancel: &CancellationToken,
    ) -> Result<BatchResult, BatchError> {
        if self.catalog.is_empty() {
            return Err(BatchError::CatalogUnavailable("catalog has no regions".into()));
        }

        let areas = self
            .catalog
            .area_codes(region)
            .ok_or_else(|| BatchError::UnknownRegion(region.clone()))?
            .to_vec();

        tracing::info!("Fetching {} areas for {}", areas.len(), region);

        let mut tasks = JoinSet::new();
        for (index, area) in areas.iter().cloned().enumerate() {
            let source = Arc::clone(&self.source);
            let office = self.catalog.display_name(&area).map(str::to_string);
            let token = cancel.child_token();
            tasks.spawn(async move {
                let result = source
                    .fetch(&area, &token)
                    .await
                    .and_then(|doc| normalize(&area, office.as_deref(), &doc));
                (index, result)
            });
        }

        let mut slots: Vec<Slot> = vec![None; areas.len()];
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    tracing::info!("Batch for {} cancelled with {} fetches outstanding", region, tasks.len());
                    return Err(BatchError::Cancelled);
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((index, result))) => {
                        if let Some(slot) = slots.get_mut(index) {
                            *slot = Some(result);
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Fetch task for {} did not complete: {}", region, e);
                    }
                    None => break,
                },
            }
        }

        Ok(collect(region, &areas, slots))
    }
}

/// Split settled slots into ordered successes and failures. A slot that never
/// reported (its task panicked or was aborted) counts as `Aborted`.
fn collect(region: &RegionCode, areas: &[AreaCode], slots: Vec<Slot>) -> BatchResult {
    let mut successes = Vec::new();
    let mut failures = Vec::new();

    for (area, slot) in areas.iter().zip(slots) {
        match slot {
            Some(Ok(forecast)) => successes.push(forecast),
            Some(Err(cause)) => {
                tracing::warn!("Area {} failed: {}", area, cause);
                failures.push(AreaFailure {
                    area: area.clone(),
                    cause,
                });
            }
            None => failures.push(AreaFailure {
                area: area.clone(),
                cause: FetchError::Aborted("task did not report".into()),
            }),
        }
    }

    tracing::info!(
        "Batch for {} settled: {} succeeded, {} failed",
        region,
        successes.len(),
        failures.len()
    );

    BatchResult {
        region: region.clone(),
        successes,
        failures,
    }
}
