//! Forecast backend: one aggregation batch per selection.
//! All network work runs off the presentation thread; results sent via mpsc.

use std::sync::mpsc::Sender;

use tenki_core::Generation;
use tenki_forecast::{BatchAggregator, BatchError, BatchResult, RegionCode};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Messages sent from batch tasks back to the presentation thread
#[derive(Debug)]
pub enum ForecastServiceMessage {
    /// A batch settled. `generation` identifies the selection that started it.
    BatchDone {
        generation: Generation,
        region: RegionCode,
        result: Result<BatchResult, BatchError>,
    },
}

/// Run a batch for `region` on the runtime.
/// Sends `BatchDone` on the channel when it settles or is cancelled.
pub fn request_batch(
    tx: &Sender<ForecastServiceMessage>,
    runtime: &Handle,
    aggregator: BatchAggregator,
    region: RegionCode,
    generation: Generation,
    cancel: CancellationToken,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = aggregator.run(&region, &cancel).await;
        if tx
            .send(ForecastServiceMessage::BatchDone {
                generation,
                region,
                result,
            })
            .is_err()
        {
            tracing::debug!("Selection {} finished after the receiver closed", generation);
        }
    });
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tenki_forecast::{AreaCatalog, AreaCode, FetchError, ForecastDocument, ForecastSource};

    struct NeverCalled;

    #[async_trait::async_trait]
    impl ForecastSource for NeverCalled {
        async fn fetch(
            &self,
            _area: &AreaCode,
            _cancel: &CancellationToken,
        ) -> Result<ForecastDocument, FetchError> {
            Err(FetchError::Aborted("unexpected fetch".into()))
        }
    }

    #[test]
    fn unknown_region_is_reported_on_channel() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let aggregator = BatchAggregator::new(
            Arc::new(AreaCatalog::from_config(&tenki_core::default_regions(), HashMap::new())),
            Arc::new(NeverCalled),
        );
        let (tx, rx) = std::sync::mpsc::channel();

        request_batch(
            &tx,
            runtime.handle(),
            aggregator,
            RegionCode::new("atlantis"),
            7,
            CancellationToken::new(),
        );

        let ForecastServiceMessage::BatchDone {
            generation, result, ..
        } = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(generation, 7);
        assert_eq!(
            result.unwrap_err(),
            BatchError::UnknownRegion(RegionCode::new("atlantis"))
        );
    }
}
