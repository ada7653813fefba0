//! Selection lifecycle: start, supersede and deliver batches.
//!
//! The coordinator lives on the presentation thread. Batches run on the tokio
//! runtime and report back through one mpsc channel; only `poll_channel` and
//! `pump` touch the presenter and the store.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use tenki_core::{Generation, SelectionOutcome, SelectionState};
use tenki_forecast::{BatchAggregator, BatchError, BatchResult, RegionCode};
use tenki_store::{ForecastEntry, ForecastStore};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::error_mapping;
use crate::presenter::Presenter;
use crate::services::{request_batch, ForecastServiceMessage};

pub struct SelectionCoordinator<P: Presenter, S: ForecastStore> {
    runtime: Handle,
    aggregator: BatchAggregator,
    presenter: P,
    store: S,
    tx: Sender<ForecastServiceMessage>,
    rx: Receiver<ForecastServiceMessage>,
    state: SelectionState,
    cancel_token: Option<CancellationToken>,
    next_generation: Generation,
    pending: VecDeque<SelectionOutcome>,
}

impl<P: Presenter, S: ForecastStore> SelectionCoordinator<P, S> {
    pub fn new(runtime: Handle, aggregator: BatchAggregator, presenter: P, store: S) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        Self {
            runtime,
            aggregator,
            presenter,
            store,
            tx,
            rx,
            state: SelectionState::Idle,
            cancel_token: None,
            next_generation: 1,
            pending: VecDeque::new(),
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn aggregator(&self) -> &BatchAggregator {
        &self.aggregator
    }

    /// Start a batch for `region`, superseding any batch still in flight.
    pub fn select(&mut self, region: &RegionCode) -> Generation {
        let generation = self.next_generation;
        self.next_generation += 1;

        let (state, superseded) = self.state.on_select(generation, region.as_str());
        if let Some(outcome) = superseded {
            self.cancel_in_flight();
            tracing::info!(
                "Selection {} superseded by {} ({})",
                outcome.generation(),
                generation,
                region
            );
            self.pending.push_back(outcome);
        }
        self.state = state;

        let token = CancellationToken::new();
        self.cancel_token = Some(token.clone());
        request_batch(
            &self.tx,
            &self.runtime,
            self.aggregator.clone(),
            region.clone(),
            generation,
            token,
        );

        tracing::info!("Selection {} started for {}", generation, region);
        generation
    }

    /// Cancel the in-flight batch, if any. Nothing is rendered for it.
    pub fn cancel_current(&mut self) -> Option<SelectionOutcome> {
        let generation = self.state.current_generation()?;
        self.cancel_in_flight();
        self.state = self.state.on_finished();
        tracing::info!("Selection {} cancelled", generation);
        Some(SelectionOutcome::Superseded { generation })
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }

    /// Handle every message already waiting, without blocking.
    pub fn poll_channel(&mut self) -> Vec<SelectionOutcome> {
        let mut outcomes: Vec<SelectionOutcome> = self.pending.drain(..).collect();
        while let Ok(msg) = self.rx.try_recv() {
            outcomes.extend(self.handle(msg));
        }
        outcomes
    }

    /// Block up to `timeout` for the next outcome.
    pub fn pump(&mut self, timeout: Duration) -> Option<SelectionOutcome> {
        if let Some(outcome) = self.pending.pop_front() {
            return Some(outcome);
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            match self.rx.recv_timeout(remaining) {
                Ok(msg) => {
                    if let Some(outcome) = self.handle(msg) {
                        return Some(outcome);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None
                }
            }
        }
    }

    /// Drain pending outcomes and wait up to `timeout` for the in-flight batch
    /// to finish. Used when no further selections can arrive.
    pub fn settle(&mut self, timeout: Duration) -> Vec<SelectionOutcome> {
        let mut outcomes = self.poll_channel();
        let deadline = Instant::now() + timeout;
        while self.state.is_fetching() {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                break;
            };
            match self.pump(remaining) {
                Some(outcome) => outcomes.push(outcome),
                None => break,
            }
        }
        outcomes
    }

    fn handle(&mut self, msg: ForecastServiceMessage) -> Option<SelectionOutcome> {
        match msg {
            ForecastServiceMessage::BatchDone {
                generation,
                region,
                result,
            } => {
                if !self.state.accepts(generation) {
                    tracing::debug!(
                        "Discarding result of superseded selection {} ({})",
                        generation,
                        region
                    );
                    return None;
                }

                self.state = self.state.on_finished();
                self.cancel_token = None;

                match result {
                    Ok(batch) => Some(self.deliver(generation, &batch)),
                    Err(BatchError::Cancelled) => {
                        tracing::debug!("Selection {} cancelled", generation);
                        Some(SelectionOutcome::Superseded { generation })
                    }
                    Err(e) => {
                        tracing::warn!("Selection {} failed: {}", generation, e);
                        self.presenter
                            .render_error(error_mapping::batch_error(&e).user_message());
                        Some(SelectionOutcome::Failed {
                            generation,
                            reason: e.to_string(),
                        })
                    }
                }
            }
        }
    }

    fn deliver(&mut self, generation: Generation, batch: &BatchResult) -> SelectionOutcome {
        self.presenter.render(batch);
        self.persist(batch);

        tracing::info!(
            "Selection {} delivered: {} days, {} areas failed",
            generation,
            batch.day_count(),
            batch.failures.len()
        );
        SelectionOutcome::Delivered {
            generation,
            rendered: batch.day_count(),
            failed: batch.failures.len(),
        }
    }

    /// One append per rendered day. A failed append is logged and skipped.
    fn persist(&self, batch: &BatchResult) {
        for area in &batch.successes {
            for day in &area.days {
                let entry = ForecastEntry {
                    location: area.name.clone(),
                    date: day.date.clone(),
                    condition: day.condition.clone(),
                    temperature_max: day.max_temp.value(),
                    temperature_min: day.min_temp.value(),
                };
                if let Err(e) = self.store.append(&entry) {
                    tracing::warn!(
                        "Failed to store forecast for {} on {}: {}",
                        entry.location,
                        entry.date,
                        e
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tenki_forecast::{
        AreaCatalog, AreaCode, FetchError, ForecastDocument, ForecastSource,
    };
    use tenki_store::SqliteForecastStore;

    struct Idle;

    #[async_trait::async_trait]
    impl ForecastSource for Idle {
        async fn fetch(
            &self,
            _area: &AreaCode,
            cancel: &CancellationToken,
        ) -> Result<ForecastDocument, FetchError> {
            cancel.cancelled().await;
            Err(FetchError::Cancelled)
        }
    }

    #[derive(Default)]
    struct Counting {
        renders: usize,
        errors: usize,
    }

    impl Presenter for Counting {
        fn render(&mut self, _result: &BatchResult) {
            self.renders += 1;
        }

        fn render_error(&mut self, _reason: &str) {
            self.errors += 1;
        }
    }

    fn coordinator(
        runtime: &tokio::runtime::Runtime,
    ) -> SelectionCoordinator<Counting, SqliteForecastStore> {
        let catalog = AreaCatalog::from_config(&tenki_core::default_regions(), HashMap::new());
        let aggregator = BatchAggregator::new(Arc::new(catalog), Arc::new(Idle));
        SelectionCoordinator::new(
            runtime.handle().clone(),
            aggregator,
            Counting::default(),
            SqliteForecastStore::open_in_memory().unwrap(),
        )
    }

    #[test]
    fn late_success_from_superseded_generation_is_not_rendered() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut coordinator = coordinator(&runtime);

        let old = coordinator.select(&RegionCode::new("kanto"));
        let new = coordinator.select(&RegionCode::new("kinki"));
        assert_ne!(old, new);

        // The superseded batch completes successfully after all.
        coordinator
            .tx
            .send(ForecastServiceMessage::BatchDone {
                generation: old,
                region: RegionCode::new("kanto"),
                result: Ok(BatchResult {
                    region: RegionCode::new("kanto"),
                    successes: vec![],
                    failures: vec![],
                }),
            })
            .unwrap();

        let outcomes = coordinator.poll_channel();
        assert_eq!(outcomes, vec![SelectionOutcome::Superseded { generation: old }]);
        assert_eq!(coordinator.presenter().renders, 0);
        assert!(coordinator.state().accepts(new));
    }

    #[test]
    fn cancel_current_returns_to_idle_without_rendering() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut coordinator = coordinator(&runtime);

        let generation = coordinator.select(&RegionCode::new("kanto"));
        assert_eq!(
            coordinator.cancel_current(),
            Some(SelectionOutcome::Superseded { generation })
        );
        assert_eq!(coordinator.state(), &SelectionState::Idle);
        assert_eq!(coordinator.cancel_current(), None);

        // The cancelled batch still reports, and is dropped as stale.
        assert_eq!(coordinator.pump(Duration::from_millis(500)), None);
        assert_eq!(coordinator.presenter().renders, 0);
        assert_eq!(coordinator.presenter().errors, 0);
    }
}
