//! Selection lifecycle state machine.
//!
//! At most one batch is `Fetching` at a time. Each selection gets a fresh
//! generation number; results tagged with any other generation are stale.

/// Monotonic identifier for one user selection.
pub type Generation = u64;

/// State of the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Fetching {
        generation: Generation,
        region: String,
    },
}

/// How a selection ended. The coordinator returns to `Idle` after each of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Batch completed (possibly with area failures) and was rendered.
    Delivered {
        generation: Generation,
        rendered: usize,
        failed: usize,
    },
    /// A newer selection replaced this one; its result is discarded.
    Superseded { generation: Generation },
    /// Batch-level failure; the presenter was given an explicit error.
    Failed {
        generation: Generation,
        reason: String,
    },
}

impl SelectionOutcome {
    pub fn generation(&self) -> Generation {
        match self {
            SelectionOutcome::Delivered { generation, .. }
            | SelectionOutcome::Superseded { generation }
            | SelectionOutcome::Failed { generation, .. } => *generation,
        }
    }
}

impl SelectionState {
    pub fn is_fetching(&self) -> bool {
        matches!(self, SelectionState::Fetching { .. })
    }

    /// Generation of the in-flight batch, if any.
    pub fn current_generation(&self) -> Option<Generation> {
        match self {
            SelectionState::Fetching { generation, .. } => Some(*generation),
            SelectionState::Idle => None,
        }
    }

    /// True if a result tagged `generation` belongs to the in-flight batch.
    pub fn accepts(&self, generation: Generation) -> bool {
        self.current_generation() == Some(generation)
    }

    /// Start a new selection. Returns the new state and, when a batch was
    /// already in flight, the outcome for the batch being replaced.
    pub fn on_select(
        &self,
        generation: Generation,
        region: impl Into<String>,
    ) -> (Self, Option<SelectionOutcome>) {
        let superseded = self
            .current_generation()
            .map(|old| SelectionOutcome::Superseded { generation: old });
        (
            SelectionState::Fetching {
                generation,
                region: region.into(),
            },
            superseded,
        )
    }

    /// State after a terminal outcome for the current batch.
    pub fn on_finished(&self) -> Self {
        SelectionState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_has_no_generation() {
        let s = SelectionState::Idle;
        assert!(!s.is_fetching());
        assert_eq!(s.current_generation(), None);
        assert!(!s.accepts(1));
    }

    #[test]
    fn select_from_idle_starts_fetching() {
        let (s, superseded) = SelectionState::Idle.on_select(1, "kanto");
        assert!(s.is_fetching());
        assert!(s.accepts(1));
        assert_eq!(superseded, None);
    }

    #[test]
    fn select_while_fetching_supersedes_previous() {
        let (s, _) = SelectionState::Idle.on_select(1, "kanto");
        let (s, superseded) = s.on_select(2, "tohoku");
        assert_eq!(
            superseded,
            Some(SelectionOutcome::Superseded { generation: 1 })
        );
        assert!(s.accepts(2));
        assert!(!s.accepts(1));
    }

    #[test]
    fn finished_transitions_to_idle() {
        let (s, _) = SelectionState::Idle.on_select(7, "okinawa");
        assert_eq!(s.on_finished(), SelectionState::Idle);
    }

    #[test]
    fn outcome_reports_generation() {
        let outcome = SelectionOutcome::Failed {
            generation: 4,
            reason: "unknown region".into(),
        };
        assert_eq!(outcome.generation(), 4);
    }
}
