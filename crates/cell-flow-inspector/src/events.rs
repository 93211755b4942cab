//! Event types for engine tracing.
//!
//! Every tracer callback of the engine maps to one [`FlowEvent`] value.
//! Events carry no timing or span information, so a recorded
//! [`ExecutionTrace`] can be compared literally against an expected sequence
//! in tests.

use cell_flow::{CellId, CellKind, FetchResult, Revision, WriteOutcome};
use serde::{Deserialize, Serialize};

/// Events emitted during engine execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    /// A cell was allocated.
    CellCreated { cell: CellId, kind: CellKind },

    /// A signal write completed.
    SignalWritten { cell: CellId, outcome: WriteOutcome },

    /// The outermost batch closed. `revision` is `None` when every staged
    /// write reverted.
    BatchCommitted {
        revision: Option<Revision>,
        committed: Vec<CellId>,
    },

    /// A memo fetch began.
    FetchStart { cell: CellId },

    /// A memo fetch finished.
    FetchEnd { cell: CellId, result: FetchResult },

    /// A memo's thunk ran to completion, whether triggered by a fetch or by
    /// the verifier revalidating a dependency.
    Recomputed { cell: CellId, changed: bool },

    /// A new dependency edge was recorded on the in-progress frame.
    DependencyRecorded {
        dependent: CellId,
        dependency: CellId,
    },
}

/// A recorded sequence of events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    pub events: Vec<FlowEvent>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: FlowEvent) {
        self.events.push(event);
    }

    /// Number of completed recomputations of `cell`, the side channel the
    /// incrementality tests assert against.
    pub fn recompute_count(&self, cell: CellId) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, FlowEvent::Recomputed { cell: c, .. } if *c == cell))
            .count()
    }

    /// Events involving `cell`, in emission order.
    pub fn events_for_cell(&self, cell: CellId) -> Vec<&FlowEvent> {
        self.events
            .iter()
            .filter(|event| involves(event, cell))
            .collect()
    }

    /// Whether any event matches a predicate.
    pub fn has_event<F>(&self, predicate: F) -> bool
    where
        F: Fn(&FlowEvent) -> bool,
    {
        self.events.iter().any(predicate)
    }
}

/// Whether an event concerns a specific cell.
pub(crate) fn involves(event: &FlowEvent, cell: CellId) -> bool {
    match event {
        FlowEvent::CellCreated { cell: c, .. }
        | FlowEvent::SignalWritten { cell: c, .. }
        | FlowEvent::FetchStart { cell: c }
        | FlowEvent::FetchEnd { cell: c, .. }
        | FlowEvent::Recomputed { cell: c, .. } => *c == cell,
        FlowEvent::DependencyRecorded {
            dependent,
            dependency,
        } => *dependent == cell || *dependency == cell,
        FlowEvent::BatchCommitted { committed, .. } => committed.contains(&cell),
    }
}
