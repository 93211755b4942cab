//! Adapter from the engine's [`Tracer`] callbacks to [`FlowEvent`]s.

use std::sync::Arc;

use cell_flow::{CellId, CellKind, FetchResult, Revision, Tracer, WriteOutcome};

use crate::events::FlowEvent;
use crate::sink::EventSink;

/// Tracer that forwards every engine callback to an [`EventSink`].
///
/// Install it with [`Runtime::with_tracer`](cell_flow::Runtime::with_tracer)
/// or [`Runtime::set_tracer`](cell_flow::Runtime::set_tracer).
pub struct SinkTracer {
    sink: Arc<dyn EventSink>,
}

impl SinkTracer {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }
}

impl Tracer for SinkTracer {
    fn on_cell_created(&self, cell: CellId, kind: CellKind) {
        self.sink.emit(FlowEvent::CellCreated { cell, kind });
    }

    fn on_signal_write(&self, cell: CellId, outcome: WriteOutcome) {
        self.sink.emit(FlowEvent::SignalWritten { cell, outcome });
    }

    fn on_batch_commit(&self, revision: Option<Revision>, committed: &[CellId]) {
        self.sink.emit(FlowEvent::BatchCommitted {
            revision,
            committed: committed.to_vec(),
        });
    }

    fn on_fetch_start(&self, cell: CellId) {
        self.sink.emit(FlowEvent::FetchStart { cell });
    }

    fn on_fetch_end(&self, cell: CellId, result: FetchResult) {
        self.sink.emit(FlowEvent::FetchEnd { cell, result });
    }

    fn on_recompute(&self, cell: CellId, changed: bool) {
        self.sink.emit(FlowEvent::Recomputed { cell, changed });
    }

    fn on_dependency_recorded(&self, dependent: CellId, dependency: CellId) {
        self.sink.emit(FlowEvent::DependencyRecorded {
            dependent,
            dependency,
        });
    }
}
