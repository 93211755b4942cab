//! Event sink trait and a cell-scoped filter.
//!
//! An [`EventSink`] receives the events produced by
//! [`SinkTracer`](crate::SinkTracer). [`CellFilter`] narrows a sink to the
//! cells under observation, which keeps traces readable when a runtime
//! hosts many unrelated cells.

use std::sync::Arc;

use cell_flow::CellId;

use crate::events::{involves, FlowEvent};

/// Receiver of flow events.
///
/// # Example
///
/// ```
/// use cell_flow_inspector::{EventSink, FlowEvent};
///
/// struct PrintSink;
///
/// impl EventSink for PrintSink {
///     fn emit(&self, event: FlowEvent) {
///         println!("{event:?}");
///     }
/// }
/// ```
pub trait EventSink: Send + Sync + 'static {
    /// Called once per engine event.
    fn emit(&self, event: FlowEvent);
}

/// Shared sinks receive the same events as their owner.
impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: FlowEvent) {
        (**self).emit(event);
    }
}

/// Sink that forwards only events involving a chosen set of cells.
///
/// Creation, write, fetch, and recompute events pass when they name a
/// watched cell; a dependency edge passes when either endpoint is watched;
/// a batch commit passes when any watched cell committed in it.
pub struct CellFilter<S> {
    cells: Vec<CellId>,
    inner: S,
}

impl<S: EventSink> CellFilter<S> {
    pub fn new(cells: impl IntoIterator<Item = CellId>, inner: S) -> Self {
        Self {
            cells: cells.into_iter().collect(),
            inner,
        }
    }

    /// Widen the watch set after construction.
    pub fn watch(&mut self, cell: CellId) {
        if !self.cells.contains(&cell) {
            self.cells.push(cell);
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: EventSink> EventSink for CellFilter<S> {
    fn emit(&self, event: FlowEvent) {
        if self.cells.iter().any(|&cell| involves(&event, cell)) {
            self.inner.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::EventCollector;
    use cell_flow::{Runtime, Signal};

    #[test]
    fn test_cell_filter_scopes_the_trace() {
        let runtime = Runtime::new();
        let watched = Signal::new(&runtime, 0).id();
        let other = Signal::new(&runtime, 0).id();

        let collector = Arc::new(EventCollector::new());
        let filter = CellFilter::new([watched], collector.clone());

        filter.emit(FlowEvent::FetchStart { cell: watched });
        filter.emit(FlowEvent::FetchStart { cell: other });
        filter.emit(FlowEvent::DependencyRecorded {
            dependent: other,
            dependency: watched,
        });

        assert_eq!(
            collector.trace().events,
            vec![
                FlowEvent::FetchStart { cell: watched },
                FlowEvent::DependencyRecorded {
                    dependent: other,
                    dependency: watched,
                },
            ]
        );
    }

    #[test]
    fn test_watch_widens_the_set() {
        let runtime = Runtime::new();
        let a = Signal::new(&runtime, 0).id();
        let b = Signal::new(&runtime, 0).id();

        let collector = Arc::new(EventCollector::new());
        let mut filter = CellFilter::new([a], collector.clone());
        filter.emit(FlowEvent::FetchStart { cell: b });
        filter.watch(b);
        filter.emit(FlowEvent::FetchStart { cell: b });

        assert_eq!(
            collector.trace().events,
            vec![FlowEvent::FetchStart { cell: b }]
        );
    }
}
