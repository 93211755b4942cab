//! Event collector for testing.
//!
//! [`EventCollector`] buffers events for later inspection. Traces compare
//! literally, and the recompute counts the incrementality properties talk
//! about are one call away. A capacity bound turns the collector into a
//! keep-latest ring buffer, so it can stay installed for long sessions
//! without growing without bound.

use std::collections::VecDeque;

use parking_lot::Mutex;

use cell_flow::CellId;

use crate::events::{ExecutionTrace, FlowEvent};
use crate::sink::EventSink;

#[derive(Debug, Default)]
struct Buffer {
    events: VecDeque<FlowEvent>,
    evicted: u64,
}

/// Buffers events for assertions.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use cell_flow::{Memo, Runtime, Signal};
/// use cell_flow_inspector::{EventCollector, SinkTracer};
///
/// let collector = Arc::new(EventCollector::new());
/// let runtime = Runtime::with_tracer(SinkTracer::new(collector.clone()));
///
/// let input = Signal::new(&runtime, 1);
/// let double = {
///     let input = input.clone();
///     Memo::new(&runtime, move || input.get() * 2)
/// };
/// assert_eq!(double.get(), 2);
/// assert_eq!(double.get(), 2);
///
/// // The second read was a cache hit.
/// assert_eq!(collector.recompute_count(double.id()), 1);
/// ```
#[derive(Debug, Default)]
pub struct EventCollector {
    capacity: Option<usize>,
    buffer: Mutex<Buffer>,
}

impl EventCollector {
    /// Collector that buffers every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector that keeps only the most recent `capacity` events,
    /// counting evictions instead of growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            buffer: Mutex::new(Buffer::default()),
        }
    }

    /// Snapshot of the buffered events, oldest first.
    pub fn trace(&self) -> ExecutionTrace {
        ExecutionTrace {
            events: self.buffer.lock().events.iter().cloned().collect(),
        }
    }

    /// Move the buffered events out, leaving the collector empty. The usual
    /// test rhythm: act, drain, assert on the drained trace, repeat.
    pub fn drain(&self) -> ExecutionTrace {
        ExecutionTrace {
            events: std::mem::take(&mut self.buffer.lock().events).into(),
        }
    }

    /// Completed recomputations of `cell` currently in the buffer.
    pub fn recompute_count(&self, cell: CellId) -> usize {
        self.buffer
            .lock()
            .events
            .iter()
            .filter(|event| matches!(event, FlowEvent::Recomputed { cell: c, .. } if *c == cell))
            .count()
    }

    /// Events discarded by the capacity bound so far.
    pub fn evicted(&self) -> u64 {
        self.buffer.lock().evicted
    }
}

impl EventSink for EventCollector {
    fn emit(&self, event: FlowEvent) {
        let mut buffer = self.buffer.lock();
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                buffer.evicted += 1;
                return;
            }
            while buffer.events.len() >= capacity {
                buffer.events.pop_front();
                buffer.evicted += 1;
            }
        }
        buffer.events.push_back(event);
    }
}
