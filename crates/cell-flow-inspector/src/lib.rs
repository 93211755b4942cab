//! Observability for the cell-flow engine.
//!
//! This crate turns the engine's [`Tracer`](cell_flow::Tracer) callbacks
//! into concrete [`FlowEvent`] values that can be buffered, scoped, and
//! compared in tests:
//!
//! - [`SinkTracer`] adapts tracer callbacks into events,
//! - [`EventSink`] is the receiving interface,
//! - [`CellFilter`] scopes a sink to the cells under observation,
//! - [`EventCollector`] buffers events for assertions, optionally as a
//!   keep-latest ring buffer.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use cell_flow::{Memo, Runtime, Signal};
//! use cell_flow_inspector::{EventCollector, SinkTracer};
//!
//! let collector = Arc::new(EventCollector::new());
//! let runtime = Runtime::with_tracer(SinkTracer::new(collector.clone()));
//!
//! let input = Signal::new(&runtime, 2);
//! let double = {
//!     let input = input.clone();
//!     Memo::new(&runtime, move || input.get() * 2)
//! };
//! assert_eq!(double.get(), 4);
//! assert_eq!(double.get(), 4);
//!
//! // The second read was a cache hit: exactly one recomputation happened.
//! assert_eq!(collector.recompute_count(double.id()), 1);
//! ```

mod collector;
mod events;
mod sink;
mod tracer_impl;

pub use collector::EventCollector;
pub use events::{ExecutionTrace, FlowEvent};
pub use sink::{CellFilter, EventSink};
pub use tracer_impl::SinkTracer;
