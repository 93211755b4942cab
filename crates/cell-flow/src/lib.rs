//! Cell-Flow: a pull-based incremental computation engine.
//!
//! Values live in *cells*. A [`Signal`] is an input cell set from outside;
//! a [`Memo`] is a derived cell produced by a pure thunk. Reads inside a
//! thunk are recorded as dependencies, and a monotonic revision clock ticks
//! once per committed input change. On a read, the engine recomputes only
//! the memos whose inputs could actually have affected them; everything
//! else is answered from cache, in most cases without touching the
//! dependency graph at all.
//!
//! # Key features
//!
//! - **Automatic dependency tracking**: nested `get` calls during a compute
//!   record exactly what was read, in first-read order.
//! - **Early cutoff (backdating)**: a recomputation that produces an equal
//!   value does not invalidate downstream memos.
//! - **Durability shortcuts**: memos over rarely-changing inputs skip the
//!   verification walk entirely.
//! - **Batched updates**: grouped signal writes commit as one revision, with
//!   transactional reads and net no-op (revert) detection.
//! - **Cycle detection**: a memo that transitively reads itself fails with
//!   [`CycleError`] without corrupting the graph.
//!
//! # Example
//!
//! ```
//! use cell_flow::{Memo, Runtime, Signal};
//!
//! let runtime = Runtime::new();
//! let width = Signal::new(&runtime, 4);
//! let height = Signal::new(&runtime, 5);
//! let area = {
//!     let (width, height) = (width.clone(), height.clone());
//!     Memo::new(&runtime, move || width.get() * height.get())
//! };
//!
//! assert_eq!(area.get(), 20);
//! width.set(6);
//! assert_eq!(area.get(), 30);
//! // Same revision, no input change: answered from cache.
//! assert_eq!(area.get(), 30);
//! ```
//!
//! # Scope
//!
//! The engine is single-threaded: [`Runtime`] and its handles are
//! `!Send`. Value types only need `Clone + PartialEq`; equality is consulted
//! for same-value writes, backdating, and revert detection. There is no
//! garbage collection of cells: a cell lives as long as its runtime.

mod batch;
mod cell;
mod error;
mod memo;
mod revision;
mod runtime;
mod signal;
mod stack;
mod store;
pub mod tracer;
mod verify;

pub use cell::CellId;
pub use error::CycleError;
pub use memo::Memo;
pub use revision::{Durability, Revision};
pub use runtime::Runtime;
pub use signal::Signal;
pub use tracer::{CellKind, FetchResult, NoopTracer, Tracer, WriteOutcome};
