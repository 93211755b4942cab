//! Tracer trait for observing engine execution.
//!
//! The runtime reports every structurally interesting step (cell creation,
//! signal writes, batch commits, memo fetches, recomputations, dependency
//! edges) to an installed [`Tracer`]. The default [`NoopTracer`] keeps this
//! zero-cost when observation is not needed.
//!
//! All methods have empty default implementations, so a tracer only
//! overrides the events it cares about. Callbacks are invoked with no engine
//! locks held, so they are free to read back through the public API.
//!
//! # Example
//!
//! ```
//! use cell_flow::{CellId, FetchResult, Runtime, Signal, Tracer};
//!
//! struct PrintTracer;
//!
//! impl Tracer for PrintTracer {
//!     fn on_fetch_end(&self, cell: CellId, result: FetchResult) {
//!         println!("fetch of cell {cell} ended: {result:?}");
//!     }
//! }
//!
//! let runtime = Runtime::with_tracer(PrintTracer);
//! let input = Signal::new(&runtime, 1);
//! assert_eq!(input.get(), 1);
//! ```

use crate::cell::CellId;
use crate::revision::Revision;

/// Which flavor of cell an event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellKind {
    Signal,
    Memo,
}

/// Outcome of a single signal write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WriteOutcome {
    /// The new value compared equal to the visible value; nothing happened.
    Unchanged,
    /// The value was committed and the clock advanced to this revision.
    Committed(Revision),
    /// The value was staged into an open batch.
    Staged,
}

/// How a memo fetch was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FetchResult {
    /// Already verified at the current revision.
    CacheHit,
    /// No input at or above the memo's durability changed since the last
    /// verification; the dependency walk was skipped.
    DurabilitySkip,
    /// The dependency walk confirmed the cached value without recomputing.
    Validated,
    /// Recomputed and produced a new value.
    Changed,
    /// Recomputed to an equal value; `changed_at` was backdated.
    Unchanged,
    /// The fetch re-entered a memo that is already computing.
    CycleDetected,
}

/// Observer of engine execution.
pub trait Tracer {
    /// A cell was allocated.
    fn on_cell_created(&self, _cell: CellId, _kind: CellKind) {}

    /// A signal `set` or `set_unconditional` completed.
    fn on_signal_write(&self, _cell: CellId, _outcome: WriteOutcome) {}

    /// The outermost batch closed. `revision` is `None` when every staged
    /// write reverted to its pre-batch value.
    fn on_batch_commit(&self, _revision: Option<Revision>, _committed: &[CellId]) {}

    /// A memo fetch began.
    fn on_fetch_start(&self, _cell: CellId) {}

    /// A memo fetch finished.
    fn on_fetch_end(&self, _cell: CellId, _result: FetchResult) {}

    /// A memo's thunk ran to completion, whether triggered by a fetch or by
    /// the verifier revalidating a dependency.
    fn on_recompute(&self, _cell: CellId, _changed: bool) {}

    /// A new dependency edge was recorded on the in-progress frame.
    fn on_dependency_recorded(&self, _dependent: CellId, _dependency: CellId) {}
}

/// Tracer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}
