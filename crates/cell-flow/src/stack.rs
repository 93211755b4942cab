//! The in-progress computation stack and dependency recording.
//!
//! Each memo computation pushes a frame carrying a dependency collector.
//! Reads performed by the thunk land on the innermost frame, in first-read
//! order with repeats deduplicated. Scanning the stack for a cell that is
//! about to be computed is the cycle check.

use indexmap::IndexSet;

use crate::cell::CellId;

/// One in-progress memo computation.
struct Frame {
    cell: CellId,
    /// Ordered dependency collector with O(1) membership.
    deps: IndexSet<CellId, ahash::RandomState>,
}

impl Frame {
    fn new(cell: CellId) -> Self {
        Self {
            cell,
            deps: IndexSet::with_hasher(ahash::RandomState::new()),
        }
    }
}

/// Stack of computation frames, owned by the runtime.
pub(crate) struct QueryStack {
    frames: Vec<Frame>,
}

impl QueryStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Whether a frame for `cell` is already in progress (the cycle
    /// condition).
    pub fn contains(&self, cell: CellId) -> bool {
        self.frames.iter().any(|frame| frame.cell == cell)
    }

    pub fn push(&mut self, cell: CellId) {
        self.frames.push(Frame::new(cell));
    }

    /// Pop the frame for `cell`, yielding its dependencies in first-read
    /// order.
    pub fn pop(&mut self, cell: CellId) -> Vec<CellId> {
        let frame = self.frames.pop().expect("query stack underflow");
        debug_assert_eq!(frame.cell, cell, "query stack popped out of order");
        frame.deps.into_iter().collect()
    }

    /// Record a read of `cell` on the innermost frame, if any. Returns the
    /// recording frame's cell when the edge is new.
    pub fn record(&mut self, cell: CellId) -> Option<CellId> {
        let frame = self.frames.last_mut()?;
        frame.deps.insert(cell).then_some(frame.cell)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
