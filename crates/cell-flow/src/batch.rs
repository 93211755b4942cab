//! Staged signal writes for an open batch.

use indexmap::IndexMap;

use crate::cell::{CellId, Slot};

/// One staged write drained at commit time.
pub(crate) struct StagedWrite {
    pub cell: CellId,
    /// Committed value captured when the signal was first staged in this
    /// batch; the revert comparison runs against it.
    pub original: Slot,
    /// Whether any write to this signal in the batch was unconditional.
    pub forced: bool,
}

struct StagedEntry {
    original: Slot,
    forced: bool,
}

/// Bookkeeping for nested [`Runtime::batch`](crate::Runtime::batch) calls.
pub(crate) struct BatchState {
    depth: u32,
    staged: IndexMap<CellId, StagedEntry, ahash::RandomState>,
}

impl BatchState {
    pub fn new() -> Self {
        Self {
            depth: 0,
            staged: IndexMap::with_hasher(ahash::RandomState::new()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.depth > 0
    }

    pub fn enter(&mut self) {
        self.depth += 1;
    }

    /// Leave one nesting level; true when the outermost level was closed.
    pub fn exit(&mut self) -> bool {
        self.depth -= 1;
        self.depth == 0
    }

    /// Record `cell` as staged. The original value is captured only on the
    /// first stage in the batch; `forced` is sticky once set.
    pub fn stage(&mut self, cell: CellId, original: Slot, forced: bool) {
        let entry = self.staged.entry(cell).or_insert(StagedEntry {
            original,
            forced: false,
        });
        entry.forced |= forced;
    }

    /// Drain staged records in first-stage order.
    pub fn take(&mut self) -> Vec<StagedWrite> {
        self.staged
            .drain(..)
            .map(|(cell, entry)| StagedWrite {
                cell,
                original: entry.original,
                forced: entry.forced,
            })
            .collect()
    }
}
