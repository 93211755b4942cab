//! Array-indexed storage of per-cell metadata.

use crate::cell::{CellId, CellMeta, MemoCell, SignalCell};

/// Append-only arena of cells keyed by dense [`CellId`]s.
///
/// Cells are never removed; an id stays valid for the lifetime of the
/// runtime that allocated it.
pub(crate) struct CellStore {
    cells: Vec<CellMeta>,
}

impl CellStore {
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Append a cell and return its freshly assigned id.
    pub fn alloc(&mut self, meta: CellMeta) -> CellId {
        let raw = u32::try_from(self.cells.len()).expect("cell id space exhausted");
        self.cells.push(meta);
        CellId::new(raw)
    }

    pub fn get(&self, id: CellId) -> &CellMeta {
        &self.cells[id.index()]
    }

    pub fn signal(&self, id: CellId) -> &SignalCell {
        match self.get(id) {
            CellMeta::Signal(signal) => signal,
            CellMeta::Memo(_) => panic!("cell {id} is not a signal"),
        }
    }

    pub fn signal_mut(&mut self, id: CellId) -> &mut SignalCell {
        match &mut self.cells[id.index()] {
            CellMeta::Signal(signal) => signal,
            CellMeta::Memo(_) => panic!("cell {id} is not a signal"),
        }
    }

    pub fn memo(&self, id: CellId) -> &MemoCell {
        match self.get(id) {
            CellMeta::Memo(memo) => memo,
            CellMeta::Signal(_) => panic!("cell {id} is not a memo"),
        }
    }

    pub fn memo_mut(&mut self, id: CellId) -> &mut MemoCell {
        match &mut self.cells[id.index()] {
            CellMeta::Memo(memo) => memo,
            CellMeta::Signal(_) => panic!("cell {id} is not a memo"),
        }
    }
}
