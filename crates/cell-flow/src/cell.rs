//! Per-cell metadata held in the runtime's cell arena.
//!
//! Cells reference each other only by [`CellId`] into the store, never by
//! pointer, so the observation graph may contain arbitrary edges without
//! creating ownership cycles. Value slots are type-erased (`Rc<dyn Any>`)
//! with a per-cell equality function; the typed handles re-impose the static
//! type on read.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::revision::{Durability, Revision};

/// Identifier of a cell within one runtime.
///
/// Ids are dense: assigned 0, 1, 2, … in creation order and never reused
/// while the runtime lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellId(u32);

impl CellId {
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Numeric value of this id.
    #[inline]
    pub const fn id(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-erased value slot.
pub(crate) type Slot = Rc<dyn Any>;

/// Type-erased equality over two slots of the same underlying type.
pub(crate) type EqFn = fn(&dyn Any, &dyn Any) -> bool;

/// Equality entry instantiated per concrete value type when a cell is
/// created. Every comparison the engine performs (same-value writes,
/// backdating, revert detection) goes through this, never through identity
/// or bitwise comparison.
pub(crate) fn typed_eq<T: PartialEq + 'static>(old: &dyn Any, new: &dyn Any) -> bool {
    match (old.downcast_ref::<T>(), new.downcast_ref::<T>()) {
        (Some(old), Some(new)) => old == new,
        _ => false,
    }
}

/// An input cell.
pub(crate) struct SignalCell {
    /// Committed value, visible to all reads.
    pub value: Slot,
    /// Value staged by a `set` inside an open batch. Absent outside batches.
    pub staged: Option<Slot>,
    /// Revision at which `value` most recently changed.
    pub changed_at: Revision,
    /// Declared durability.
    pub durability: Durability,
    pub eq: EqFn,
}

/// Lifecycle of a memo cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemoState {
    /// Never computed.
    Fresh,
    /// A frame for this cell is on the query stack right now.
    Computing,
    /// Holds cached data from a completed computation.
    Ready,
}

/// A derived cell.
pub(crate) struct MemoCell {
    /// User-supplied pure thunk, already erased to the slot type.
    pub compute: Rc<dyn Fn() -> Slot>,
    /// Result of the most recent evaluation.
    pub cached: Option<Slot>,
    /// Cells read during the computation that produced `cached`, in
    /// first-read order.
    pub dependencies: Vec<CellId>,
    /// Revision at which the memo was last confirmed consistent.
    pub verified_at: Revision,
    /// Revision at which `cached` most recently became a new value.
    pub changed_at: Revision,
    /// Minimum durability among `dependencies`; `High` when empty.
    pub durability: Durability,
    pub state: MemoState,
    pub eq: EqFn,
}

/// Tagged per-cell metadata.
pub(crate) enum CellMeta {
    Signal(SignalCell),
    Memo(MemoCell),
}

impl CellMeta {
    /// Durability this cell contributes when read as a dependency.
    pub fn durability(&self) -> Durability {
        match self {
            CellMeta::Signal(signal) => signal.durability,
            CellMeta::Memo(memo) => memo.durability,
        }
    }
}
