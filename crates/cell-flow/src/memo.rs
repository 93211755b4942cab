//! Derived cells produced by compute thunks.

use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::cell::{typed_eq, CellId, Slot};
use crate::error::CycleError;
use crate::revision::Durability;
use crate::runtime::{Runtime, RuntimeShared};

/// Handle to a derived cell whose value is produced by a pure thunk.
///
/// Nothing runs at construction: the thunk executes on first read and after
/// that only when a recorded dependency actually changed. A recomputation
/// that produces an equal value is backdated (`changed_at` stays put), so
/// cells downstream keep validating without running their own thunks.
///
/// Like [`Signal`](crate::Signal), the handle is freely cloneable and holds
/// the runtime weakly.
///
/// # Example
///
/// ```
/// use cell_flow::{Memo, Runtime, Signal};
///
/// let runtime = Runtime::new();
/// let base = Signal::new(&runtime, 10);
/// let doubled = {
///     let base = base.clone();
///     Memo::new(&runtime, move || base.get() * 2)
/// };
/// assert_eq!(doubled.get(), 20);
/// base.set(7);
/// assert_eq!(doubled.get(), 14);
/// ```
pub struct Memo<T> {
    shared: Weak<RuntimeShared>,
    id: CellId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            id: self.id,
            _marker: PhantomData,
        }
    }
}

impl<T: Clone + PartialEq + 'static> Memo<T> {
    /// Allocate a derived cell computed by `compute`.
    ///
    /// The thunk must be pure: deterministic given the cells it reads, with
    /// no untracked inputs. Violations weaken incrementality but do not
    /// crash the engine.
    pub fn new(runtime: &Runtime, compute: impl Fn() -> T + 'static) -> Self {
        let compute: Rc<dyn Fn() -> Slot> = Rc::new(move || Rc::new(compute()) as Slot);
        let id = runtime.create_memo(compute, typed_eq::<T>);
        Self {
            shared: runtime.downgrade(),
            id,
            _marker: PhantomData,
        }
    }

    /// The memo's value at the current revision, recomputing at most once.
    ///
    /// Aborts on a dependency cycle; use [`get_result`](Self::get_result)
    /// to observe the cycle instead.
    pub fn get(&self) -> T {
        let runtime = self.runtime();
        match runtime.memo_fetch(self.id) {
            Ok(slot) => downcast::<T>(&slot),
            // Inside a computation the typed payload lets enclosing memo
            // frames translate the abort back into an `Err` for their own
            // callers; at top level the message is for a human.
            Err(err) if runtime.in_computation() => std::panic::panic_any(err),
            Err(err) => panic!("{err}"),
        }
    }

    /// The memo's value, or the cycle that prevented computing it.
    ///
    /// On `Err` no dependency edge is recorded on the enclosing computation,
    /// so a failed read does not permanently entangle the caller with the
    /// cycle.
    pub fn get_result(&self) -> Result<T, CycleError> {
        let slot = self.runtime().memo_fetch(self.id)?;
        Ok(downcast::<T>(&slot))
    }
}

impl<T> Memo<T> {
    /// Id of the underlying cell.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Effective durability: the minimum durability of the dependencies
    /// recorded by the most recent computation, or [`Durability::High`]
    /// before the first one (and for dependency-free memos).
    pub fn durability(&self) -> Durability {
        self.runtime().memo_durability(self.id)
    }

    /// Cells read by the most recent computation, in first-read order.
    /// Empty before the first computation.
    pub fn dependencies(&self) -> Vec<CellId> {
        self.runtime().memo_dependencies(self.id)
    }

    fn runtime(&self) -> Runtime {
        Runtime::from_shared(self.shared.upgrade().expect("memo outlived its runtime"))
    }
}

fn downcast<T: Clone + 'static>(slot: &Slot) -> T {
    slot.downcast_ref::<T>()
        .expect("memo value matches its handle type")
        .clone()
}
