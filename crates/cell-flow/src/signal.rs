//! Input cells set from outside the graph.

use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::cell::{typed_eq, CellId};
use crate::error::CycleError;
use crate::revision::Durability;
use crate::runtime::{Runtime, RuntimeShared};

/// Handle to an input cell holding a value of type `T`.
///
/// The runtime owns the cell; the handle is a `(runtime, id)` pair that can
/// be cloned freely, including into compute thunks, where reading the
/// signal records it as a dependency of the enclosing memo. The handle holds
/// the runtime weakly so thunks that capture handles do not keep the runtime
/// alive; using a handle after its runtime is dropped is a programming error
/// and aborts.
///
/// # Example
///
/// ```
/// use cell_flow::{Runtime, Signal};
///
/// let runtime = Runtime::new();
/// let name = Signal::new(&runtime, "world".to_string());
/// assert_eq!(name.get(), "world");
/// name.set("cell-flow".to_string());
/// assert_eq!(name.get(), "cell-flow");
/// ```
pub struct Signal<T> {
    shared: Weak<RuntimeShared>,
    id: CellId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            id: self.id,
            _marker: PhantomData,
        }
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    /// Allocate an input cell with durability [`Durability::Low`].
    pub fn new(runtime: &Runtime, initial: T) -> Self {
        Self::new_with_durability(runtime, initial, Durability::Low)
    }

    /// Allocate an input cell with an explicit durability declaration.
    pub fn new_with_durability(runtime: &Runtime, initial: T, durability: Durability) -> Self {
        let id = runtime.create_signal(Rc::new(initial), typed_eq::<T>, durability);
        Self {
            shared: runtime.downgrade(),
            id,
            _marker: PhantomData,
        }
    }

    /// The committed value. Inside a compute thunk this records the signal
    /// as a dependency; inside a batch it still sees the committed value,
    /// never a staged one.
    pub fn get(&self) -> T {
        let slot = self.runtime().signal_read(self.id);
        slot.downcast_ref::<T>()
            .expect("signal value matches its handle type")
            .clone()
    }

    /// Infallible twin of [`Memo::get_result`](crate::Memo::get_result),
    /// for interface symmetry.
    pub fn get_result(&self) -> Result<T, CycleError> {
        Ok(self.get())
    }

    /// Write `value`, gated on equality with the currently visible value.
    /// An equal value is a no-op; a changed one commits immediately (and
    /// bumps the clock) or, inside a batch, is staged until commit.
    pub fn set(&self, value: T) {
        self.runtime().signal_write(self.id, Rc::new(value), false);
    }

    /// Write `value` unconditionally: the clock advances (or the commit is
    /// forced at batch close) even when the value compares equal, so
    /// dependents reverify.
    pub fn set_unconditional(&self, value: T) {
        self.runtime().signal_write(self.id, Rc::new(value), true);
    }
}

impl<T> Signal<T> {
    /// Id of the underlying cell.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Declared durability.
    pub fn durability(&self) -> Durability {
        self.runtime().signal_durability(self.id)
    }

    fn runtime(&self) -> Runtime {
        Runtime::from_shared(self.shared.upgrade().expect("signal outlived its runtime"))
    }
}
