//! The runtime: revision clock, cell arena, query stack, and batch control.

use std::cell::{RefCell, RefMut};
use std::rc::{Rc, Weak};

use crate::batch::BatchState;
use crate::cell::{CellId, CellMeta, EqFn, MemoCell, MemoState, SignalCell, Slot};
use crate::revision::{Durability, Revision};
use crate::stack::QueryStack;
use crate::store::CellStore;
use crate::tracer::{CellKind, NoopTracer, Tracer, WriteOutcome};

/// State shared by every handle of one runtime.
pub(crate) struct RuntimeShared {
    state: RefCell<RuntimeState>,
    tracer: RefCell<Rc<dyn Tracer>>,
}

pub(crate) struct RuntimeState {
    pub(crate) revision: Revision,
    pub(crate) cells: CellStore,
    pub(crate) stack: QueryStack,
    pub(crate) batch: BatchState,
    /// Highest revision at which a signal of each durability level
    /// committed. Indexed by [`Durability::index`].
    pub(crate) last_change: [Revision; Durability::LEVELS],
}

/// The dependency-tracking runtime.
///
/// Owns the cell store, the revision clock, the query stack, and the batch
/// state. [`Signal`](crate::Signal) and [`Memo`](crate::Memo) handles are
/// lightweight references into it; all mutation is mediated here.
///
/// A runtime is cheap to clone; clones share state. It is deliberately
/// `!Send`: the engine is single-threaded, and handing a runtime or any of
/// its handles to another thread is rejected at compile time.
pub struct Runtime {
    shared: Rc<RuntimeShared>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Runtime {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl Runtime {
    /// Create a runtime with an empty cell store and the clock at
    /// [`Revision::INITIAL`].
    pub fn new() -> Self {
        Self::with_tracer(NoopTracer)
    }

    /// Create a runtime that reports execution to `tracer`.
    pub fn with_tracer(tracer: impl Tracer + 'static) -> Self {
        Self {
            shared: Rc::new(RuntimeShared {
                state: RefCell::new(RuntimeState {
                    revision: Revision::INITIAL,
                    cells: CellStore::new(),
                    stack: QueryStack::new(),
                    batch: BatchState::new(),
                    last_change: [Revision::NEVER; Durability::LEVELS],
                }),
                tracer: RefCell::new(Rc::new(tracer)),
            }),
        }
    }

    /// Replace the installed tracer.
    pub fn set_tracer(&self, tracer: impl Tracer + 'static) {
        *self.shared.tracer.borrow_mut() = Rc::new(tracer);
    }

    /// Current committed revision.
    pub fn revision(&self) -> Revision {
        self.shared.state.borrow().revision
    }

    /// Run `f` with signal writes staged, committing the net changes as a
    /// single revision when the outermost batch closes.
    ///
    /// Reads inside the batch see committed values only, so memo
    /// computations executed within it are oblivious to the staged writes.
    /// A staged value equal to its pre-batch original is discarded at commit
    /// (revert detection); if nothing survives, the clock does not move. If
    /// `f` unwinds, every staged value is discarded without a commit.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.state_mut().batch.enter();
        let guard = BatchGuard { runtime: self };
        let result = f();
        std::mem::forget(guard);
        self.exit_batch(false);
        result
    }

    pub(crate) fn state_mut(&self) -> RefMut<'_, RuntimeState> {
        self.shared.state.borrow_mut()
    }

    pub(crate) fn tracer(&self) -> Rc<dyn Tracer> {
        Rc::clone(&self.shared.tracer.borrow())
    }

    pub(crate) fn downgrade(&self) -> Weak<RuntimeShared> {
        Rc::downgrade(&self.shared)
    }

    pub(crate) fn from_shared(shared: Rc<RuntimeShared>) -> Self {
        Self { shared }
    }

    /// Whether a memo computation is currently in progress.
    pub(crate) fn in_computation(&self) -> bool {
        !self.shared.state.borrow().stack.is_empty()
    }

    // --- cell creation ----------------------------------------------------

    pub(crate) fn create_signal(&self, value: Slot, eq: EqFn, durability: Durability) -> CellId {
        let id = {
            let mut st = self.state_mut();
            let changed_at = st.revision;
            st.cells.alloc(CellMeta::Signal(SignalCell {
                value,
                staged: None,
                changed_at,
                durability,
                eq,
            }))
        };
        self.tracer().on_cell_created(id, CellKind::Signal);
        id
    }

    pub(crate) fn create_memo(&self, compute: Rc<dyn Fn() -> Slot>, eq: EqFn) -> CellId {
        let id = self.state_mut().cells.alloc(CellMeta::Memo(MemoCell {
            compute,
            cached: None,
            dependencies: Vec::new(),
            verified_at: Revision::NEVER,
            changed_at: Revision::NEVER,
            durability: Durability::High,
            state: MemoState::Fresh,
            eq,
        }));
        self.tracer().on_cell_created(id, CellKind::Memo);
        id
    }

    // --- signal operations ------------------------------------------------

    /// Committed value of a signal, recording a dependency edge when called
    /// from inside a computation. Staged batch values are invisible here.
    pub(crate) fn signal_read(&self, id: CellId) -> Slot {
        let (value, edge) = {
            let mut st = self.state_mut();
            let edge = st.stack.record(id);
            (st.cells.signal(id).value.clone(), edge)
        };
        if let Some(dependent) = edge {
            self.tracer().on_dependency_recorded(dependent, id);
        }
        value
    }

    /// Write a signal. Outside a batch a changed value commits immediately
    /// and bumps the clock; inside a batch it is staged. `forced` skips the
    /// equality gate (`set_unconditional`).
    pub(crate) fn signal_write(&self, id: CellId, value: Slot, forced: bool) {
        let outcome = {
            let mut st = self.state_mut();
            let st = &mut *st;
            let cell = st.cells.signal_mut(id);
            if st.batch.is_open() {
                // The equality gate compares against the value visible to
                // the setter: the staged value when one exists.
                let visible = cell.staged.as_ref().unwrap_or(&cell.value);
                if !forced && (cell.eq)(visible.as_ref(), value.as_ref()) {
                    WriteOutcome::Unchanged
                } else {
                    st.batch.stage(id, cell.value.clone(), forced);
                    cell.staged = Some(value);
                    WriteOutcome::Staged
                }
            } else if !forced && (cell.eq)(cell.value.as_ref(), value.as_ref()) {
                WriteOutcome::Unchanged
            } else {
                cell.value = value;
                st.revision = st.revision.next();
                let revision = st.revision;
                cell.changed_at = revision;
                st.last_change[cell.durability.index()] = revision;
                WriteOutcome::Committed(revision)
            }
        };
        self.tracer().on_signal_write(id, outcome);
    }

    pub(crate) fn signal_durability(&self, id: CellId) -> Durability {
        self.shared.state.borrow().cells.signal(id).durability
    }

    pub(crate) fn memo_durability(&self, id: CellId) -> Durability {
        self.shared.state.borrow().cells.memo(id).durability
    }

    pub(crate) fn memo_dependencies(&self, id: CellId) -> Vec<CellId> {
        self.shared.state.borrow().cells.memo(id).dependencies.clone()
    }

    // --- batch commit -----------------------------------------------------

    fn exit_batch(&self, aborting: bool) {
        enum Outcome {
            Inner,
            Aborted,
            Closed {
                revision: Option<Revision>,
                committed: Vec<CellId>,
            },
        }

        let outcome = {
            let mut st = self.state_mut();
            let st = &mut *st;
            if !st.batch.exit() {
                Outcome::Inner
            } else {
                let staged = st.batch.take();
                if aborting {
                    for write in &staged {
                        st.cells.signal_mut(write.cell).staged = None;
                    }
                    Outcome::Aborted
                } else {
                    let mut committed = Vec::new();
                    for write in &staged {
                        let cell = st.cells.signal_mut(write.cell);
                        let Some(value) = cell.staged.take() else {
                            continue;
                        };
                        // Revert detection: a net no-op write is dropped.
                        if write.forced || !(cell.eq)(value.as_ref(), write.original.as_ref()) {
                            cell.value = value;
                            committed.push(write.cell);
                        }
                    }
                    let revision = if committed.is_empty() {
                        None
                    } else {
                        st.revision = st.revision.next();
                        let revision = st.revision;
                        for &id in &committed {
                            let cell = st.cells.signal_mut(id);
                            cell.changed_at = revision;
                            st.last_change[cell.durability.index()] = revision;
                        }
                        Some(revision)
                    };
                    Outcome::Closed {
                        revision,
                        committed,
                    }
                }
            }
        };
        if let Outcome::Closed {
            revision,
            committed,
        } = outcome
        {
            self.tracer().on_batch_commit(revision, &committed);
        }
    }
}

/// Discards staged writes when the batch closure unwinds.
struct BatchGuard<'a> {
    runtime: &'a Runtime,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.runtime.exit_batch(true);
    }
}
