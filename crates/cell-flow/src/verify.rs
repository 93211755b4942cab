//! Pull-based validation and recomputation of memo cells.
//!
//! A fetch asks: is this memo's cached value still the value its thunk would
//! produce at the current revision? The answer is derived without running
//! the thunk whenever possible:
//!
//! 1. re-entry on the query stack is a cycle and fails immediately;
//! 2. a memo already verified at the current revision is a cache hit;
//! 3. a memo none of whose durability class of inputs changed since its
//!    last verification is promoted wholesale;
//! 4. otherwise the recorded dependencies are walked in first-read order,
//!    and only a dependency whose `changed_at` moved past the memo's
//!    `verified_at` forces the thunk to run again.
//!
//! The walk is iterative: an explicit stack of `(memo, cursor)` frames
//! replaces recursion, so arbitrarily deep memo chains revalidate in
//! constant native stack space. Recursion remains only where it is
//! unavoidable: inside user thunks, whose nested reads re-enter the
//! verifier through the public API.
//!
//! Recomputation compares the fresh value against the cached one and
//! backdates on equality: `changed_at` stays put, so downstream memos that
//! compare against it keep validating without running their own thunks.

use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::cell::{CellId, CellMeta, MemoState, Slot};
use crate::error::CycleError;
use crate::revision::{Durability, Revision};
use crate::runtime::{Runtime, RuntimeState};
use crate::tracer::FetchResult;

/// Fast-path classification of a fetch before any dependency walk.
enum Shortcut {
    /// The cached value is already valid at the current revision.
    Hit(FetchResult),
    /// Never computed; run the thunk.
    Recompute,
    /// Walk the recorded dependencies.
    Walk,
}

/// One entry of the verifier's explicit work stack: a memo under validation
/// and a cursor into its dependency list.
#[derive(Clone, Copy)]
struct WalkFrame {
    memo: CellId,
    cursor: usize,
}

/// Next move for the innermost walk frame.
enum Step {
    /// Current dependency is unchanged; move the cursor.
    Advance,
    /// The dependency needs its own validation first.
    Descend(CellId),
    /// A dependency changed; the frame's memo must recompute.
    Recompute,
    /// Every dependency is clean; `verified_at` was promoted, pop.
    Promote,
}

impl Runtime {
    /// Validated cached value of a memo at the current revision, per the
    /// protocol above. On success the read is recorded as a dependency of
    /// the enclosing computation; on a cycle no edge is recorded, so the
    /// caller is not permanently entangled with the failed read.
    pub(crate) fn memo_fetch(&self, id: CellId) -> Result<Slot, CycleError> {
        self.tracer().on_fetch_start(id);

        let shortcut = {
            let mut st = self.state_mut();
            let st = &mut *st;
            if st.stack.contains(id) {
                None
            } else {
                Some(quick_check(st, id))
            }
        };
        let Some(shortcut) = shortcut else {
            self.tracer().on_fetch_end(id, FetchResult::CycleDetected);
            return Err(CycleError::new(id));
        };

        let outcome = match shortcut {
            Shortcut::Hit(result) => Ok(result),
            Shortcut::Recompute => self.recompute(id).map(recompute_result),
            Shortcut::Walk => self.validate(id).map(|root_recompute| match root_recompute {
                Some(changed) => recompute_result(changed),
                None => FetchResult::Validated,
            }),
        };
        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                self.tracer().on_fetch_end(id, FetchResult::CycleDetected);
                return Err(err);
            }
        };
        self.tracer().on_fetch_end(id, result);

        let (value, edge) = {
            let mut st = self.state_mut();
            let edge = st.stack.record(id);
            let value = st
                .cells
                .memo(id)
                .cached
                .clone()
                .expect("validated memo holds a cached value");
            (value, edge)
        };
        if let Some(dependent) = edge {
            self.tracer().on_dependency_recorded(dependent, id);
        }
        Ok(value)
    }

    /// Iterative dependency walk for a `Ready` memo that is not current.
    ///
    /// Returns `Some(changed)` when the walk ended up recomputing `root`,
    /// `None` when every dependency proved clean and `root` was promoted.
    fn validate(&self, root: CellId) -> Result<Option<bool>, CycleError> {
        let mut walk = vec![WalkFrame {
            memo: root,
            cursor: 0,
        }];
        let mut root_recompute = None;
        while let Some(&frame) = walk.last() {
            let step = {
                let mut st = self.state_mut();
                classify(&mut st, frame)
            };
            match step {
                Step::Advance => {
                    walk.last_mut().expect("walk frame present").cursor += 1;
                }
                Step::Descend(dep) => {
                    walk.push(WalkFrame {
                        memo: dep,
                        cursor: 0,
                    });
                }
                Step::Recompute => {
                    let changed = self.recompute(frame.memo)?;
                    if frame.memo == root {
                        root_recompute = Some(changed);
                    }
                    // The parent frame re-examines this dependency at the
                    // same cursor, now that it is verified at the current
                    // revision.
                    walk.pop();
                }
                Step::Promote => {
                    walk.pop();
                }
            }
        }
        Ok(root_recompute)
    }

    /// Run a memo's thunk, install the result per the backdating rule, and
    /// return whether the cached value actually changed.
    pub(crate) fn recompute(&self, id: CellId) -> Result<bool, CycleError> {
        let compute = {
            let mut st = self.state_mut();
            let st = &mut *st;
            let memo = st.cells.memo_mut(id);
            memo.state = MemoState::Computing;
            st.stack.push(id);
            Rc::clone(&memo.compute)
        };

        match panic::catch_unwind(AssertUnwindSafe(|| compute())) {
            Ok(value) => {
                let changed = {
                    let mut st = self.state_mut();
                    let st = &mut *st;
                    let revision = st.revision;
                    let dependencies = st.stack.pop(id);
                    let durability = dependencies
                        .iter()
                        .map(|&dep| st.cells.get(dep).durability())
                        .min()
                        .unwrap_or(Durability::High);
                    let memo = st.cells.memo_mut(id);
                    let changed = match &memo.cached {
                        Some(cached) => !(memo.eq)(cached.as_ref(), value.as_ref()),
                        None => true,
                    };
                    if changed {
                        memo.cached = Some(value);
                        memo.changed_at = revision;
                    }
                    memo.verified_at = revision;
                    memo.dependencies = dependencies;
                    memo.durability = durability;
                    memo.state = MemoState::Ready;
                    changed
                };
                self.tracer().on_recompute(id, changed);
                Ok(changed)
            }
            Err(payload) => {
                // Unwind path: pop the frame, discard the partial dependency
                // collection, leave cached data and revisions untouched.
                {
                    let mut st = self.state_mut();
                    let st = &mut *st;
                    let _ = st.stack.pop(id);
                    let memo = st.cells.memo_mut(id);
                    memo.state = if memo.cached.is_some() {
                        MemoState::Ready
                    } else {
                        MemoState::Fresh
                    };
                }
                // A cycle raised inside the thunk crosses user frames as a
                // typed panic payload; everything else keeps unwinding.
                match payload.downcast::<CycleError>() {
                    Ok(cycle) => Err(*cycle),
                    Err(payload) => panic::resume_unwind(payload),
                }
            }
        }
    }
}

fn recompute_result(changed: bool) -> FetchResult {
    if changed {
        FetchResult::Changed
    } else {
        FetchResult::Unchanged
    }
}

/// Steps 2–4 of the fetch protocol under a single borrow.
fn quick_check(st: &mut RuntimeState, id: CellId) -> Shortcut {
    let revision = st.revision;
    let last_change = st.last_change;
    let memo = st.cells.memo_mut(id);
    match memo.state {
        MemoState::Computing => unreachable!("computing memo absent from the query stack"),
        MemoState::Fresh => Shortcut::Recompute,
        MemoState::Ready if memo.verified_at == revision => Shortcut::Hit(FetchResult::CacheHit),
        MemoState::Ready => {
            if changed_since(&last_change, memo.durability) <= memo.verified_at {
                memo.verified_at = revision;
                Shortcut::Hit(FetchResult::DurabilitySkip)
            } else {
                Shortcut::Walk
            }
        }
    }
}

/// Latest commit revision among inputs at or above `durability`.
fn changed_since(last_change: &[Revision; Durability::LEVELS], durability: Durability) -> Revision {
    last_change[durability.index()..]
        .iter()
        .copied()
        .max()
        .unwrap_or(Revision::NEVER)
}

/// Examine the walk frame's current dependency and decide the next step.
fn classify(st: &mut RuntimeState, frame: WalkFrame) -> Step {
    enum Dep {
        /// The dependency's `changed_at` is authoritative at the current
        /// revision; true when it moved past the frame's `verified_at`.
        Settled(bool),
        /// Authoritative after a durability promotion of the dependency.
        Promotable(bool),
        Descend,
    }

    let revision = st.revision;
    let last_change = st.last_change;

    let (verified_at, dep) = {
        let memo = st.cells.memo(frame.memo);
        debug_assert_eq!(memo.state, MemoState::Ready);
        // A nested fetch from a thunk run mid-walk may have settled this
        // frame's memo already; its remaining cursor positions are moot.
        if memo.verified_at == revision {
            return Step::Promote;
        }
        if frame.cursor >= memo.dependencies.len() {
            st.cells.memo_mut(frame.memo).verified_at = revision;
            return Step::Promote;
        }
        (memo.verified_at, memo.dependencies[frame.cursor])
    };

    let examined = match st.cells.get(dep) {
        CellMeta::Signal(signal) => Dep::Settled(signal.changed_at > verified_at),
        CellMeta::Memo(memo) => match memo.state {
            // A dependency that lost its cache or is mid-computation cannot
            // vouch for anything; recompute the dependent and let the
            // thunk's own reads settle it.
            MemoState::Fresh | MemoState::Computing => Dep::Settled(true),
            MemoState::Ready if memo.verified_at == revision => {
                Dep::Settled(memo.changed_at > verified_at)
            }
            MemoState::Ready => {
                if changed_since(&last_change, memo.durability) <= memo.verified_at {
                    Dep::Promotable(memo.changed_at > verified_at)
                } else {
                    Dep::Descend
                }
            }
        },
    };

    let settled = |newer: bool| if newer { Step::Recompute } else { Step::Advance };
    match examined {
        Dep::Settled(newer) => settled(newer),
        Dep::Promotable(newer) => {
            st.cells.memo_mut(dep).verified_at = revision;
            settled(newer)
        }
        Dep::Descend => Step::Descend(dep),
    }
}
