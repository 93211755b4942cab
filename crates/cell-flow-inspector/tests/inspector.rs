//! End-to-end event traces through the tracer adapter.

use std::sync::Arc;

use cell_flow::{CellKind, Durability, FetchResult, Memo, Runtime, Signal, WriteOutcome};
use cell_flow_inspector::{EventCollector, FlowEvent, SinkTracer};

fn collected_runtime() -> (Runtime, Arc<EventCollector>) {
    let collector = Arc::new(EventCollector::new());
    let runtime = Runtime::with_tracer(SinkTracer::new(collector.clone()));
    (runtime, collector)
}

#[test]
fn test_creation_and_write_events() {
    let (runtime, collector) = collected_runtime();
    let x = Signal::new(&runtime, 1);
    let m = Memo::new(&runtime, || 0);
    assert_eq!(
        collector.drain().events,
        vec![
            FlowEvent::CellCreated {
                cell: x.id(),
                kind: CellKind::Signal,
            },
            FlowEvent::CellCreated {
                cell: m.id(),
                kind: CellKind::Memo,
            },
        ]
    );

    x.set(1);
    x.set(4);
    let committed_at = runtime.revision();
    assert_eq!(
        collector.drain().events,
        vec![
            FlowEvent::SignalWritten {
                cell: x.id(),
                outcome: WriteOutcome::Unchanged,
            },
            FlowEvent::SignalWritten {
                cell: x.id(),
                outcome: WriteOutcome::Committed(committed_at),
            },
        ]
    );
}

#[test]
fn test_first_fetch_then_cache_hit() {
    let (runtime, collector) = collected_runtime();
    let x = Signal::new(&runtime, 2);
    let y = Signal::new(&runtime, 3);
    let sum = {
        let (x, y) = (x.clone(), y.clone());
        Memo::new(&runtime, move || x.get() + y.get())
    };
    collector.drain();

    assert_eq!(sum.get(), 5);
    assert_eq!(
        collector.drain().events,
        vec![
            FlowEvent::FetchStart { cell: sum.id() },
            FlowEvent::DependencyRecorded {
                dependent: sum.id(),
                dependency: x.id(),
            },
            FlowEvent::DependencyRecorded {
                dependent: sum.id(),
                dependency: y.id(),
            },
            FlowEvent::Recomputed {
                cell: sum.id(),
                changed: true,
            },
            FlowEvent::FetchEnd {
                cell: sum.id(),
                result: FetchResult::Changed,
            },
        ]
    );

    assert_eq!(sum.get(), 5);
    assert_eq!(
        collector.drain().events,
        vec![
            FlowEvent::FetchStart { cell: sum.id() },
            FlowEvent::FetchEnd {
                cell: sum.id(),
                result: FetchResult::CacheHit,
            },
        ]
    );
}

#[test]
fn test_backdate_keeps_downstream_validated() {
    let (runtime, collector) = collected_runtime();
    let x = Signal::new(&runtime, 2);
    let sq = {
        let x = x.clone();
        Memo::new(&runtime, move || {
            let v = x.get();
            v * v
        })
    };
    let top = {
        let sq = sq.clone();
        Memo::new(&runtime, move || sq.get() + 1)
    };
    assert_eq!(top.get(), 5);
    collector.drain();

    x.set(-2);
    assert_eq!(top.get(), 5);

    let trace = collector.trace();
    // sq reran to an equal value; top only revalidated.
    assert_eq!(trace.recompute_count(sq.id()), 1);
    assert_eq!(trace.recompute_count(top.id()), 0);
    assert!(trace.has_event(|event| matches!(
        event,
        FlowEvent::Recomputed { cell, changed: false } if *cell == sq.id()
    )));
    assert!(trace.has_event(|event| matches!(
        event,
        FlowEvent::FetchEnd { cell, result: FetchResult::Validated } if *cell == top.id()
    )));
}

#[test]
fn test_durability_skip_event() {
    let (runtime, collector) = collected_runtime();
    let cfg = Signal::new_with_durability(&runtime, 10, Durability::High);
    let stable = {
        let cfg = cfg.clone();
        Memo::new(&runtime, move || cfg.get() * 2)
    };
    let noise = Signal::new(&runtime, 0);
    assert_eq!(stable.get(), 20);

    noise.set(1);
    collector.drain();
    assert_eq!(stable.get(), 20);
    assert_eq!(
        collector.drain().events,
        vec![
            FlowEvent::FetchStart { cell: stable.id() },
            FlowEvent::FetchEnd {
                cell: stable.id(),
                result: FetchResult::DurabilitySkip,
            },
        ]
    );
}

#[test]
fn test_batch_commit_events() {
    let (runtime, collector) = collected_runtime();
    let x = Signal::new(&runtime, 1);
    let y = Signal::new(&runtime, 2);

    // Net no-op: x staged away and back, y's write gated on equality.
    collector.drain();
    runtime.batch(|| {
        x.set(9);
        y.set(2);
        x.set(1);
    });
    assert_eq!(
        collector.drain().events,
        vec![
            FlowEvent::SignalWritten {
                cell: x.id(),
                outcome: WriteOutcome::Staged,
            },
            FlowEvent::SignalWritten {
                cell: y.id(),
                outcome: WriteOutcome::Unchanged,
            },
            FlowEvent::SignalWritten {
                cell: x.id(),
                outcome: WriteOutcome::Staged,
            },
            FlowEvent::BatchCommitted {
                revision: None,
                committed: vec![],
            },
        ]
    );

    // A surviving change commits with the new revision.
    runtime.batch(|| {
        x.set(5);
        y.set(6);
    });
    let committed_at = runtime.revision();
    let trace = collector.trace();
    assert!(trace.has_event(|event| matches!(
        event,
        FlowEvent::BatchCommitted { revision: Some(revision), committed }
            if *revision == committed_at && committed == &vec![x.id(), y.id()]
    )));
}

#[test]
fn test_cycle_fetch_ends_with_cycle_event() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let (runtime, collector) = collected_runtime();
    let slot: Rc<RefCell<Option<Memo<i32>>>> = Rc::new(RefCell::new(None));
    let m = {
        let slot = slot.clone();
        Memo::new(&runtime, move || {
            let me = slot.borrow().clone().expect("installed");
            me.get_result().unwrap_or(-1)
        })
    };
    *slot.borrow_mut() = Some(m.clone());
    collector.drain();

    assert_eq!(m.get_result(), Ok(-1));
    assert_eq!(
        collector.drain().events,
        vec![
            // Outer fetch starts, runs the thunk, which re-enters.
            FlowEvent::FetchStart { cell: m.id() },
            FlowEvent::FetchStart { cell: m.id() },
            FlowEvent::FetchEnd {
                cell: m.id(),
                result: FetchResult::CycleDetected,
            },
            FlowEvent::Recomputed {
                cell: m.id(),
                changed: true,
            },
            FlowEvent::FetchEnd {
                cell: m.id(),
                result: FetchResult::Changed,
            },
        ]
    );
}
