//! Randomized stress: a layered DAG driven by random updates and batches,
//! checked against a recompute-from-scratch oracle.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cell_flow::{Memo, Runtime, Signal};

const INPUTS: usize = 8;
const MIDS: usize = 6;
const TOPS: usize = 5;

#[test]
fn test_random_dag_matches_oracle() {
    let mut rng = StdRng::seed_from_u64(0x5EED_CE11);
    let runtime = Runtime::new();

    let mut values: Vec<i64> = (0..INPUTS).map(|_| rng.gen_range(-100..100)).collect();
    let inputs: Vec<Signal<i64>> = values
        .iter()
        .map(|&v| Signal::new(&runtime, v))
        .collect();

    // Middle layer: each memo sums a random subset of inputs.
    let mut mid_subsets = Vec::new();
    let mut mids: Vec<Memo<i64>> = Vec::new();
    for _ in 0..MIDS {
        let subset: Vec<usize> = (0..INPUTS).filter(|_| rng.gen_bool(0.5)).collect();
        let memo = {
            let picked: Vec<Signal<i64>> = subset.iter().map(|&i| inputs[i].clone()).collect();
            Memo::new(&runtime, move || picked.iter().map(Signal::get).sum())
        };
        mid_subsets.push(subset);
        mids.push(memo);
    }

    // Top layer: each memo sums a random subset of the middle layer.
    let mut top_subsets = Vec::new();
    let mut tops: Vec<Memo<i64>> = Vec::new();
    for _ in 0..TOPS {
        let subset: Vec<usize> = (0..MIDS).filter(|_| rng.gen_bool(0.5)).collect();
        let memo = {
            let picked: Vec<Memo<i64>> = subset.iter().map(|&i| mids[i].clone()).collect();
            Memo::new(&runtime, move || picked.iter().map(Memo::get).sum())
        };
        top_subsets.push(subset);
        tops.push(memo);
    }

    let mid_value =
        |values: &[i64], subset: &[usize]| subset.iter().map(|&i| values[i]).sum::<i64>();

    for _ in 0..200 {
        match rng.gen_range(0..3) {
            0 => {
                let i = rng.gen_range(0..INPUTS);
                let v = rng.gen_range(-100..100);
                inputs[i].set(v);
                values[i] = v;
            }
            1 => {
                let writes: Vec<(usize, i64)> = (0..3)
                    .map(|_| (rng.gen_range(0..INPUTS), rng.gen_range(-100..100)))
                    .collect();
                runtime.batch(|| {
                    for &(i, v) in &writes {
                        inputs[i].set(v);
                    }
                });
                for (i, v) in writes {
                    values[i] = v;
                }
            }
            _ => {}
        }

        let t = rng.gen_range(0..TOPS);
        let expected: i64 = top_subsets[t]
            .iter()
            .map(|&m| mid_value(&values, &mid_subsets[m]))
            .sum();
        assert_eq!(tops[t].get(), expected);
    }

    // Full sweep at the end.
    for (t, top) in tops.iter().enumerate() {
        let expected: i64 = top_subsets[t]
            .iter()
            .map(|&m| mid_value(&values, &mid_subsets[m]))
            .sum();
        assert_eq!(top.get(), expected);
    }
}

#[test]
fn test_deep_chain_revalidates_and_propagates() {
    const DEPTH: i64 = 2000;
    let runtime = Runtime::new();
    let base = Signal::new(&runtime, 1i64);
    let mut head = {
        let base = base.clone();
        Memo::new(&runtime, move || base.get())
    };
    head.get();
    for _ in 0..DEPTH {
        let prev = head.clone();
        head = Memo::new(&runtime, move || prev.get() + 1);
        // Keep every link computed so nothing below recurses deeply.
        head.get();
    }
    assert_eq!(head.get(), 1 + DEPTH);

    // Unrelated churn: the full-depth walk validates iteratively, without
    // recursing per link.
    let noise = Signal::new(&runtime, 0);
    noise.set(1);
    assert_eq!(head.get(), 1 + DEPTH);

    // A real change propagates link by link, each recompute staying shallow.
    base.set(5);
    assert_eq!(head.get(), 5 + DEPTH);
}
