//! Concurrent BST driver: hammers a shared external BST from several
//! threads with a weighted insert/remove/contains mix, then checks the
//! recorded history for linearizability and the tree for the external-BST
//! predicate.

use std::cell::RefCell;
use std::env;
use std::thread;

use anyhow::{bail, Context, Result};
use rand::Rng;

use lockstep::collections::ExternalBst;
use lockstep::testing::{
    history_is_linearizable, rand_test, DurationSeconds, History, Operation, WeightedOutcome,
};

const KEY_SPACE: i64 = 100_000;
const HISTORY_DUMP: &str = "pbst-history.json";

/// Inserts a random half of `values`, median-first so the initial tree is
/// balanced, and returns the inserted keys.
fn prepopulate(tree: &ExternalBst<i64>, values: &[i64]) -> Vec<i64> {
    let mut rng = rand::thread_rng();
    let inserted: Vec<i64> = values.iter().copied().filter(|_| rng.gen_bool(0.5)).collect();

    let mut stack = vec![(0usize, inserted.len())];
    while let Some((lo, hi)) = stack.pop() {
        if lo == hi {
            continue;
        }
        let mid = lo + (hi - lo) / 2;
        tree.insert(inserted[mid]);
        stack.push((lo, mid));
        stack.push((mid + 1, hi));
    }
    inserted
}

/// One thread's share of the run: weighted random operations against the
/// shared tree, recorded with their entry timestamps.
fn run_thread(
    tree: &ExternalBst<i64>,
    values: &[i64],
    x: u32,
    duration_seconds: u64,
) -> Vec<Operation<i64>> {
    let recorded = RefCell::new(Vec::new());
    let pick = || values[rand::thread_rng().gen_range(0..values.len())];

    let mut outcomes = [
        WeightedOutcome::new(x, || {
            let key = pick();
            let entry = tree.insert_timed(key);
            recorded.borrow_mut().push(Operation::insert(key, entry));
            true
        }),
        WeightedOutcome::new(x, || {
            let key = pick();
            let entry = tree.remove_timed(&key);
            recorded.borrow_mut().push(Operation::remove(key, entry));
            true
        }),
        WeightedOutcome::new(10 - 2 * x, || {
            let key = pick();
            let (found, entry) = tree.contains_timed(&key);
            recorded.borrow_mut().push(Operation::contains(key, entry, found));
            true
        }),
    ];
    rand_test(&mut DurationSeconds::new(duration_seconds), || true, &mut outcomes);
    drop(outcomes);

    recorded.into_inner()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let usage = format!(
        "usage: {} <parallelism> <x> <duration_seconds>  (with 0 <= x <= 5)",
        args[0]
    );
    if args.len() != 4 {
        bail!("{usage}");
    }
    let parallelism: usize = args[1].parse().with_context(|| usage.clone())?;
    let x: u32 = args[2].parse().with_context(|| usage.clone())?;
    let duration_seconds: u64 = args[3].parse().with_context(|| usage.clone())?;
    if x > 5 {
        bail!("probability parameter x must satisfy 0 <= x <= 5; {usage}");
    }
    if duration_seconds == 0 {
        bail!("{usage}");
    }

    println!(
        "Running experiment for parallelism={parallelism}, x={x}, duration={duration_seconds}s..."
    );

    let tree = ExternalBst::new();
    let values: Vec<i64> = (0..KEY_SPACE).collect();
    let initial = prepopulate(&tree, &values);

    let per_thread: Vec<Vec<Operation<i64>>> = thread::scope(|s| {
        let handles: Vec<_> = (0..parallelism)
            .map(|_| {
                let tree = &tree;
                let values = &values;
                s.spawn(move || run_thread(tree, values, x, duration_seconds))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("test thread panicked"))
            .collect()
    });

    let total_ops: usize = per_thread.iter().map(Vec::len).sum();
    let history = History { initial, per_thread };

    println!("Experiment finished, running checks...");
    match history_is_linearizable(&history) {
        Ok(()) => println!("Performed operations history is linearizable: true"),
        Err(violation) => {
            std::fs::write(HISTORY_DUMP, serde_json::to_string_pretty(&history)?)
                .with_context(|| format!("failed to dump history to {HISTORY_DUMP}"))?;
            eprintln!("offending history dumped to {HISTORY_DUMP}");
            panic!("performed operations history is not linearizable: {violation}");
        }
    }

    assert!(
        tree.is_valid(),
        "result structure is not a valid external BST"
    );
    println!("Result structure is a valid external BST: true");
    println!(
        "Average bandwidth: {} op/s",
        total_ops as u64 / duration_seconds
    );

    Ok(())
}
