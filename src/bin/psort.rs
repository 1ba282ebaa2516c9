//! Quicksort driver: sorts random integers sequentially and in parallel,
//! reporting microsecond timings and verifying sortedness.

use std::env;
use std::time::Instant;

use anyhow::{bail, Context, Result};

use lockstep::sort::{sort_sequential, ParallelSorter};
use lockstep::testing::{generate_array, is_sorted};

const DEFAULT_LEN: usize = 10_000_000;
const DEFAULT_THREADS: usize = 4;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let usage = format!("usage: {} [len] [threads]", args[0]);
    if args.len() > 3 {
        bail!("{usage}");
    }
    let len: usize = match args.get(1) {
        Some(raw) => raw.parse().with_context(|| usage.clone())?,
        None => DEFAULT_LEN,
    };
    let threads: usize = match args.get(2) {
        Some(raw) => raw.parse().with_context(|| usage.clone())?,
        None => DEFAULT_THREADS,
    };
    if threads == 0 {
        bail!("{usage}");
    }

    let first: Vec<i16> = generate_array(len);
    let mut second = first.clone();
    let mut first = first;

    println!("Array is sorted before: {}", is_sorted(&first));
    let started = Instant::now();
    sort_sequential(&mut first);
    println!(
        "Time difference (single thread) = {}[µs]",
        started.elapsed().as_micros()
    );
    println!("Array is sorted after: {}", is_sorted(&first));
    assert!(is_sorted(&first), "sequential sort left the array unsorted");

    let sorter = ParallelSorter::new(threads);
    println!("Array is sorted before: {}", is_sorted(&second));
    let started = Instant::now();
    sorter.sort(&mut second);
    println!(
        "Time difference (multiple threads) = {}[µs]",
        started.elapsed().as_micros()
    );
    println!("Array is sorted after: {}", is_sorted(&second));
    assert!(is_sorted(&second), "parallel sort left the array unsorted");
    assert_eq!(first, second, "sequential and parallel sorts disagree");

    Ok(())
}
