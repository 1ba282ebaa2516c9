//! Cubic-grid BFS driver: runs sequential and parallel BFS from the
//! origin and validates the closed-form distances `x + y + z`.

use std::env;
use std::time::Instant;

use anyhow::{bail, Context, Result};

use lockstep::graph::{CubicGraph, Weight};

const DEFAULT_SIDE: u32 = 500;

fn validate_cube_distances(distances: &[Weight], graph: &CubicGraph) -> bool {
    distances.iter().enumerate().all(|(idx, &d)| {
        let (x, y, z) = graph.idx_1d_to_3d(idx as u32);
        d == x + y + z
    })
}

fn run_experiment(distances: Vec<Weight>, graph: &CubicGraph, started: Instant) -> u64 {
    let elapsed = started.elapsed().as_secs();
    let valid = validate_cube_distances(&distances, graph);
    println!("Algorithm found valid distances: {valid}");
    assert!(valid, "BFS produced wrong distances on the cubic grid");
    elapsed
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let usage = format!("usage: {} <parallelism> [side]", args[0]);
    let Some(raw_parallelism) = args.get(1) else {
        bail!("missing parallelism parameter; {usage}");
    };
    let parallelism: usize = raw_parallelism.parse().with_context(|| usage.clone())?;
    let side: u32 = match args.get(2) {
        Some(raw) => raw.parse().with_context(|| usage.clone())?,
        None => DEFAULT_SIDE,
    };
    if side == 0 {
        bail!("{usage}");
    }

    let graph = CubicGraph::new(side);

    let started = Instant::now();
    let distances = graph.bfs_distances(0);
    let elapsed = run_experiment(distances, &graph, started);
    println!("Single threaded result: {elapsed}[s]");

    if parallelism > 0 {
        let started = Instant::now();
        let distances = graph.pbfs_distances(0, parallelism);
        let elapsed = run_experiment(distances, &graph, started);
        println!("Multi threaded result: {elapsed}[s]");
    }

    Ok(())
}
