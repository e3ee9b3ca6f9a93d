// SPDX-License-Identifier: AGPL-3.0-only

//! bench_hw_sw_parity: offload path against the CPU variants
//!
//! Runs identical queries through every backend and checks:
//!   1. Cost parity: incremental and synchronous agree on reachability and cost
//!   2. Field parity: the offload path returns exactly the synchronous route
//!      (same sweep order, so ties break the same way)
//!   3. Throughput: queries per second for each backend
//!   4. Fabric cycles: mean load / run / store counters (offload only)
//!
//! Usage:
//!   cargo run --release --bin bench_hw_sw_parity             # emulator only
//!   cargo run --release --bin bench_hw_sw_parity -- --hw     # include the FPGA
//!   cargo run --release --bin bench_hw_sw_parity -- --iters=5000 --verbose

use anyhow::{bail, Result};
use dkstr_driver::{
    select_backend, BackendSelection, DriverConfig, HalfUnits, PathBackend, Solution,
};
use dkstr_maps::{Coord, Grid, MapGenerator};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

struct Run {
    name: String,
    solutions: Vec<Solution>,
    elapsed_s: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let use_hw = args.iter().any(|a| a == "--hw");
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    let iters = args
        .iter()
        .find_map(|a| a.strip_prefix("--iters="))
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(2_000);
    let seed = args
        .iter()
        .find_map(|a| a.strip_prefix("--seed="))
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0xD57);

    let config = DriverConfig::from_env()?;
    let side = config.fabric_side;

    println!("Hardware vs software pathfinder parity");
    println!("======================================");
    println!("  Maps: {side}x{side}, seed {seed:#x}, iterations {iters}");
    if use_hw {
        println!("  Mode: including the FPGA ({} wait)", config.wait_mode);
    } else {
        println!("  Mode: emulator only. Run with --hw for the FPGA.");
    }
    println!();

    let mut gen = MapGenerator::new(seed);
    let queries = (0..iters)
        .map(|_| -> Result<(Grid, Coord, Coord)> {
            let grid = gen.grid(side, side)?;
            Ok((grid, gen.coord(side, side), gen.coord(side, side)))
        })
        .collect::<Result<Vec<_>>>()?;

    let incremental = run(BackendSelection::Incremental, &config, &queries)?;
    let synchronous = run(BackendSelection::Synchronous, &config, &queries)?;
    let mut offload = vec![run(BackendSelection::Simulated, &config, &queries)?];
    if use_hw {
        offload.push(run(BackendSelection::Hardware, &config, &queries)?);
    }

    println!("Throughput");
    println!("----------");
    for r in [&incremental, &synchronous].into_iter().chain(offload.iter()) {
        println!(
            "  {:<22} {:>10.0} queries/s",
            r.name,
            queries.len() as f64 / r.elapsed_s
        );
    }
    println!();

    let mut failures = 0;

    println!("Cost parity: {} vs {}", incremental.name, synchronous.name);
    failures += compare(&queries, &incremental, &synchronous, verbose, |q, a, b| {
        cost(q, a) == cost(q, b)
    });

    for r in &offload {
        println!("Field parity: {} vs {}", synchronous.name, r.name);
        failures += compare(&queries, &synchronous, r, verbose, |_, a, b| a.route == b.route);
        print_cycles(r);
    }

    if failures > 0 {
        bail!("{failures} parity mismatches");
    }
    println!("All backends agree.");
    Ok(())
}

fn run(
    selection: BackendSelection,
    config: &DriverConfig,
    queries: &[(Grid, Coord, Coord)],
) -> Result<Run> {
    let mut backend: Box<dyn PathBackend> = select_backend(selection, config)?;
    let t0 = Instant::now();
    let solutions = queries
        .iter()
        .map(|(grid, start, end)| backend.find(grid, *start, *end))
        .collect::<dkstr_driver::Result<Vec<_>>>()?;
    Ok(Run {
        name: backend.backend_type().to_string(),
        solutions,
        elapsed_s: t0.elapsed().as_secs_f64(),
    })
}

fn cost(query: &(Grid, Coord, Coord), sol: &Solution) -> Option<HalfUnits> {
    let (grid, start, _) = query;
    sol.route.path().and_then(|p| p.cost(grid, *start).ok())
}

fn compare(
    queries: &[(Grid, Coord, Coord)],
    a: &Run,
    b: &Run,
    verbose: bool,
    same: impl Fn(&(Grid, Coord, Coord), &Solution, &Solution) -> bool,
) -> usize {
    let mut mismatches = 0;
    for (i, q) in queries.iter().enumerate() {
        let (sa, sb) = (&a.solutions[i], &b.solutions[i]);
        if !same(q, sa, sb) {
            mismatches += 1;
            if verbose {
                println!(
                    "  #{i} {} -> {}: {:?} vs {:?}",
                    q.1,
                    q.2,
                    cost(q, sa),
                    cost(q, sb)
                );
            }
        }
    }
    let found = a.solutions.iter().filter(|s| s.route.is_found()).count();
    println!(
        "  {} / {} agree ({found} reachable)",
        queries.len() - mismatches,
        queries.len()
    );
    mismatches
}

fn print_cycles(run: &Run) {
    let mut n = 0.0;
    let (mut load, mut exec, mut store) = (0.0, 0.0, 0.0);
    for c in run.solutions.iter().filter_map(|s| s.cycles) {
        n += 1.0;
        load += f64::from(c.load);
        exec += f64::from(c.run);
        store += f64::from(c.store);
    }
    if n == 0.0 {
        return;
    }
    println!(
        "  mean cycles: load {:.1}, run {:.1}, store {:.1}",
        load / n,
        exec / n,
        store / n
    );
    println!();
}
