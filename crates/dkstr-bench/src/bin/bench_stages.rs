// SPDX-License-Identifier: AGPL-3.0-only

//! Per-stage latency of every backend on the same random queries.
//!
//! Every backend sees the identical sequence of maps and endpoints, so the
//! stage columns are directly comparable:
//!
//!   pre-process   graph allocation (software) or cost packing (offload)
//!   transfer to   map words into the map window (offload only)
//!   execute       relaxation
//!   transfer from direction words out of the window (offload only)
//!   post-process  path reconstruction
//!
//! Usage:
//!   cargo run --release --bin bench_stages
//!   cargo run --release --bin bench_stages -- --samples 5000 --seed 7
//!   cargo run --release --bin bench_stages -- --hw      # include the FPGA

use anyhow::Result;
use dkstr_driver::{
    select_backend, BackendSelection, BatchStats, DriverConfig, PathBackend, ProfileSample, Stage,
};
use dkstr_maps::{Coord, Grid, MapGenerator};
use tracing_subscriber::EnvFilter;

const DEFAULT_SAMPLES: usize = 1000;
const DEFAULT_SEED: usize = 1;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let samples = parse_arg(&args, "--samples", DEFAULT_SAMPLES).max(1);
    let seed = parse_arg(&args, "--seed", DEFAULT_SEED) as u64;
    let use_hw = args.iter().any(|a| a == "--hw");

    let config = DriverConfig::from_env()?;
    let side = config.fabric_side;

    println!("Stage latency benchmark");
    println!("=======================");
    println!("Maps       : {side}x{side}, seed {seed}");
    println!("Samples    : {samples}");
    println!();

    let queries = queries(seed, side, samples)?;

    let mut selections = vec![
        BackendSelection::Incremental,
        BackendSelection::Synchronous,
        BackendSelection::Simulated,
    ];
    if use_hw {
        selections.push(BackendSelection::Hardware);
    }

    let mut summary = Vec::new();
    for selection in selections {
        let mut backend = select_backend(selection, &config)?;
        let stats = run(backend.as_mut(), &queries)?;
        println!("{}", backend.backend_type());
        println!("{}", "-".repeat(backend.backend_type().to_string().len()));
        print!("{stats}");
        println!();
        summary.push((backend.backend_type().to_string(), stats.mean_sample()));
    }

    println!("Mean per stage (ns)");
    println!("-------------------");
    print!("{:<22}", "");
    for stage in Stage::ALL {
        print!("{:>14}", stage.label());
    }
    println!("{:>14}", "Total");
    for (name, mean) in &summary {
        print!("{name:<22}");
        for stage in Stage::ALL {
            print!("{:>14}", mean.get(stage));
        }
        println!("{:>14}", mean.total());
    }

    Ok(())
}

fn queries(seed: u64, side: usize, samples: usize) -> Result<Vec<(Grid, Coord, Coord)>> {
    let mut gen = MapGenerator::new(seed);
    (0..samples)
        .map(|_| -> Result<(Grid, Coord, Coord)> {
            let grid = gen.grid(side, side)?;
            let start = gen.coord(side, side);
            let end = gen.coord(side, side);
            Ok((grid, start, end))
        })
        .collect()
}

fn run(backend: &mut dyn PathBackend, queries: &[(Grid, Coord, Coord)]) -> Result<BatchStats> {
    // warmup
    for (grid, start, end) in queries.iter().take(20) {
        backend.find(grid, *start, *end)?;
    }

    let profiles: Vec<ProfileSample> = queries
        .iter()
        .map(|(grid, start, end)| backend.find(grid, *start, *end).map(|s| s.profile))
        .collect::<dkstr_driver::Result<_>>()?;
    BatchStats::from_samples(&profiles).ok_or_else(|| anyhow::anyhow!("no samples"))
}

fn parse_arg(args: &[String], flag: &str, default: usize) -> usize {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
