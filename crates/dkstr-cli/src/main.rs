//! `dkstr`: command-line front end for the grid pathfinder and its FPGA
//! accelerator.
//!
//! ```text
//! USAGE:
//!   dkstr solve <map> <sx> <sy> <ex> <ey>     Find a path on a map file
//!   dkstr rand <seed> <sx> <sy> <ex> <ey>     Find a path on a random map
//!   dkstr profile <samples> [--seed N]        Per-stage timing statistics
//!   dkstr dump-map <map>                      Packed cost words as hex
//!   dkstr put-map <map>                       Cost words -> map window
//!   dkstr dump-path <map> <sx> <sy>           Direction field as a path dump
//!   dkstr put-path <hexdump>                  Direction words -> dir window
//!   dkstr print-path <bram|hexdump> <w> <h>   Render a direction field
//!   dkstr replay <map> <pathdump> <ex> <ey>   Rebuild and cost a stored path
//!
//! Global: --backend auto|incremental|synchronous|hardware|simulated
//!         --wait poll|interrupt   --mem-device PATH
//! ```

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dkstr_chip::layout::{Window, REGION_WORDS};
use dkstr_chip::Compass;
use dkstr_driver::pack::direction_words;
use dkstr_driver::software::synchronous;
use dkstr_driver::{
    pack_costs, pack_directions, reconstruct, select_backend, BackendSelection, BatchStats,
    DirectionField, DriverConfig, MappedBus, PackedDirections, RegisterBus, Route, ScratchGraph,
    WaitMode,
};
use dkstr_maps::{Coord, Grid, MapGenerator};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dkstr", about = "Grid pathfinder and FPGA accelerator driver", version)]
struct Cli {
    #[command(flatten)]
    driver: DriverArgs,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Args)]
struct DriverArgs {
    /// Backend: auto, incremental, synchronous, hardware or simulated.
    #[arg(long, short, global = true, default_value = "auto")]
    backend: BackendSelection,
    /// Completion mechanism, poll or interrupt (overrides DKSTR_WAIT_MODE).
    #[arg(long, global = true)]
    wait: Option<WaitMode>,
    /// Physical memory device (overrides DKSTR_MEM_DEVICE).
    #[arg(long, global = true)]
    mem_device: Option<PathBuf>,
}

impl DriverArgs {
    fn config(&self) -> Result<DriverConfig> {
        let mut config = DriverConfig::from_env().context("reading DKSTR_* environment")?;
        if let Some(mode) = self.wait {
            config.wait_mode = mode;
        }
        if let Some(dev) = &self.mem_device {
            config.mem_device.clone_from(dev);
        }
        Ok(config)
    }
}

#[derive(Args)]
struct Query {
    /// Start column
    sx: usize,
    /// Start row
    sy: usize,
    /// End column
    ex: usize,
    /// End row
    ey: usize,
    /// Draw the map with the path on it.
    #[arg(long)]
    show: bool,
}

impl Query {
    const fn start(&self) -> Coord {
        Coord::new(self.sx, self.sy)
    }

    const fn end(&self) -> Coord {
        Coord::new(self.ex, self.ey)
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Find a path on a map file.
    Solve {
        /// Map file
        map: PathBuf,
        #[command(flatten)]
        query: Query,
    },
    /// Find a path on a seeded random square map.
    Rand {
        /// Generator seed
        seed: u64,
        #[command(flatten)]
        query: Query,
        /// Map side (defaults to the fabric side).
        #[arg(long)]
        side: Option<usize>,
    },
    /// Time random queries and print per-stage statistics.
    Profile {
        /// Number of queries
        samples: usize,
        /// Generator seed (defaults to the clock).
        #[arg(long)]
        seed: Option<u64>,
        /// Map side (defaults to the fabric side).
        #[arg(long)]
        side: Option<usize>,
    },
    /// Print a map's packed cost words, one per line.
    DumpMap {
        /// Map file
        map: PathBuf,
    },
    /// Write a map's packed cost words into the map window.
    PutMap {
        /// Map file
        map: PathBuf,
    },
    /// Relax a map from a start cell and print the result as a path dump.
    DumpPath {
        /// Map file
        map: PathBuf,
        /// Start column
        sx: usize,
        /// Start row
        sy: usize,
    },
    /// Write direction words from a hex dump into the direction window.
    PutPath {
        /// Hex dump of direction words
        dump: PathBuf,
    },
    /// Render a direction field as one glyph per cell.
    PrintPath {
        /// `bram` to read the direction window, else a hex dump file
        source: String,
        /// Field width
        width: usize,
        /// Field height
        height: usize,
    },
    /// Rebuild the path to an end cell from a path dump and cost it.
    Replay {
        /// Map file
        map: PathBuf,
        /// Path dump (start x, start y, direction words)
        dump: PathBuf,
        /// End column
        ex: usize,
        /// End row
        ey: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let config = cli.driver.config()?;
    let backend = cli.driver.backend;

    match cli.command {
        Cmd::Solve { map, query } => {
            let grid = load_grid(&map)?;
            cmd_query(&grid, &query, backend, &config)?;
        }
        Cmd::Rand { seed, query, side } => {
            let side = side.unwrap_or(config.fabric_side);
            let grid = MapGenerator::new(seed).grid(side, side)?;
            cmd_query(&grid, &query, backend, &config)?;
        }
        Cmd::Profile {
            samples,
            seed,
            side,
        } => cmd_profile(samples, seed, side, backend, &config)?,
        Cmd::DumpMap { map } => print!("{}", hex_dump(&pack_costs(&load_grid(&map)?))),
        Cmd::PutMap { map } => cmd_put_map(&map, &config)?,
        Cmd::DumpPath { map, sx, sy } => {
            let words = path_dump(&load_grid(&map)?, Coord::new(sx, sy))?;
            print!("{}", hex_dump(&words));
        }
        Cmd::PutPath { dump } => cmd_put_path(&dump, &config)?,
        Cmd::PrintPath {
            source,
            width,
            height,
        } => cmd_print_path(&source, width, height, &config)?,
        Cmd::Replay { map, dump, ex, ey } => {
            let grid = load_grid(&map)?;
            let words = read_hex_dump(&dump)?;
            let end = Coord::new(ex, ey);
            let (start, route) = replay_route(&grid, &words, end)?;
            print_route(&grid, start, end, &route)?;
        }
    }

    Ok(())
}

fn cmd_query(
    grid: &Grid,
    query: &Query,
    selection: BackendSelection,
    config: &DriverConfig,
) -> Result<()> {
    let (start, end) = (query.start(), query.end());
    let mut backend = select_backend(selection, config)?;
    let sol = backend
        .find(grid, start, end)
        .with_context(|| format!("query {start} -> {end}"))?;

    println!("Backend      : {}", backend.backend_type());
    print_route(grid, start, end, &sol.route)?;
    if let Some(cycles) = sol.cycles {
        println!("Cycles       : {cycles}");
    }
    if query.show {
        println!();
        print!("{}", overlay(grid, start, end, &sol.route)?);
    }
    println!();
    print!("{}", sol.profile);
    Ok(())
}

fn cmd_profile(
    samples: usize,
    seed: Option<u64>,
    side: Option<usize>,
    selection: BackendSelection,
    config: &DriverConfig,
) -> Result<()> {
    if samples == 0 {
        bail!("profile needs at least one sample");
    }
    let side = side.unwrap_or(config.fabric_side);
    let seed = seed.unwrap_or_else(clock_seed);
    let mut backend = select_backend(selection, config)?;
    let mut gen = MapGenerator::new(seed);
    tracing::info!("Profiling {samples} queries on {side}x{side} maps, seed {seed}");

    let mut profiles = Vec::with_capacity(samples);
    let mut reachable = 0;
    for i in 0..samples {
        let grid = gen.grid(side, side)?;
        let start = gen.coord(side, side);
        let end = gen.coord(side, side);
        let sol = backend
            .find(&grid, start, end)
            .with_context(|| format!("sample {i}: {start} -> {end}"))?;
        reachable += usize::from(sol.route.is_found());
        profiles.push(sol.profile);
    }

    let stats = BatchStats::from_samples(&profiles).context("no samples collected")?;
    println!(
        "Backend: {}, seed {seed}, {side}x{side} maps, {reachable}/{samples} reachable",
        backend.backend_type()
    );
    print!("{stats}");
    Ok(())
}

fn cmd_put_map(map: &Path, config: &DriverConfig) -> Result<()> {
    let grid = load_grid(map)?;
    let words = pack_costs(&grid);
    if words.len() > REGION_WORDS {
        bail!(
            "{}x{} map needs {} words, the map window holds {REGION_WORDS}",
            grid.width(),
            grid.height(),
            words.len()
        );
    }
    let mut bus = open_bus(config)?;
    bus.write_words(Window::MapInput, 0, &words)?;
    println!("Wrote {} words to the {}", words.len(), Window::MapInput);
    Ok(())
}

fn cmd_put_path(dump: &Path, config: &DriverConfig) -> Result<()> {
    let words = read_hex_dump(dump)?;
    if words.len() > REGION_WORDS {
        bail!(
            "{} holds {} words, the direction window holds {REGION_WORDS}",
            dump.display(),
            words.len()
        );
    }
    let mut bus = open_bus(config)?;
    bus.write_words(Window::DirOutput, 0, &words)?;
    println!("Wrote {} words to the {}", words.len(), Window::DirOutput);
    Ok(())
}

fn cmd_print_path(source: &str, width: usize, height: usize, config: &DriverConfig) -> Result<()> {
    if width == 0 || height == 0 {
        bail!("field dimensions must be non-zero");
    }
    let words = if source == "bram" {
        let bus = open_bus(config)?;
        let mut words = vec![0; direction_words(width, height).min(REGION_WORDS)];
        bus.read_words(Window::DirOutput, 0, &mut words)?;
        words
    } else {
        read_hex_dump(Path::new(source))?
    };
    print!("{}", render_field(&PackedDirections::new(&words, width, height)));
    Ok(())
}

fn open_bus(config: &DriverConfig) -> Result<MappedBus> {
    MappedBus::open(config).with_context(|| {
        format!(
            "mapping accelerator windows through {}",
            config.mem_device.display()
        )
    })
}

fn load_grid(path: &Path) -> Result<Grid> {
    Grid::from_file(path).with_context(|| format!("loading map {}", path.display()))
}

fn print_route(grid: &Grid, start: Coord, end: Coord, route: &Route) -> Result<()> {
    match route {
        Route::Found(path) => {
            println!(
                "Path         : {start} -> {end}, {} moves, {} steps",
                path.len(),
                path.steps()
            );
            for m in path.replay() {
                println!("    {m}");
            }
            println!("Cost         : {}", path.cost(grid, start)?);
        }
        Route::Unreachable {
            stopped_at,
            partial,
        } => println!(
            "No path      : {start} -> {end} (walk stopped at {stopped_at} after {} steps)",
            partial.steps()
        ),
    }
    Ok(())
}

/// Map rows with the path drawn in: `S` start, `E` end, `*` in between.
fn overlay(grid: &Grid, start: Coord, end: Coord, route: &Route) -> Result<String> {
    let w = grid.width();
    let mut cells = grid.cells().to_vec();
    if let Some(path) = route.path() {
        for c in path.cells(start, w, grid.height())? {
            cells[c.index(w)] = b'*';
        }
    }
    cells[start.index(w)] = b'S';
    cells[end.index(w)] = b'E';

    let mut out = String::with_capacity(cells.len() + grid.height());
    for row in cells.chunks(w) {
        out.push_str(&String::from_utf8_lossy(row));
        out.push('\n');
    }
    Ok(out)
}

/// One glyph per cell, `@` where no direction is recorded.
fn render_field<F: DirectionField + ?Sized>(field: &F) -> String {
    let mut out = String::with_capacity((field.width() + 1) * field.height());
    for y in 0..field.height() {
        for x in 0..field.width() {
            out.push(field.predecessor(Coord::new(x, y)).map_or('@', Compass::glyph));
        }
        out.push('\n');
    }
    out
}

/// Start x, start y, then the synchronous relaxation's direction words.
fn path_dump(grid: &Grid, start: Coord) -> Result<Vec<u32>> {
    let mut graph = ScratchGraph::new(grid.width(), grid.height());
    synchronous::relax(grid, &mut graph, start)?;
    let mut words = vec![u32::try_from(start.x)?, u32::try_from(start.y)?];
    words.extend(pack_directions(&graph));
    Ok(words)
}

fn replay_route(grid: &Grid, words: &[u32], end: Coord) -> Result<(Coord, Route)> {
    let [x, y, dirs @ ..] = words else {
        bail!("path dump needs a start coordinate header");
    };
    let start = Coord::new(usize::try_from(*x)?, usize::try_from(*y)?);
    let field = PackedDirections::new(dirs, grid.width(), grid.height());
    let route = reconstruct(&field, start, end)?;
    Ok((start, route))
}

fn hex_dump(words: &[u32]) -> String {
    let mut out = String::with_capacity(words.len() * 9);
    for w in words {
        let _ = writeln!(out, "{w:08x}");
    }
    out
}

fn parse_hex_dump(text: &str) -> Result<Vec<u32>> {
    text.split_whitespace()
        .enumerate()
        .map(|(i, tok)| {
            let digits = tok.trim_start_matches("0x");
            u32::from_str_radix(digits, 16)
                .with_context(|| format!("word {}: {tok:?} is not a hex word", i + 1))
        })
        .collect()
}

fn read_hex_dump(path: &Path) -> Result<Vec<u32>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading hex dump {}", path.display()))?;
    parse_hex_dump(&text).with_context(|| format!("parsing {}", path.display()))
}

fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
