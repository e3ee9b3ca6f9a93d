//! Backend abstraction for pathfinders
//!
//! Software variants and the offload driver answer the same query through
//! [`PathBackend`], so callers pick one at runtime and compare results.

use crate::config::{DriverConfig, WaitMode};
use crate::error::{DkstrError, Result};
use crate::hw::{
    CompletionLatch, CompletionWait, CycleCounters, HardwarePathfinder, LatchWait, MappedBus,
    PollWait, SignalWait, SimulatedAccelerator,
};
use crate::path::Route;
use crate::profile::ProfileSample;
use crate::software::{IncrementalBackend, SynchronousBackend};
use dkstr_maps::{Coord, Grid};
use std::fmt::{self, Debug};
use std::str::FromStr;
use std::sync::Arc;

/// One way of answering a shortest-path query.
pub trait PathBackend: Debug + Send {
    /// Find the cheapest route from `start` to `end` over `grid`.
    ///
    /// An unreachable destination is not an error: it comes back as
    /// [`Route::Unreachable`].
    ///
    /// # Errors
    ///
    /// Returns error if an endpoint lies outside the grid, the grid does not
    /// fit the backend, or the device fails.
    fn find(&mut self, grid: &Grid, start: Coord, end: Coord) -> Result<Solution>;

    /// Get backend type for reporting
    fn backend_type(&self) -> BackendType;
}

/// Result of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// Reconstructed route
    pub route: Route,
    /// Per-stage wall-clock times
    pub profile: ProfileSample,
    /// Fabric cycle counters, hardware backends only
    pub cycles: Option<CycleCounters>,
}

/// Backend type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// FIFO label-correcting relaxation on the CPU
    Incremental,

    /// Lock-step raster sweeps on the CPU
    Synchronous,

    /// FPGA accelerator through `/dev/mem`
    Hardware,

    /// Register-level emulator of the accelerator
    Simulated,
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incremental => write!(f, "Incremental (CPU)"),
            Self::Synchronous => write!(f, "Synchronous (CPU)"),
            Self::Hardware => write!(f, "Hardware (FPGA)"),
            Self::Simulated => write!(f, "Simulated (emulator)"),
        }
    }
}

/// Backend selection strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendSelection {
    /// Hardware if it can be opened, else the incremental CPU variant
    #[default]
    Auto,

    /// Force [`IncrementalBackend`]
    Incremental,

    /// Force [`SynchronousBackend`]
    Synchronous,

    /// Force the FPGA (fails if unavailable)
    Hardware,

    /// Force the emulator
    Simulated,
}

impl FromStr for BackendSelection {
    type Err = DkstrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "incremental" | "inc" | "sw" => Ok(Self::Incremental),
            "synchronous" | "sync" => Ok(Self::Synchronous),
            "hardware" | "hw" | "fpga" => Ok(Self::Hardware),
            "simulated" | "sim" | "emulator" => Ok(Self::Simulated),
            other => Err(DkstrError::config(format!("unknown backend {other:?}"))),
        }
    }
}

/// Both endpoints must be cells of `grid`.
pub(crate) fn check_query(grid: &Grid, start: Coord, end: Coord) -> Result<()> {
    for c in [start, end] {
        if !grid.contains(c) {
            return Err(DkstrError::out_of_bounds(c, grid.width(), grid.height()));
        }
    }
    Ok(())
}

/// Build the backend named by `selection`.
///
/// # Errors
///
/// Returns error if a forced hardware backend cannot be opened, or
/// [`DkstrError::Config`] if the emulated fabric side is out of range.
pub fn select_backend(
    selection: BackendSelection,
    config: &DriverConfig,
) -> Result<Box<dyn PathBackend>> {
    match selection {
        BackendSelection::Auto => match open_hardware(config) {
            Ok(backend) => {
                tracing::info!("Using hardware backend ({} wait)", config.wait_mode);
                Ok(backend)
            }
            Err(e) => {
                tracing::warn!("Hardware unavailable ({e}), using incremental software backend");
                Ok(Box::new(IncrementalBackend))
            }
        },

        BackendSelection::Incremental => Ok(Box::new(IncrementalBackend)),

        BackendSelection::Synchronous => Ok(Box::new(SynchronousBackend)),

        BackendSelection::Hardware => open_hardware(config),

        BackendSelection::Simulated => open_simulated(config),
    }
}

fn open_hardware(config: &DriverConfig) -> Result<Box<dyn PathBackend>> {
    let bus = MappedBus::open(config)?;
    let wait: Box<dyn CompletionWait> = match config.wait_mode {
        WaitMode::Poll => Box::new(PollWait),
        WaitMode::Interrupt => Box::new(SignalWait::open(&config.interrupt_device)?),
    };
    Ok(Box::new(HardwarePathfinder::new(bus, wait)))
}

fn open_simulated(config: &DriverConfig) -> Result<Box<dyn PathBackend>> {
    let sim = SimulatedAccelerator::try_new(config.fabric_side)?;
    Ok(match config.wait_mode {
        WaitMode::Poll => Box::new(HardwarePathfinder::new(sim, Box::new(PollWait))),
        WaitMode::Interrupt => {
            let latch = Arc::new(CompletionLatch::new());
            let sim = sim.with_latch(Arc::clone(&latch));
            Box::new(HardwarePathfinder::new(sim, Box::new(LatchWait::new(latch))))
        }
    })
}
