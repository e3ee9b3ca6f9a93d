//! Register-level protocol driver
//!
//! ```text
//! pre-process    pack_costs(grid)                 -> local words
//! transfer-to    words -> map window
//! execute        arm wait; control <- RUN|LOAD|y<<5|x; wait (disarm if
//!                the control write fails)
//! transfer-from  dir window -> local words
//! post-process   reconstruct over x + y*h directions
//! then           read load/run/store cycle counters
//! ```
//!
//! The bus is owned, and every request takes `&mut self`, so at most one
//! operation is in flight. A launch is also refused while the fabric still
//! reports RUN from an earlier request.

use super::bus::RegisterBus;
use super::wait::CompletionWait;
use crate::backend::{check_query, BackendType, PathBackend, Solution};
use crate::error::{DkstrError, Result};
use crate::pack::{direction_words, pack_costs, PackedDirections};
use crate::path::reconstruct;
use crate::profile::{ProfileSample, Stage};
use dkstr_chip::layout::{Window, MAX_GRID_SIDE, REGION_WORDS};
use dkstr_chip::{regs, ControlWord};
use dkstr_maps::{Coord, Grid};
use std::fmt;
use tracing::debug;

/// Fabric cycle counters for the last operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleCounters {
    /// Cycles spent loading the map
    pub load: u32,
    /// Cycles spent relaxing
    pub run: u32,
    /// Cycles spent storing directions
    pub store: u32,
}

impl fmt::Display for CycleCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "load {} / run {} / store {} cycles",
            self.load, self.run, self.store
        )
    }
}

/// Offloads queries to an accelerator behind a [`RegisterBus`].
#[derive(Debug)]
pub struct HardwarePathfinder<B: RegisterBus> {
    bus: B,
    wait: Box<dyn CompletionWait>,
}

impl<B: RegisterBus> HardwarePathfinder<B> {
    /// Driver over `bus`, blocking on completion with `wait`.
    pub fn new(bus: B, wait: Box<dyn CompletionWait>) -> Self {
        debug!(
            "Hardware pathfinder on {} bus, {} wait",
            bus.backend_type(),
            wait.mode()
        );
        Self { bus, wait }
    }

    /// Underlying bus
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Underlying bus, mutably (raw window access for diagnostics)
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Read the fabric's cycle counters.
    ///
    /// # Errors
    ///
    /// Returns error if the control window cannot be read.
    pub fn cycle_counters(&self) -> Result<CycleCounters> {
        Ok(CycleCounters {
            load: self.bus.read_u32(Window::Control, regs::LOAD_CYCLES)?,
            run: self.bus.read_u32(Window::Control, regs::RUN_CYCLES)?,
            store: self.bus.read_u32(Window::Control, regs::STORE_CYCLES)?,
        })
    }

    /// True while the control register reports RUN
    ///
    /// # Errors
    ///
    /// Returns error if the control window cannot be read.
    pub fn is_busy(&self) -> Result<bool> {
        let word = self.bus.read_u32(Window::Control, regs::CONTROL)?;
        Ok(ControlWord::from_raw(word).is_running())
    }

    fn offload(&mut self, grid: &Grid, start: Coord, end: Coord) -> Result<Solution> {
        let launch = validate(grid, start, end, self.bus.fabric_side())?;
        if self.is_busy()? {
            return Err(DkstrError::Busy);
        }

        let (w, h) = (grid.width(), grid.height());
        let mut profile = ProfileSample::default();

        let words = profile.time(Stage::PreProcess, || pack_costs(grid));

        profile.time(Stage::TransferTo, || {
            self.bus.write_words(Window::MapInput, 0, &words)
        })?;

        let polls = profile.time(Stage::Execute, || -> Result<u64> {
            self.wait.arm()?;
            if let Err(e) = self.bus.write_u32(Window::Control, regs::CONTROL, launch.raw()) {
                self.wait.disarm();
                return Err(e);
            }
            self.wait.wait(&self.bus)
        })?;

        let mut dirs = vec![0; direction_words(w, h).min(REGION_WORDS)];
        profile.time(Stage::TransferFrom, || {
            self.bus.read_words(Window::DirOutput, 0, &mut dirs)
        })?;

        let route = profile.time(Stage::PostProcess, || {
            reconstruct(&PackedDirections::new(&dirs, w, h), start, end)
        })?;

        let cycles = self.cycle_counters()?;
        debug!(
            "Offloaded {w}x{h} query {start} -> {end}: {cycles}, {polls} status reads"
        );

        Ok(Solution {
            route,
            profile,
            cycles: Some(cycles),
        })
    }
}

/// Reject anything the fabric, the 5-bit coordinate fields or the 4 KiB
/// windows cannot carry, before touching a register.
fn validate(grid: &Grid, start: Coord, end: Coord, side: usize) -> Result<ControlWord> {
    check_query(grid, start, end)?;
    let (w, h) = (grid.width(), grid.height());
    if w > MAX_GRID_SIDE || h > MAX_GRID_SIDE {
        return Err(DkstrError::protocol_violation(format!(
            "{w}x{h} grid exceeds the {MAX_GRID_SIDE}x{MAX_GRID_SIDE} coordinate range"
        )));
    }
    if w != side || h != side {
        return Err(DkstrError::protocol_violation(format!(
            "{w}x{h} grid does not match the {side}x{side} fabric"
        )));
    }
    if dkstr_chip::nibble::words_for(w * h) > REGION_WORDS {
        return Err(DkstrError::protocol_violation(format!(
            "{w}x{h} map does not fit the map window"
        )));
    }
    #[allow(clippy::cast_possible_truncation)]
    ControlWord::launch(start.x as u32, start.y as u32).ok_or_else(|| {
        DkstrError::protocol_violation(format!("start {start} does not fit the control word"))
    })
}

impl<B: RegisterBus> PathBackend for HardwarePathfinder<B> {
    fn find(&mut self, grid: &Grid, start: Coord, end: Coord) -> Result<Solution> {
        self.offload(grid, start, end)
    }

    fn backend_type(&self) -> BackendType {
        self.bus.backend_type()
    }
}
