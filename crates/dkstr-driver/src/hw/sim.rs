// SPDX-License-Identifier: AGPL-3.0-only

//! Emulated accelerator
//!
//! A register-accurate stand-in for the FPGA fabric: the same three windows,
//! the same control word and nibble formats, and the same lock-step
//! relaxation (it runs [`synchronous::relax`] straight over the packed cost
//! nibbles). The protocol driver cannot tell it apart from [`MappedBus`],
//! which gives:
//!
//! 1. **CI without hardware**: the whole offload path (pack → transfer →
//!    launch → wait → read back → reconstruct) runs on any machine.
//! 2. **Parity baseline**: its direction field is by construction the one the
//!    synchronous software variant produces.
//!
//! ## Fabric model
//!
//! ```text
//! side × side PEs, side ≤ 32
//! map BRAM : row-major cost nibbles            (x + y * side)
//! dir BRAM : direction nibbles                 (x + y * side)
//! control  : RUN|LOAD|y<<5|x  -> compute -> clear RUN|LOAD
//! counters : load = map words, run = sweeps, store = dir words
//! ```
//!
//! Only square fabrics are modelled: with the `x + y * height` direction
//! stride a non-square fabric would alias cells.
//!
//! [`MappedBus`]: super::MappedBus

use super::bus::RegisterBus;
use super::wait::CompletionLatch;
use crate::backend::BackendType;
use crate::error::{DkstrError, Result};
use crate::graph::ScratchGraph;
use crate::pack::{pack_directions, PackedCosts};
use crate::software::synchronous;
use dkstr_chip::layout::{Window, MAX_GRID_SIDE, REGION_WORDS};
use dkstr_chip::nibble;
use dkstr_chip::{regs, ControlWord};
use dkstr_maps::Coord;
use std::cell::Cell;
use std::sync::Arc;
use tracing::{debug, trace, warn};

const CONTROL_WORDS: usize = 4;

/// In-memory accelerator with a `side`×`side` PE array.
#[derive(Debug)]
pub struct SimulatedAccelerator {
    side: usize,
    map_bram: Vec<u32>,
    dir_bram: Vec<u32>,
    control: [u32; CONTROL_WORDS],
    poll_latency: u32,
    busy_reads: Cell<u32>,
    latch: Option<Arc<CompletionLatch>>,
    launches: u64,
}

impl SimulatedAccelerator {
    /// Emulator for a `side`×`side` fabric.
    ///
    /// # Panics
    ///
    /// Panics if `side` is 0 or larger than 32.
    pub fn new(side: usize) -> Self {
        match Self::try_new(side) {
            Ok(sim) => sim,
            Err(e) => panic!("{e}"),
        }
    }

    /// Emulator for a `side`×`side` fabric, for sides that come from
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DkstrError::Config`] if `side` is 0 or larger than 32.
    pub fn try_new(side: usize) -> Result<Self> {
        if !(1..=MAX_GRID_SIDE).contains(&side) {
            return Err(DkstrError::config(format!(
                "fabric side {side} outside 1..={MAX_GRID_SIDE}"
            )));
        }
        debug!("Emulated fabric: {side}x{side} PEs");
        Ok(Self {
            side,
            map_bram: vec![0; REGION_WORDS],
            dir_bram: vec![0; REGION_WORDS],
            control: [0; CONTROL_WORDS],
            poll_latency: 0,
            busy_reads: Cell::new(0),
            latch: None,
            launches: 0,
        })
    }

    /// Keep RUN visible for `reads` control-register reads after each launch.
    ///
    /// Results are in the direction window immediately; only the status bit
    /// lags. Meant for exercising the polling loop.
    #[must_use]
    pub fn with_poll_latency(mut self, reads: u32) -> Self {
        self.poll_latency = reads;
        self
    }

    /// Signal `latch` when an operation completes, like the interrupt line.
    #[must_use]
    pub fn with_latch(mut self, latch: Arc<CompletionLatch>) -> Self {
        self.latch = Some(latch);
        self
    }

    /// Fabric side length
    pub const fn side(&self) -> usize {
        self.side
    }

    /// Operations launched so far
    pub const fn launches(&self) -> u64 {
        self.launches
    }

    fn window(&self, window: Window) -> &[u32] {
        match window {
            Window::MapInput => &self.map_bram,
            Window::DirOutput => &self.dir_bram,
            Window::Control => &self.control,
        }
    }

    fn word_index(&self, window: Window, offset: usize) -> Result<usize> {
        let len = self.window(window).len();
        if offset % 4 != 0 || offset / 4 >= len {
            return Err(DkstrError::transfer_failed(format!(
                "Bad access to {window}: offset={offset:#x}, limit={:#x}",
                len * 4
            )));
        }
        Ok(offset / 4)
    }

    fn launch(&mut self, word: ControlWord) -> Result<()> {
        let start = Coord::new(word.start_x() as usize, word.start_y() as usize);
        let side = self.side;
        self.launches += 1;

        let cells = side * side;
        let map_words = nibble::words_for(cells);
        let mut sweeps = 0;
        self.dir_bram.fill(0);

        if start.x < side && start.y < side {
            let mut graph = ScratchGraph::new(side, side);
            let costs = PackedCosts::new(&self.map_bram[..map_words], side, side);
            let stats = synchronous::relax(&costs, &mut graph, start)?;
            sweeps = stats.iterations;
            let dirs = pack_directions(&graph);
            self.dir_bram[..dirs.len()].copy_from_slice(&dirs);
        } else {
            warn!("Launch with start {start} outside the {side}x{side} fabric");
        }

        #[allow(clippy::cast_possible_truncation)]
        {
            self.control[regs::LOAD_CYCLES / 4] = map_words as u32;
            self.control[regs::RUN_CYCLES / 4] = sweeps as u32;
            self.control[regs::STORE_CYCLES / 4] = map_words as u32;
        }

        if self.poll_latency == 0 {
            self.control[regs::CONTROL / 4] = word.completed().raw();
        } else {
            self.control[regs::CONTROL / 4] = word.raw();
            self.busy_reads.set(self.poll_latency);
        }
        debug!("Emulated run from {start}: {sweeps} sweeps");

        if let Some(latch) = &self.latch {
            latch.notify();
        }
        Ok(())
    }
}

impl RegisterBus for SimulatedAccelerator {
    fn read_u32(&self, window: Window, offset: usize) -> Result<u32> {
        let i = self.word_index(window, offset)?;
        if window == Window::Control && offset == regs::CONTROL {
            let left = self.busy_reads.get();
            if left > 0 {
                self.busy_reads.set(left - 1);
                return Ok(self.control[i]);
            }
            let done = ControlWord::from_raw(self.control[i]).completed().raw();
            return Ok(done);
        }
        let value = self.window(window)[i];
        trace!("{window}+{offset:#x} -> {value:#x}");
        Ok(value)
    }

    fn write_u32(&mut self, window: Window, offset: usize, value: u32) -> Result<()> {
        let i = self.word_index(window, offset)?;
        trace!("{window}+{offset:#x} <- {value:#x}");
        match window {
            Window::MapInput => self.map_bram[i] = value,
            Window::DirOutput => self.dir_bram[i] = value,
            Window::Control if offset == regs::CONTROL => {
                let word = ControlWord::from_raw(value);
                if word.is_running() {
                    self.launch(word)?;
                } else {
                    self.control[i] = value;
                }
            }
            // counters are read-only on the fabric
            Window::Control => {}
        }
        Ok(())
    }

    fn fabric_side(&self) -> usize {
        self.side
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Simulated
    }
}
