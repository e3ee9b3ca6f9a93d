//! Register bus abstraction
//!
//! The protocol driver talks to three word-addressed windows. [`MappedBus`]
//! reaches the real FPGA through `/dev/mem`; the emulator implements the same
//! trait in memory.

use super::mmio::MmapRegion;
use crate::backend::BackendType;
use crate::config::DriverConfig;
use crate::error::Result;
use dkstr_chip::layout::{Window, REGION_SIZE};
use std::fmt::Debug;

/// Word access to the accelerator's register windows. Offsets are in bytes.
pub trait RegisterBus: Debug + Send {
    /// Read one 32-bit word.
    ///
    /// # Errors
    ///
    /// Returns error if the offset is misaligned or outside the window.
    fn read_u32(&self, window: Window, offset: usize) -> Result<u32>;

    /// Write one 32-bit word.
    ///
    /// # Errors
    ///
    /// Returns error if the offset is misaligned or outside the window.
    fn write_u32(&mut self, window: Window, offset: usize, value: u32) -> Result<()>;

    /// Copy `words` into `window` starting at byte `offset`.
    ///
    /// # Errors
    ///
    /// Returns error if the block does not fit the window.
    fn write_words(&mut self, window: Window, offset: usize, words: &[u32]) -> Result<()> {
        for (i, &w) in words.iter().enumerate() {
            self.write_u32(window, offset + i * 4, w)?;
        }
        Ok(())
    }

    /// Fill `out` from `window` starting at byte `offset`.
    ///
    /// # Errors
    ///
    /// Returns error if the block does not fit the window.
    fn read_words(&self, window: Window, offset: usize, out: &mut [u32]) -> Result<()> {
        for (i, w) in out.iter_mut().enumerate() {
            *w = self.read_u32(window, offset + i * 4)?;
        }
        Ok(())
    }

    /// Side length of the square PE array behind the bus
    fn fabric_side(&self) -> usize;

    /// Which backend this bus belongs to, for reporting
    fn backend_type(&self) -> BackendType;
}

/// The three windows of the physical accelerator.
#[derive(Debug)]
pub struct MappedBus {
    map_input: MmapRegion,
    dir_output: MmapRegion,
    control: MmapRegion,
    fabric_side: usize,
}

impl MappedBus {
    /// Map all three windows at the configured addresses.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DkstrError::HardwareUnavailable`] if any window
    /// cannot be mapped.
    pub fn open(config: &DriverConfig) -> Result<Self> {
        let map = |window: Window| {
            MmapRegion::new(
                &config.mem_device,
                config.address_map.base(window),
                REGION_SIZE,
            )
        };
        let bus = Self {
            map_input: map(Window::MapInput)?,
            dir_output: map(Window::DirOutput)?,
            control: map(Window::Control)?,
            fabric_side: config.fabric_side,
        };
        tracing::info!(
            "Accelerator windows mapped: map {:#x}, dir {:#x}, ctrl {:#x}",
            config.address_map.map_input,
            config.address_map.dir_output,
            config.address_map.control
        );
        Ok(bus)
    }

    fn region(&self, window: Window) -> &MmapRegion {
        match window {
            Window::MapInput => &self.map_input,
            Window::DirOutput => &self.dir_output,
            Window::Control => &self.control,
        }
    }

    fn region_mut(&mut self, window: Window) -> &mut MmapRegion {
        match window {
            Window::MapInput => &mut self.map_input,
            Window::DirOutput => &mut self.dir_output,
            Window::Control => &mut self.control,
        }
    }
}

impl RegisterBus for MappedBus {
    fn read_u32(&self, window: Window, offset: usize) -> Result<u32> {
        self.region(window).read_u32(offset)
    }

    fn write_u32(&mut self, window: Window, offset: usize, value: u32) -> Result<()> {
        self.region_mut(window).write_u32(offset, value)
    }

    fn fabric_side(&self) -> usize {
        self.fabric_side
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Hardware
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DkstrError;
    use dkstr_chip::regs;

    fn file_config(dir: &tempfile::TempDir) -> DriverConfig {
        // one sparse file covering all three windows at small offsets
        let path = dir.path().join("mem");
        let f = std::fs::File::create(&path).unwrap();
        f.set_len(0x5000).unwrap();
        let mut config = DriverConfig::default();
        config.mem_device = path;
        config.address_map.map_input = 0x0000;
        config.address_map.dir_output = 0x1000;
        config.address_map.control = 0x4000;
        config
    }

    #[test]
    fn windows_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let mut bus = MappedBus::open(&file_config(&dir)).unwrap();
        bus.write_u32(Window::MapInput, 0, 1).unwrap();
        bus.write_u32(Window::DirOutput, 0, 2).unwrap();
        bus.write_u32(Window::Control, regs::RUN_CYCLES, 3).unwrap();
        assert_eq!(bus.read_u32(Window::MapInput, 0).unwrap(), 1);
        assert_eq!(bus.read_u32(Window::DirOutput, 0).unwrap(), 2);
        assert_eq!(bus.read_u32(Window::Control, 0).unwrap(), 0);
        assert_eq!(bus.read_u32(Window::Control, regs::RUN_CYCLES).unwrap(), 3);
    }

    #[test]
    fn block_transfers_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut bus = MappedBus::open(&file_config(&dir)).unwrap();
        let words = [0x1111_1111, 0x2222_2222, 0x3333_3333];
        bus.write_words(Window::MapInput, 8, &words).unwrap();
        let mut back = [0; 3];
        bus.read_words(Window::MapInput, 8, &mut back).unwrap();
        assert_eq!(back, words);
    }

    #[test]
    fn block_past_window_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut bus = MappedBus::open(&file_config(&dir)).unwrap();
        let err = bus
            .write_words(Window::DirOutput, REGION_SIZE - 4, &[0, 0])
            .unwrap_err();
        assert!(matches!(err, DkstrError::TransferFailed { .. }));
    }

    #[test]
    fn missing_device_is_unavailable() {
        let mut config = DriverConfig::default();
        config.mem_device = "/nonexistent/dkstr-mem".into();
        let err = MappedBus::open(&config).unwrap_err();
        assert!(matches!(err, DkstrError::HardwareUnavailable { .. }));
    }
}
