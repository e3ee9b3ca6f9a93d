//! Physical address map of the accelerator on the Zynq AXI bus.
//!
//! ```text
//! Region      Address       Size   Purpose
//! ─────────── ───────────── ────── ──────────────────────────────────────
//! map BRAM    0x4000_0000   4 KiB  packed cost nibbles, written by the host
//! dir BRAM    0x4000_1000   4 KiB  packed direction nibbles, read by the host
//! control     0x4000_4000   4 KiB  control word + three cycle counters
//! ```
//!
//! The addresses are a property of the bitstream's block design, not of the
//! protocol; deployments override them through the driver configuration.

/// Size of every mapped window in bytes (one page).
pub const REGION_SIZE: usize = 0x1000;

/// Number of 32-bit words in one window.
pub const REGION_WORDS: usize = REGION_SIZE / 4;

/// Map-input BRAM.
pub mod map_bram {
    /// Typical physical address.
    pub const TYPICAL_ADDR: u64 = 0x4000_0000;
}

/// Direction-output BRAM (the page directly after the map BRAM).
pub mod dir_bram {
    /// Typical physical address.
    pub const TYPICAL_ADDR: u64 = 0x4000_1000;
}

/// Control/status register block.
pub mod control {
    /// Typical physical address.
    pub const TYPICAL_ADDR: u64 = 0x4000_4000;
}

/// Widest/tallest grid the fabric can address with a 5-bit coordinate.
pub const MAX_GRID_SIDE: usize = 32;

/// Window selector used by register buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    /// Map-input BRAM.
    MapInput,
    /// Direction-output BRAM.
    DirOutput,
    /// Control/status block.
    Control,
}

impl Window {
    /// All three windows, in address order.
    pub const ALL: [Self; 3] = [Self::MapInput, Self::DirOutput, Self::Control];

    /// Typical physical base of this window.
    #[must_use]
    pub const fn typical_addr(self) -> u64 {
        match self {
            Self::MapInput => map_bram::TYPICAL_ADDR,
            Self::DirOutput => dir_bram::TYPICAL_ADDR,
            Self::Control => control::TYPICAL_ADDR,
        }
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MapInput => write!(f, "map BRAM"),
            Self::DirOutput => write!(f, "dir BRAM"),
            Self::Control => write!(f, "control"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_are_page_aligned_and_disjoint() {
        for w in Window::ALL {
            assert_eq!(w.typical_addr() % REGION_SIZE as u64, 0, "{w} not page aligned");
        }
        assert_eq!(
            dir_bram::TYPICAL_ADDR,
            map_bram::TYPICAL_ADDR + REGION_SIZE as u64
        );
        assert!(control::TYPICAL_ADDR >= dir_bram::TYPICAL_ADDR + REGION_SIZE as u64);
    }

    #[test]
    fn largest_grid_fits_one_window() {
        let cells = MAX_GRID_SIDE * MAX_GRID_SIDE;
        assert!(cells.div_ceil(8) <= REGION_WORDS);
    }
}
