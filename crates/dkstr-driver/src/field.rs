//! Read-only views the relaxation and reconstruction code run over.
//!
//! Relaxation only needs per-cell terrain, and reconstruction only needs
//! per-cell predecessor directions, so both are written against these traits.
//! That lets the accelerator emulator relax straight out of packed cost
//! nibbles, and lets the reconstructor walk a scratch graph or a raw
//! direction buffer alike.

use dkstr_chip::Compass;
use dkstr_maps::{Coord, Grid};

/// Per-cell traversal cost over a rectangular area.
pub trait CostField {
    /// Number of columns
    fn width(&self) -> usize;

    /// Number of rows
    fn height(&self) -> usize;

    /// Cost of entering `c`, `None` if impassable. `c` must be in bounds.
    fn terrain(&self, c: Coord) -> Option<u32>;

    /// True if `c` lies inside the field
    fn contains(&self, c: Coord) -> bool {
        c.x < self.width() && c.y < self.height()
    }
}

impl CostField for Grid {
    fn width(&self) -> usize {
        Grid::width(self)
    }

    fn height(&self) -> usize {
        Grid::height(self)
    }

    fn terrain(&self, c: Coord) -> Option<u32> {
        Grid::terrain(self, c)
    }
}

/// Per-cell predecessor direction over a rectangular area.
pub trait DirectionField {
    /// Number of columns
    fn width(&self) -> usize;

    /// Number of rows
    fn height(&self) -> usize;

    /// Direction from `c` toward the cell it was reached from; `None` if no
    /// predecessor was recorded. `c` must be in bounds.
    fn predecessor(&self, c: Coord) -> Option<Compass>;
}
