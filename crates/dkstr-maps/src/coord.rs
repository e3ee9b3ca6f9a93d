//! Grid coordinates

use std::fmt;

/// Cell coordinate, 0-indexed: x is the column, y the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Coord {
    /// Column
    pub x: usize,
    /// Row
    pub y: usize,
}

impl Coord {
    /// Create a coordinate
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Neighbour one unit step away, or `None` if it leaves a `width`×`height`
    /// grid.
    pub fn step(self, dx: i8, dy: i8, width: usize, height: usize) -> Option<Self> {
        let x = self.x.checked_add_signed(isize::from(dx))?;
        let y = self.y.checked_add_signed(isize::from(dy))?;
        (x < width && y < height).then_some(Self { x, y })
    }

    /// Row-major index in a grid of the given width
    pub const fn index(self, width: usize) -> usize {
        self.x + self.y * width
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(usize, usize)> for Coord {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}
