//! Rectangular terrain grid

use crate::cost;
use crate::coord::Coord;
use crate::error::{MapError, Result};
use std::fmt;

/// A rectangular map of terrain symbols, stored row-major
/// (`index = x + y * width`). Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl Grid {
    /// Build a grid from a row-major symbol buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero, the buffer length is not
    /// `width * height`, or a symbol lies outside the 7-bit cost table.
    pub fn new(width: usize, height: usize, cells: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MapError::invalid_dimensions(
                width,
                height,
                "dimensions must be non-zero",
            ));
        }
        if cells.len() != width * height {
            return Err(MapError::invalid_dimensions(
                width,
                height,
                format!("buffer holds {} cells, expected {}", cells.len(), width * height),
            ));
        }
        if let Some(i) = cells.iter().position(|&s| !s.is_ascii()) {
            return Err(MapError::InvalidSymbol {
                symbol: cells[i],
                x: i % width,
                y: i / width,
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Grid with every cell set to `symbol`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Grid::new`].
    pub fn filled(width: usize, height: usize, symbol: u8) -> Result<Self> {
        Self::new(width, height, vec![symbol; width * height])
    }

    /// Grid from equal-length text rows.
    ///
    /// # Errors
    ///
    /// Returns an error on ragged rows or an empty row list.
    pub fn from_rows(rows: &[&str]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(MapError::parse_error(
                    y + 1,
                    format!("row has {} symbols, expected {width}", row.len()),
                ));
            }
            cells.extend_from_slice(row.as_bytes());
        }
        Self::new(width, height, cells)
    }

    /// Grid from per-cell costs (`None` = impassable), row-major.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Grid::new`].
    ///
    /// # Panics
    ///
    /// Panics if a cost exceeds [`cost::MAX_COST`].
    pub fn from_costs(width: usize, height: usize, costs: &[Option<u32>]) -> Result<Self> {
        let cells = costs.iter().map(|&c| cost::symbol_for(c)).collect();
        Self::new(width, height, cells)
    }

    /// Number of columns
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false: a grid has at least one cell.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True if `c` lies inside the grid
    pub const fn contains(&self, c: Coord) -> bool {
        c.x < self.width && c.y < self.height
    }

    /// Terrain symbol at `c`.
    ///
    /// # Panics
    ///
    /// Panics if `c` is outside the grid.
    pub fn symbol(&self, c: Coord) -> u8 {
        assert!(self.contains(c), "{c} outside {}x{} grid", self.width, self.height);
        self.cells[c.index(self.width)]
    }

    /// Range-checked traversal cost at `c`; `None` if impassable.
    pub fn terrain(&self, c: Coord) -> Option<u32> {
        cost::terrain(self.symbol(c))
    }

    /// True if `c` can be entered
    pub fn is_passable(&self, c: Coord) -> bool {
        self.terrain(c).is_some()
    }

    /// Row-major symbol buffer
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// One row of symbols
    pub fn row(&self, y: usize) -> &[u8] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    /// All coordinates in row-major order
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Coord::new(x, y)))
    }
}

/// Renders the map text format (header line + one line per row).
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.height, self.width)?;
        for y in 0..self.height {
            writeln!(f, "{}", String::from_utf8_lossy(self.row(y)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        assert!(Grid::new(0, 3, vec![]).is_err());
        assert!(Grid::new(3, 0, vec![]).is_err());
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let err = Grid::new(2, 2, vec![b'0'; 3]).unwrap_err();
        assert!(matches!(err, MapError::InvalidDimensions { .. }));
    }

    #[test]
    fn rejects_high_bytes() {
        let err = Grid::new(2, 1, vec![b'0', 0xC3]).unwrap_err();
        assert!(matches!(err, MapError::InvalidSymbol { x: 1, y: 0, .. }));
    }

    #[test]
    fn row_major_access() {
        let g = Grid::from_rows(&["012", "#ab"]).unwrap();
        assert_eq!((g.width(), g.height()), (3, 2));
        assert_eq!(g.terrain(Coord::new(2, 0)), Some(2));
        assert_eq!(g.terrain(Coord::new(0, 1)), None);
        assert_eq!(g.terrain(Coord::new(2, 1)), Some(11));
        assert_eq!(g.row(1), b"#ab");
    }

    #[test]
    fn ragged_rows_fail() {
        assert!(Grid::from_rows(&["000", "00"]).is_err());
    }

    #[test]
    fn from_costs_round_trips_terrain() {
        let g = Grid::from_costs(3, 1, &[Some(0), None, Some(14)]).unwrap();
        assert_eq!(g.terrain(Coord::new(0, 0)), Some(0));
        assert!(!g.is_passable(Coord::new(1, 0)));
        assert_eq!(g.terrain(Coord::new(2, 0)), Some(14));
    }

    #[test]
    fn display_is_map_text() {
        let g = Grid::from_rows(&["0#", "12"]).unwrap();
        assert_eq!(g.to_string(), "2 2\n0#\n12\n");
    }

    #[test]
    fn coords_are_row_major() {
        let g = Grid::filled(2, 2, b'0').unwrap();
        let cs: Vec<_> = g.coords().collect();
        assert_eq!(
            cs,
            vec![Coord::new(0, 0), Coord::new(1, 0), Coord::new(0, 1), Coord::new(1, 1)]
        );
    }
}
