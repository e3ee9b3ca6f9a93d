//! Seeded random maps for profiling runs.
//!
//! Cell distribution (out of 240):
//!
//! | Share | Terrain |
//! |-------|---------|
//! | 96 (40 %) | cost 0 |
//! | 48 (20 %) | cost 1 |
//! | 72 (30 %) | obstruction |
//! | 24 (10 %) | uniform cost 2–14 |
//!
//! Maps are not guaranteed to be connected; a query between two cells in
//! different regions reports "no path", which the profiling harness counts like
//! any other query.

use crate::cost::symbol_for;
use crate::coord::Coord;
use crate::error::Result;
use crate::grid::Grid;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Side length of the maps the profiler generates by default.
pub const PROFILE_SIDE: usize = 28;

const WEIGHT_SUM: u32 = 240;
const ZERO_SHARE: u32 = 96;
const ONE_SHARE: u32 = 48;
const WALL_SHARE: u32 = 72;

/// Deterministic map and coordinate source.
#[derive(Debug, Clone)]
pub struct MapGenerator {
    rng: StdRng,
}

impl MapGenerator {
    /// Generator seeded with `seed`; equal seeds produce equal sequences.
    pub fn new(seed: u64) -> Self {
        debug!("Map generator seeded with {seed}");
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Random `width`×`height` map.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero.
    pub fn grid(&mut self, width: usize, height: usize) -> Result<Grid> {
        let costs: Vec<Option<u32>> = (0..width * height).map(|_| self.terrain()).collect();
        let cells = costs.into_iter().map(symbol_for).collect();
        Grid::new(width, height, cells)
    }

    /// Uniform coordinate inside a `width`×`height` grid.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn coord(&mut self, width: usize, height: usize) -> Coord {
        Coord::new(self.rng.gen_range(0..width), self.rng.gen_range(0..height))
    }

    /// Uniform passable coordinate, or `None` if the grid has no passable cell.
    pub fn open_coord(&mut self, grid: &Grid) -> Option<Coord> {
        let open: Vec<Coord> = grid.coords().filter(|&c| grid.is_passable(c)).collect();
        if open.is_empty() {
            return None;
        }
        Some(open[self.rng.gen_range(0..open.len())])
    }

    fn terrain(&mut self) -> Option<u32> {
        let roll = self.rng.gen_range(0..WEIGHT_SUM);
        if roll < ZERO_SHARE {
            Some(0)
        } else if roll < ZERO_SHARE + ONE_SHARE {
            Some(1)
        } else if roll < ZERO_SHARE + ONE_SHARE + WALL_SHARE {
            None
        } else {
            Some(self.rng.gen_range(2..=14))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_map() {
        let a = MapGenerator::new(42).grid(16, 16).unwrap();
        let b = MapGenerator::new(42).grid(16, 16).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seed_different_map() {
        let a = MapGenerator::new(1).grid(16, 16).unwrap();
        let b = MapGenerator::new(2).grid(16, 16).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn distribution_is_roughly_weighted() {
        let g = MapGenerator::new(7).grid(100, 100).unwrap();
        let walls = g.coords().filter(|&c| !g.is_passable(c)).count();
        let zeros = g.coords().filter(|&c| g.terrain(c) == Some(0)).count();
        // 30 % and 40 % of 10_000 cells, generous tolerance
        assert!((2500..3500).contains(&walls), "walls = {walls}");
        assert!((3500..4500).contains(&zeros), "zeros = {zeros}");
    }

    #[test]
    fn open_coord_is_passable() {
        let mut gen = MapGenerator::new(3);
        let g = gen.grid(PROFILE_SIDE, PROFILE_SIDE).unwrap();
        for _ in 0..50 {
            let c = gen.open_coord(&g).unwrap();
            assert!(g.is_passable(c));
        }
    }

    #[test]
    fn open_coord_none_on_solid_map() {
        let g = Grid::filled(3, 3, b'#').unwrap();
        assert_eq!(MapGenerator::new(0).open_coord(&g), None);
    }
}
