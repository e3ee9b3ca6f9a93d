//! Software pathfinders
//!
//! Two relaxation strategies over the same [`ScratchGraph`]:
//!
//! - [`incremental`]: FIFO label-correcting relaxation, touches only the
//!   frontier. The fast CPU baseline.
//! - [`synchronous`]: raster sweeps over the whole grid until nothing changes.
//!   Mirrors what the accelerator's PE array does in lock-step and is the
//!   reference the emulator runs.
//!
//! Step costs are in half units: 2 for an axis move, 3 for a diagonal, plus
//! twice the terrain cost of the cell being entered.

pub mod incremental;
mod queue;
pub mod synchronous;

use crate::backend::{check_query, BackendType, PathBackend, Solution};
use crate::error::{DkstrError, Result};
use crate::graph::{Node, ScratchGraph};
use crate::path::reconstruct;
use crate::profile::{ProfileSample, Stage};
use dkstr_maps::{Coord, Grid};
use tracing::debug;

/// Neighbour offsets with their base step cost, scanned in this order:
/// NW, N, NE, E, SE, S, SW, W.
pub(crate) const NEIGHBOURS: [(i8, i8, u32); 8] = [
    (-1, -1, 3),
    (0, -1, 2),
    (1, -1, 3),
    (1, 0, 2),
    (1, 1, 3),
    (0, 1, 2),
    (-1, 1, 3),
    (-1, 0, 2),
];

/// `base + step + 2 * terrain`, the cost of entering `at` from a neighbour.
///
/// Fails once the sum no longer fits below [`Node::COST_MAX`], which doubles
/// as the "unreached" marker.
pub(crate) fn entry_cost(base: u32, step: u32, terrain: u32, at: Coord) -> Result<u32> {
    terrain
        .checked_mul(2)
        .and_then(|t| t.checked_add(step))
        .and_then(|t| t.checked_add(base))
        .filter(|&c| c < Node::COST_MAX)
        .ok_or_else(|| DkstrError::cost_overflow(at))
}

/// Work counters for one relaxation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelaxStats {
    /// Queue pops (incremental) or sweeps (synchronous)
    pub iterations: usize,
    /// Cost improvements written
    pub updates: usize,
}

/// CPU backend running [`incremental::relax`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementalBackend;

/// CPU backend running [`synchronous::relax`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SynchronousBackend;

impl PathBackend for IncrementalBackend {
    fn find(&mut self, grid: &Grid, start: Coord, end: Coord) -> Result<Solution> {
        solve(grid, start, end, incremental::relax)
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Incremental
    }
}

impl PathBackend for SynchronousBackend {
    fn find(&mut self, grid: &Grid, start: Coord, end: Coord) -> Result<Solution> {
        solve(grid, start, end, synchronous::relax)
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Synchronous
    }
}

fn solve(
    grid: &Grid,
    start: Coord,
    end: Coord,
    relax: fn(&Grid, &mut ScratchGraph, Coord) -> Result<RelaxStats>,
) -> Result<Solution> {
    check_query(grid, start, end)?;
    let mut profile = ProfileSample::default();

    let mut graph = profile.time(Stage::PreProcess, || {
        ScratchGraph::new(grid.width(), grid.height())
    });
    let stats = profile.time(Stage::Execute, || relax(grid, &mut graph, start))?;
    let route = profile.time(Stage::PostProcess, || reconstruct(&graph, start, end))?;

    debug!(
        "Relaxed {}x{} grid: {} iterations, {} updates, end cost {:?}",
        grid.width(),
        grid.height(),
        stats.iterations,
        stats.updates,
        graph.cost(end)
    );

    Ok(Solution {
        route,
        profile,
        cycles: None,
    })
}

/// Same terrain on every cell, for costs no map symbol can express.
#[cfg(test)]
pub(crate) struct UniformField {
    pub width: usize,
    pub height: usize,
    pub terrain: u32,
}

#[cfg(test)]
impl crate::field::CostField for UniformField {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn terrain(&self, _c: Coord) -> Option<u32> {
        Some(self.terrain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_cost_adds_doubled_terrain() {
        assert_eq!(entry_cost(10, 3, 4, Coord::new(0, 0)).unwrap(), 21);
    }

    #[test]
    fn entry_cost_stops_below_unreached_marker() {
        let at = Coord::new(1, 2);
        assert_eq!(entry_cost(Node::COST_MAX - 3, 2, 0, at).unwrap(), Node::COST_MAX - 1);
        let err = entry_cost(Node::COST_MAX - 2, 2, 0, at).unwrap_err();
        assert!(matches!(err, DkstrError::CostOverflow { at: c, .. } if c == at));
        assert!(entry_cost(0, 2, u32::MAX, at).is_err());
    }
}
