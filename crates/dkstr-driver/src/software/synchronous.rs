//! Whole-grid sweep relaxation
//!
//! Every passable cell pulls from its cheapest neighbour, raster order,
//! until a sweep changes nothing (or `width × height` sweeps have run).
//! This is the behaviour the accelerator implements in hardware, and the
//! emulator calls straight into it.

use super::{entry_cost, RelaxStats, NEIGHBOURS};
use crate::error::{DkstrError, Result};
use crate::field::CostField;
use crate::graph::{Node, ScratchGraph};
use dkstr_maps::Coord;
use tracing::trace;

/// Relax `graph` from `start` to convergence, then finalize every reached
/// node.
///
/// `graph` must be fresh (every node unreached) and sized like `field`.
///
/// # Errors
///
/// Returns [`DkstrError::OutOfBounds`] if `start` lies outside the field, or
/// [`DkstrError::CostOverflow`] if a path cost no longer fits a node.
pub fn relax<F: CostField + ?Sized>(
    field: &F,
    graph: &mut ScratchGraph,
    start: Coord,
) -> Result<RelaxStats> {
    let (w, h) = (field.width(), field.height());
    if !field.contains(start) {
        return Err(DkstrError::out_of_bounds(start, w, h));
    }

    graph.node_mut(start).set_cost(0);

    let limit = w * h;
    let mut stats = RelaxStats::default();
    loop {
        stats.iterations += 1;
        let changed = sweep(field, graph)?;
        stats.updates += changed;
        trace!("Sweep {}: {changed} updates", stats.iterations);
        if changed == 0 || stats.iterations >= limit {
            break;
        }
    }

    graph.finalize_reached();
    Ok(stats)
}

/// One raster pass; returns how many cells improved.
///
/// A converged graph is a fixed point: sweeping it again returns 0.
///
/// # Errors
///
/// Returns [`DkstrError::CostOverflow`] if a path cost no longer fits a node.
pub fn sweep<F: CostField + ?Sized>(field: &F, graph: &mut ScratchGraph) -> Result<usize> {
    let (w, h) = (field.width(), field.height());
    let mut changed = 0;

    for y in 0..h {
        for x in 0..w {
            let curr = Coord::new(x, y);
            let Some(terrain) = field.terrain(curr) else {
                continue;
            };
            for &(dx, dy, step) in &NEIGHBOURS {
                let Some(prev) = curr.step(dx, dy, w, h) else {
                    continue;
                };
                let from = graph.node(prev).cost();
                if from == Node::COST_MAX {
                    continue;
                }
                let candidate = entry_cost(from, step, terrain, curr)?;
                let node = graph.node_mut(curr);
                if candidate < node.cost() {
                    node.set_cost(candidate);
                    node.set_direction(dx, dy);
                    changed += 1;
                }
            }
        }
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::software::{incremental, UniformField};
    use dkstr_maps::{Grid, MapGenerator};

    fn run(grid: &Grid, start: Coord) -> (ScratchGraph, RelaxStats) {
        let mut graph = ScratchGraph::new(grid.width(), grid.height());
        let stats = relax(grid, &mut graph, start).unwrap();
        (graph, stats)
    }

    #[test]
    fn open_field_costs() {
        let grid = Grid::filled(3, 3, b'0').unwrap();
        let (g, _) = run(&grid, Coord::new(0, 0));
        assert_eq!(g.cost(Coord::new(2, 2)), Some(6));
        assert_eq!(g.node(Coord::new(2, 2)).direction(), (-1, -1));
    }

    #[test]
    fn converged_graph_is_a_fixed_point() {
        let grid = MapGenerator::new(11).grid(12, 12).unwrap();
        let (mut g, _) = run(&grid, Coord::new(5, 5));
        let before = g.clone();
        assert_eq!(sweep(&grid, &mut g).unwrap(), 0);
        assert_eq!(g, before);
    }

    #[test]
    fn reached_nodes_are_finalized() {
        let grid = Grid::from_rows(&["000", "###", "000"]).unwrap();
        let (g, _) = run(&grid, Coord::new(0, 0));
        for y in 0..3 {
            for x in 0..3 {
                let n = g.node(Coord::new(x, y));
                assert_eq!(n.is_finalized(), y == 0, "({x}, {y})");
            }
        }
    }

    #[test]
    fn cost_past_node_range_is_an_error() {
        let field = UniformField {
            width: 3,
            height: 1,
            terrain: Node::COST_MAX / 3,
        };
        let mut graph = ScratchGraph::new(3, 1);
        let err = relax(&field, &mut graph, Coord::new(0, 0)).unwrap_err();
        assert!(matches!(err, DkstrError::CostOverflow { at, .. } if at == Coord::new(2, 0)));
        assert!(!graph.node(Coord::new(2, 0)).is_reached());
    }

    #[test]
    fn sweep_count_is_bounded() {
        let grid = Grid::filled(4, 4, b'0').unwrap();
        let (_, stats) = run(&grid, Coord::new(3, 3));
        assert!(stats.iterations <= 16);
        assert!(stats.iterations >= 2);
    }

    #[test]
    fn costs_match_incremental_on_random_maps() {
        for seed in 0..8 {
            let grid = MapGenerator::new(seed).grid(16, 16).unwrap();
            let start = Coord::new(3, 7);
            let (sync, _) = run(&grid, start);
            let mut inc = ScratchGraph::new(16, 16);
            incremental::relax(&grid, &mut inc, start).unwrap();
            for c in grid.coords() {
                assert_eq!(sync.cost(c), inc.cost(c), "seed {seed} at {c}");
            }
        }
    }
}
