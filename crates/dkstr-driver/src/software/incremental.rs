//! Queue-driven label-correcting relaxation
//!
//! Nodes enter a FIFO when first reached or when their cost improves after
//! they were finalized. A finalized node can be re-opened, so the result is
//! exact even though the queue is not cost-ordered.

use super::queue::FrontierQueue;
use super::{entry_cost, RelaxStats, NEIGHBOURS};
use crate::error::{DkstrError, Result};
use crate::field::CostField;
use crate::graph::ScratchGraph;
use dkstr_maps::Coord;
use tracing::trace;

/// Relax `graph` from `start` until the frontier drains.
///
/// `graph` must be fresh (every node unreached) and sized like `field`.
///
/// # Errors
///
/// Returns [`DkstrError::OutOfBounds`] if `start` lies outside the field,
/// [`DkstrError::QueueOverflow`] if the frontier outgrows `width × height`, or
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

    let mut stats = RelaxStats::default();
    let mut queue = FrontierQueue::with_capacity(w * h);

    let origin = graph.node_mut(start);
    origin.set_cost(0);
    origin.set_enqueued(true);
    queue.push(start)?;

    while let Some(curr) = queue.pop() {
        stats.iterations += 1;
        graph.node_mut(curr).set_enqueued(false);
        let base = graph.node(curr).cost();

        for &(dx, dy, step) in &NEIGHBOURS {
            let Some(next) = curr.step(dx, dy, w, h) else {
                continue;
            };
            let Some(terrain) = field.terrain(next) else {
                continue;
            };

            let candidate = entry_cost(base, step, terrain, next)?;
            let node = graph.node_mut(next);
            if candidate < node.cost() {
                node.set_cost(candidate);
                node.set_direction(-dx, -dy);
                node.set_finalized(false);
                stats.updates += 1;
                trace!("{next} <- {curr}: {candidate}");
            }
            if !node.is_finalized() && !node.is_enqueued() {
                node.set_enqueued(true);
                queue.push(next)?;
            }
        }

        graph.node_mut(curr).set_finalized(true);
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;
    use crate::software::UniformField;
    use dkstr_maps::Grid;

    fn run(rows: &[&str], start: Coord) -> ScratchGraph {
        let grid = Grid::from_rows(rows).unwrap();
        let mut graph = ScratchGraph::new(grid.width(), grid.height());
        relax(&grid, &mut graph, start).unwrap();
        graph
    }

    #[test]
    fn open_field_costs() {
        let g = run(&["000", "000", "000"], Coord::new(0, 0));
        assert_eq!(g.cost(Coord::new(0, 0)), Some(0));
        assert_eq!(g.cost(Coord::new(1, 0)), Some(2));
        assert_eq!(g.cost(Coord::new(1, 1)), Some(3));
        assert_eq!(g.cost(Coord::new(2, 2)), Some(6));
        assert_eq!(g.cost(Coord::new(2, 1)), Some(5));
    }

    #[test]
    fn directions_point_back_toward_start() {
        let g = run(&["000", "000", "000"], Coord::new(0, 0));
        assert_eq!(g.node(Coord::new(2, 2)).direction(), (-1, -1));
        assert_eq!(g.node(Coord::new(2, 0)).direction(), (-1, 0));
        assert_eq!(g.node(Coord::new(0, 0)).direction(), (0, 0));
    }

    #[test]
    fn terrain_is_charged_twice() {
        // entering the '3' costs 2 + 2*3
        let g = run(&["03"], Coord::new(0, 0));
        assert_eq!(g.cost(Coord::new(1, 0)), Some(8));
    }

    #[test]
    fn detours_around_expensive_cells() {
        let g = run(&["0e0", "000"], Coord::new(0, 0));
        // straight through 'e' would be 2 + 28 + 2; around is 3 + 3
        assert_eq!(g.cost(Coord::new(2, 0)), Some(6));
    }

    #[test]
    fn walls_stay_unreached() {
        let g = run(&["0#0"], Coord::new(0, 0));
        assert_eq!(g.cost(Coord::new(1, 0)), None);
        assert_eq!(g.cost(Coord::new(2, 0)), None);
        assert_eq!(g.node(Coord::new(1, 0)).direction(), (0, 0));
    }

    #[test]
    fn every_reached_node_is_finalized_and_dequeued() {
        let g = run(&["0010", "0#00", "0a0#"], Coord::new(3, 0));
        for n in g.nodes().iter().filter(|n| n.is_reached()) {
            assert!(n.is_finalized());
            assert!(!n.is_enqueued());
        }
    }

    #[test]
    fn cost_past_node_range_is_an_error() {
        // entering (1, 0) fits, entering (2, 0) from there does not
        let field = UniformField {
            width: 3,
            height: 1,
            terrain: Node::COST_MAX / 3,
        };
        let mut graph = ScratchGraph::new(3, 1);
        let err = relax(&field, &mut graph, Coord::new(0, 0)).unwrap_err();
        assert!(matches!(err, DkstrError::CostOverflow { at, .. } if at == Coord::new(2, 0)));
    }

    #[test]
    fn start_outside_is_rejected() {
        let grid = Grid::from_rows(&["00"]).unwrap();
        let mut graph = ScratchGraph::new(2, 1);
        let err = relax(&grid, &mut graph, Coord::new(2, 0)).unwrap_err();
        assert!(matches!(err, DkstrError::OutOfBounds { .. }));
    }
}
