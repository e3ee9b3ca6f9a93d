//! Per-invocation scratch graph
//!
//! One packed 32-bit [`Node`] per cell:
//!
//! ```text
//!  31   30   29 28  27 26  25                     0
//! ┌───┬────┬──────┬──────┬────────────────────────┐
//! │ Q │ F  │  dy  │  dx  │ cost (half units)      │
//! └───┴────┴──────┴──────┴────────────────────────┘
//!  Q = enqueued, F = finalized, dx/dy = 2-bit two's complement
//! ```

use crate::field::DirectionField;
use dkstr_chip::Compass;
use dkstr_maps::Coord;
use std::fmt;

const COST_BITS: u32 = 26;
const DX_SHIFT: u32 = 26;
const DY_SHIFT: u32 = 28;
const STEP_MASK: u32 = 0b11;
const FINALIZED: u32 = 1 << 30;
const ENQUEUED: u32 = 1 << 31;

/// Scratch record for one cell.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Node(u32);

impl Node {
    /// Largest representable cost; also the "not reached yet" value.
    pub const COST_MAX: u32 = (1 << COST_BITS) - 1;

    /// Initial state: cost max, no direction, flags clear.
    pub const UNREACHED: Self = Self(Self::COST_MAX);

    /// Accumulated cost in half units
    #[must_use]
    pub const fn cost(self) -> u32 {
        self.0 & Self::COST_MAX
    }

    /// Set the accumulated cost.
    ///
    /// # Panics
    ///
    /// Debug builds panic if `cost` does not fit in 26 bits.
    pub fn set_cost(&mut self, cost: u32) {
        debug_assert!(cost <= Self::COST_MAX, "cost {cost:#x} overflows node");
        self.0 = (self.0 & !Self::COST_MAX) | (cost & Self::COST_MAX);
    }

    /// Step toward the predecessor; (0, 0) means none.
    #[must_use]
    pub const fn direction(self) -> (i8, i8) {
        (
            sign_extend((self.0 >> DX_SHIFT) & STEP_MASK),
            sign_extend((self.0 >> DY_SHIFT) & STEP_MASK),
        )
    }

    /// Record the step toward the predecessor. Components must be in {-1, 0, 1}.
    pub fn set_direction(&mut self, dx: i8, dy: i8) {
        debug_assert!((-1..=1).contains(&dx) && (-1..=1).contains(&dy));
        let fields = (STEP_MASK << DX_SHIFT) | (STEP_MASK << DY_SHIFT);
        self.0 = (self.0 & !fields)
            | ((truncate(dx) & STEP_MASK) << DX_SHIFT)
            | ((truncate(dy) & STEP_MASK) << DY_SHIFT);
    }

    /// Predecessor as a compass direction
    #[must_use]
    pub fn compass(self) -> Option<Compass> {
        let (dx, dy) = self.direction();
        Compass::from_delta(dx, dy)
    }

    /// True once the node has been fully processed
    #[must_use]
    pub const fn is_finalized(self) -> bool {
        self.0 & FINALIZED != 0
    }

    /// Set or clear the finalized flag
    pub fn set_finalized(&mut self, on: bool) {
        self.set_flag(FINALIZED, on);
    }

    /// True while the node sits in the frontier queue
    #[must_use]
    pub const fn is_enqueued(self) -> bool {
        self.0 & ENQUEUED != 0
    }

    /// Set or clear the enqueued flag
    pub fn set_enqueued(&mut self, on: bool) {
        self.set_flag(ENQUEUED, on);
    }

    /// True if some path has reached the node
    #[must_use]
    pub const fn is_reached(self) -> bool {
        self.cost() < Self::COST_MAX
    }

    /// Raw 32-bit word
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    fn set_flag(&mut self, flag: u32, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::UNREACHED
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("cost", &self.cost())
            .field("direction", &self.direction())
            .field("finalized", &self.is_finalized())
            .field("enqueued", &self.is_enqueued())
            .finish()
    }
}

#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
const fn sign_extend(bits: u32) -> i8 {
    ((bits << 30) as i32 >> 30) as i8
}

#[allow(clippy::cast_sign_loss)]
const fn truncate(v: i8) -> u32 {
    v as u8 as u32
}

/// Scratch graph owned by one pathfinding invocation, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchGraph {
    width: usize,
    height: usize,
    nodes: Vec<Node>,
}

impl ScratchGraph {
    /// Graph with every node [`Node::UNREACHED`].
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            nodes: vec![Node::UNREACHED; width * height],
        }
    }

    /// Number of columns
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Node at `c`.
    ///
    /// # Panics
    ///
    /// Panics if `c` is outside the graph.
    pub fn node(&self, c: Coord) -> Node {
        self.nodes[self.index(c)]
    }

    /// Mutable node at `c`.
    ///
    /// # Panics
    ///
    /// Panics if `c` is outside the graph.
    pub fn node_mut(&mut self, c: Coord) -> &mut Node {
        let i = self.index(c);
        &mut self.nodes[i]
    }

    /// Accumulated cost at `c`, `None` if unreached.
    pub fn cost(&self, c: Coord) -> Option<u32> {
        let n = self.node(c);
        n.is_reached().then_some(n.cost())
    }

    /// All nodes, row-major
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mark every reached node finalized.
    pub fn finalize_reached(&mut self) {
        for n in self.nodes.iter_mut().filter(|n| n.is_reached()) {
            n.set_finalized(true);
        }
    }

    fn index(&self, c: Coord) -> usize {
        assert!(
            c.x < self.width && c.y < self.height,
            "{c} outside {}x{} graph",
            self.width,
            self.height
        );
        c.index(self.width)
    }
}

impl DirectionField for ScratchGraph {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn predecessor(&self, c: Coord) -> Option<Compass> {
        self.node(c).compass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_is_one_word() {
        assert_eq!(std::mem::size_of::<Node>(), 4);
    }

    #[test]
    fn unreached_node_defaults() {
        let n = Node::UNREACHED;
        assert_eq!(n.cost(), 0x3FF_FFFF);
        assert_eq!(n.direction(), (0, 0));
        assert!(!n.is_reached());
        assert!(!n.is_finalized());
        assert!(!n.is_enqueued());
    }

    #[test]
    fn fields_do_not_overlap() {
        let mut n = Node::UNREACHED;
        n.set_cost(12345);
        n.set_direction(-1, 1);
        n.set_enqueued(true);
        n.set_finalized(true);
        assert_eq!(n.cost(), 12345);
        assert_eq!(n.direction(), (-1, 1));
        assert!(n.is_enqueued() && n.is_finalized());

        n.set_direction(1, -1);
        n.set_enqueued(false);
        assert_eq!(n.cost(), 12345);
        assert_eq!(n.direction(), (1, -1));
        assert!(!n.is_enqueued() && n.is_finalized());
    }

    #[test]
    fn every_step_round_trips() {
        for dx in -1..=1 {
            for dy in -1..=1 {
                let mut n = Node::UNREACHED;
                n.set_direction(dx, dy);
                assert_eq!(n.direction(), (dx, dy));
            }
        }
    }

    #[test]
    fn compass_of_recorded_step() {
        let mut n = Node::UNREACHED;
        assert_eq!(n.compass(), None);
        n.set_direction(-1, -1);
        assert_eq!(n.compass(), Some(Compass::NorthWest));
    }

    #[test]
    fn graph_cost_reports_reached_only() {
        let mut g = ScratchGraph::new(2, 2);
        g.node_mut(Coord::new(1, 1)).set_cost(6);
        assert_eq!(g.cost(Coord::new(1, 1)), Some(6));
        assert_eq!(g.cost(Coord::new(0, 1)), None);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn graph_rejects_out_of_bounds() {
        let g = ScratchGraph::new(2, 2);
        let _ = g.node(Coord::new(2, 0));
    }
}
