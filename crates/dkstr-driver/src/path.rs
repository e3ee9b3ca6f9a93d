//! Path reconstruction and replay
//!
//! Reconstruction walks predecessor directions from the destination back to
//! the source, merging identical consecutive steps into runs. The resulting
//! [`Path`] is a stack: the first forward move sits on top.

use crate::error::{DkstrError, Result};
use crate::field::{CostField, DirectionField};
use dkstr_chip::Compass;
use dkstr_maps::Coord;
use std::fmt;
use std::ops::{Add, AddAssign};

/// `count` repeated unit steps in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    /// x step, in {-1, 0, 1}
    pub dx: i8,
    /// y step, in {-1, 0, 1}
    pub dy: i8,
    /// Repeat count, at least 1
    pub count: u32,
}

impl Movement {
    /// Create a movement
    pub const fn new(dx: i8, dy: i8, count: u32) -> Self {
        Self { dx, dy, count }
    }

    /// Direction of travel
    pub fn compass(self) -> Option<Compass> {
        Compass::from_delta(self.dx, self.dy)
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dx={:+} dy={:+} x{}", self.dx, self.dy, self.count)
    }
}

/// Run-length encoded movement sequence, built destination-first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    moves: Vec<Movement>,
}

impl Path {
    /// Empty path
    pub const fn new() -> Self {
        Self { moves: Vec::new() }
    }

    /// Path from moves already in build order (last forward move first).
    pub fn from_moves(moves: Vec<Movement>) -> Self {
        Self { moves }
    }

    /// Moves in build order: the move arriving at the destination comes first.
    pub fn moves(&self) -> &[Movement] {
        &self.moves
    }

    /// Moves in forward (source → destination) order
    pub fn replay(&self) -> impl DoubleEndedIterator<Item = &Movement> + '_ {
        self.moves.iter().rev()
    }

    /// Number of runs
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// True for a zero-length path (start == end)
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Total unit steps
    pub fn steps(&self) -> u32 {
        self.moves.iter().map(|m| m.count).sum()
    }

    /// Every cell visited, starting at `start` and ending at the destination.
    ///
    /// # Errors
    ///
    /// Returns [`DkstrError::InvalidPath`] if a step leaves a
    /// `width`×`height` area.
    pub fn cells(&self, start: Coord, width: usize, height: usize) -> Result<Vec<Coord>> {
        let mut out = Vec::with_capacity(self.steps() as usize + 1);
        let mut at = start;
        out.push(at);
        for m in self.replay() {
            for _ in 0..m.count {
                at = at.step(m.dx, m.dy, width, height).ok_or_else(|| {
                    DkstrError::invalid_path(format!("step {m} from {at} leaves the grid"))
                })?;
                out.push(at);
            }
        }
        Ok(out)
    }

    /// Replay the path from `start`, accumulating step and terrain costs.
    ///
    /// # Errors
    ///
    /// Returns [`DkstrError::InvalidPath`] if the walk leaves the field or
    /// enters an impassable cell.
    pub fn cost<F: CostField + ?Sized>(&self, field: &F, start: Coord) -> Result<HalfUnits> {
        let (w, h) = (field.width(), field.height());
        let mut total = HalfUnits::ZERO;
        let mut at = start;
        for m in self.replay() {
            let base = if m.dx != 0 && m.dy != 0 { 3 } else { 2 };
            for _ in 0..m.count {
                at = at.step(m.dx, m.dy, w, h).ok_or_else(|| {
                    DkstrError::invalid_path(format!("step {m} from {at} leaves the grid"))
                })?;
                let terrain = field
                    .terrain(at)
                    .ok_or_else(|| DkstrError::invalid_path(format!("{at} is impassable")))?;
                total += HalfUnits(base + 2 * terrain);
            }
        }
        Ok(total)
    }

    fn push_step(&mut self, dx: i8, dy: i8) {
        self.moves.push(Movement::new(dx, dy, 1));
    }

    fn extend_last(&mut self) {
        if let Some(last) = self.moves.last_mut() {
            last.count += 1;
        }
    }
}

/// Cost in half units: 2 = 1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HalfUnits(pub u32);

impl HalfUnits {
    /// Zero cost
    pub const ZERO: Self = Self(0);

    /// Raw half-unit count
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl Add for HalfUnits {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for HalfUnits {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl fmt::Display for HalfUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frac = if self.0 & 1 == 1 { 5 } else { 0 };
        write!(f, "{}.{frac}", self.0 >> 1)
    }
}

/// Outcome of a reconstruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The walk reached the source.
    Found(Path),
    /// The walk hit a cell with no recorded direction.
    Unreachable {
        /// Cell where the walk stopped
        stopped_at: Coord,
        /// Moves collected before stopping
        partial: Path,
    },
}

impl Route {
    /// The full path, if one was found
    pub const fn path(&self) -> Option<&Path> {
        match self {
            Self::Found(p) => Some(p),
            Self::Unreachable { .. } => None,
        }
    }

    /// True if the source was reached
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Walk `field` from `end` back to `start`.
///
/// A cell without a direction stops the walk with [`Route::Unreachable`];
/// this is a normal "no path" answer, not an error.
///
/// # Errors
///
/// - [`DkstrError::OutOfBounds`] if `start` or `end` is outside the field
/// - [`DkstrError::DirectionOutOfBounds`] if a direction points off the grid
/// - [`DkstrError::StepBudgetExceeded`] after `width × height` steps
pub fn reconstruct<F: DirectionField + ?Sized>(
    field: &F,
    start: Coord,
    end: Coord,
) -> Result<Route> {
    let (w, h) = (field.width(), field.height());
    for c in [start, end] {
        if c.x >= w || c.y >= h {
            return Err(DkstrError::out_of_bounds(c, w, h));
        }
    }

    let budget = w * h;
    let mut path = Path::new();
    let mut prev: Option<Compass> = None;
    let mut curr = end;
    let mut steps = 0;

    while curr != start {
        if steps >= budget {
            return Err(DkstrError::StepBudgetExceeded { budget });
        }
        steps += 1;

        let Some(dir) = field.predecessor(curr) else {
            return Ok(Route::Unreachable {
                stopped_at: curr,
                partial: path,
            });
        };
        let (dx, dy) = dir.delta();
        let next = curr
            .step(dx, dy, w, h)
            .ok_or(DkstrError::DirectionOutOfBounds { at: curr, direction: dir })?;

        if prev == Some(dir) {
            path.extend_last();
        } else {
            path.push_step(-dx, -dy);
        }
        prev = Some(dir);
        curr = next;
    }

    Ok(Route::Found(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ScratchGraph;

    /// Direction field from rows of glyphs; '.' = none.
    struct Glyphs {
        w: usize,
        h: usize,
        cells: Vec<Option<Compass>>,
    }

    impl Glyphs {
        fn new(rows: &[&str]) -> Self {
            let cells = rows
                .iter()
                .flat_map(|r| r.chars())
                .map(|ch| Compass::ALL.into_iter().find(|c| c.glyph() == ch))
                .collect();
            Self {
                w: rows[0].len(),
                h: rows.len(),
                cells,
            }
        }
    }

    impl DirectionField for Glyphs {
        fn width(&self) -> usize {
            self.w
        }

        fn height(&self) -> usize {
            self.h
        }

        fn predecessor(&self, c: Coord) -> Option<Compass> {
            self.cells[c.index(self.w)]
        }
    }

    #[test]
    fn half_units_print_like_fixed_point() {
        assert_eq!(HalfUnits(6).to_string(), "3.0");
        assert_eq!(HalfUnits(9).to_string(), "4.5");
        assert_eq!(HalfUnits(0).to_string(), "0.0");
        assert_eq!(HalfUnits(1).to_string(), "0.5");
    }

    #[test]
    fn merges_straight_runs() {
        // everything in row 0 points west toward (0, 0)
        let field = Glyphs::new(&[".<<<"]);
        let route = reconstruct(&field, Coord::new(0, 0), Coord::new(3, 0)).unwrap();
        let path = route.path().unwrap();
        assert_eq!(path.moves(), &[Movement::new(1, 0, 3)]);
        assert_eq!(path.steps(), 3);
    }

    #[test]
    fn turns_start_new_runs_in_reverse_order() {
        // (0,0) east to (2,0), then south to (2,2)
        let field = Glyphs::new(&[".<<", "..^", "..^"]);
        let route = reconstruct(&field, Coord::new(0, 0), Coord::new(2, 2)).unwrap();
        let path = route.path().unwrap();
        assert_eq!(path.moves(), &[Movement::new(0, 1, 2), Movement::new(1, 0, 2)]);
        let forward: Vec<_> = path.replay().copied().collect();
        assert_eq!(forward, vec![Movement::new(1, 0, 2), Movement::new(0, 1, 2)]);
    }

    #[test]
    fn start_equals_end_is_empty() {
        let field = Glyphs::new(&["..", ".."]);
        let route = reconstruct(&field, Coord::new(1, 1), Coord::new(1, 1)).unwrap();
        assert_eq!(route, Route::Found(Path::new()));
    }

    #[test]
    fn missing_direction_is_unreachable_with_partial() {
        let field = Glyphs::new(&["..<"]);
        let route = reconstruct(&field, Coord::new(0, 0), Coord::new(2, 0)).unwrap();
        match route {
            Route::Unreachable {
                stopped_at,
                partial,
            } => {
                assert_eq!(stopped_at, Coord::new(1, 0));
                assert_eq!(partial.moves(), &[Movement::new(1, 0, 1)]);
            }
            other => panic!("expected unreachable, got {other:?}"),
        }
    }

    #[test]
    fn cycle_exhausts_step_budget() {
        let field = Glyphs::new(&[".><"]);
        let err = reconstruct(&field, Coord::new(0, 0), Coord::new(2, 0)).unwrap_err();
        assert!(matches!(err, DkstrError::StepBudgetExceeded { budget: 3 }));
    }

    #[test]
    fn direction_off_grid_is_malformed() {
        let field = Glyphs::new(&[".>"]);
        let err = reconstruct(&field, Coord::new(0, 0), Coord::new(1, 0)).unwrap_err();
        assert!(matches!(err, DkstrError::DirectionOutOfBounds { .. }));
    }

    #[test]
    fn endpoints_must_be_inside() {
        let g = ScratchGraph::new(2, 2);
        let err = reconstruct(&g, Coord::new(0, 0), Coord::new(0, 2)).unwrap_err();
        assert!(matches!(err, DkstrError::OutOfBounds { .. }));
    }

    #[test]
    fn cost_replay_charges_terrain_of_entered_cells() {
        let grid = dkstr_maps::Grid::from_rows(&["013"]).unwrap();
        let path = Path::from_moves(vec![Movement::new(1, 0, 2)]);
        // (2 + 2) + (2 + 6)
        assert_eq!(path.cost(&grid, Coord::new(0, 0)).unwrap(), HalfUnits(12));
    }

    #[test]
    fn cost_replay_rejects_walls() {
        let grid = dkstr_maps::Grid::from_rows(&["0#"]).unwrap();
        let path = Path::from_moves(vec![Movement::new(1, 0, 1)]);
        assert!(path.cost(&grid, Coord::new(0, 0)).is_err());
    }

    #[test]
    fn cells_walk_forward() {
        let path = Path::from_moves(vec![Movement::new(0, 1, 1), Movement::new(1, 1, 1)]);
        let cells = path.cells(Coord::new(0, 0), 3, 3).unwrap();
        assert_eq!(
            cells,
            vec![Coord::new(0, 0), Coord::new(1, 1), Coord::new(1, 2)]
        );
    }
}
