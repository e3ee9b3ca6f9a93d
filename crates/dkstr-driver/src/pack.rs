//! Bit-packer for the accelerator's map and direction windows
//!
//! Both windows hold 8 nibbles per little-endian `u32`, least-significant
//! nibble first. They differ in linearization:
//!
//! | Buffer | Cell index |
//! |--------|-----------|
//! | cost (map input) | `x + y * width` (row-major) |
//! | direction (output) | `x + y * height` |
//!
//! The direction stride is what the fabric writes and is kept as-is; on
//! non-square grids it aliases cells, which is why the emulator only models
//! square fabrics.

use crate::field::{CostField, DirectionField};
use dkstr_chip::nibble::{self, cost, direction};
use dkstr_chip::Compass;
use dkstr_maps::Coord;

/// Pack a cost field into map-input words: `ceil(w * h / 8)` words,
/// `0xF` for impassable cells, otherwise the low nibble of the cost.
pub fn pack_costs<F: CostField + ?Sized>(field: &F) -> Vec<u32> {
    let (w, h) = (field.width(), field.height());
    let mut words = vec![0; nibble::words_for(w * h)];
    for y in 0..h {
        for x in 0..w {
            let c = Coord::new(x, y);
            nibble::set(&mut words, c.index(w), cost::encode(field.terrain(c)));
        }
    }
    words
}

/// Direction nibble for cell (x, y) of a `w`×`h` direction buffer.
///
/// Returns 0 (no direction) for indices past the end of `words`.
pub fn unpack_direction(words: &[u32], w: usize, h: usize, x: usize, y: usize) -> u8 {
    debug_assert!(x < w && y < h, "({x}, {y}) outside {w}x{h}");
    nibble::get(words, nibble::direction_index(x, y, h))
}

/// Pack a direction field into direction-output words, `x + y * h` order.
pub fn pack_directions<F: DirectionField + ?Sized>(field: &F) -> Vec<u32> {
    let (w, h) = (field.width(), field.height());
    let mut words = vec![0; direction_words(w, h)];
    for y in 0..h {
        for x in 0..w {
            let nib = direction::encode(field.predecessor(Coord::new(x, y)));
            nibble::set(&mut words, nibble::direction_index(x, y, h), nib);
        }
    }
    words
}

/// Words needed to hold every direction index of a `w`×`h` field.
pub fn direction_words(w: usize, h: usize) -> usize {
    if w == 0 || h == 0 {
        return 0;
    }
    let last = nibble::direction_index(w - 1, h - 1, h);
    nibble::words_for((last + 1).max(w * h))
}

/// Cost field view over packed map-input words.
#[derive(Debug, Clone, Copy)]
pub struct PackedCosts<'a> {
    words: &'a [u32],
    width: usize,
    height: usize,
}

impl<'a> PackedCosts<'a> {
    /// View `words` as a `width`×`height` cost field.
    pub const fn new(words: &'a [u32], width: usize, height: usize) -> Self {
        Self {
            words,
            width,
            height,
        }
    }
}

impl CostField for PackedCosts<'_> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn terrain(&self, c: Coord) -> Option<u32> {
        cost::decode(nibble::get(self.words, c.index(self.width)))
    }
}

/// Direction field view over packed direction-output words.
#[derive(Debug, Clone, Copy)]
pub struct PackedDirections<'a> {
    words: &'a [u32],
    width: usize,
    height: usize,
}

impl<'a> PackedDirections<'a> {
    /// View `words` as a `width`×`height` direction field.
    pub const fn new(words: &'a [u32], width: usize, height: usize) -> Self {
        Self {
            words,
            width,
            height,
        }
    }
}

impl DirectionField for PackedDirections<'_> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn predecessor(&self, c: Coord) -> Option<Compass> {
        direction::decode(unpack_direction(
            self.words,
            self.width,
            self.height,
            c.x,
            c.y,
        ))
    }
}
