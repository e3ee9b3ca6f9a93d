//! Packed 4-bit fields.
//!
//! Both BRAM buffers hold eight nibbles per 32-bit word, least-significant
//! nibble first:
//!
//! ```text
//! word i:  [31:28] [27:24] [23:20] [19:16] [15:12] [11:8] [7:4] [3:0]
//! cell:     8i+7    8i+6    8i+5    8i+4    8i+3    8i+2   8i+1  8i+0
//! ```

use crate::compass::Compass;

/// Bits per field.
pub const NIBBLE_BITS: u32 = 4;
/// Fields per word.
pub const PER_WORD: usize = 8;

/// Words needed for `cells` nibbles.
#[must_use]
pub const fn words_for(cells: usize) -> usize {
    cells.div_ceil(PER_WORD)
}

/// Read nibble `index`. Out-of-range indices read as zero.
#[must_use]
pub fn get(words: &[u32], index: usize) -> u8 {
    words.get(index / PER_WORD).map_or(0, |w| {
        #[allow(clippy::cast_possible_truncation)]
        let shift = ((index % PER_WORD) as u32) * NIBBLE_BITS;
        ((w >> shift) & 0xF) as u8
    })
}

/// Overwrite nibble `index`.
///
/// # Panics
///
/// Panics if `index / 8` is outside `words`.
pub fn set(words: &mut [u32], index: usize, value: u8) {
    #[allow(clippy::cast_possible_truncation)]
    let shift = ((index % PER_WORD) as u32) * NIBBLE_BITS;
    let w = &mut words[index / PER_WORD];
    *w = (*w & !(0xF << shift)) | (u32::from(value & 0xF) << shift);
}

/// Linear index the fabric uses for the direction field.
///
/// The stride is the grid *height*, not its width. The fabric is wired that
/// way; keep it even though the map itself is stored width-major.
#[must_use]
pub const fn direction_index(x: usize, y: usize, height: usize) -> usize {
    x + y * height
}

/// Cost nibble format: 0x0–0xE cost, 0xF obstruction.
pub mod cost {
    /// Obstruction marker.
    pub const IMPASSABLE: u8 = 0xF;

    /// Nibble for a terrain cost; `None` means impassable.
    #[must_use]
    pub const fn encode(cost: Option<u32>) -> u8 {
        match cost {
            #[allow(clippy::cast_possible_truncation)]
            Some(c) => (c & 0xF) as u8,
            None => IMPASSABLE,
        }
    }

    /// Terrain cost carried by a nibble; `None` for the obstruction marker.
    #[must_use]
    pub const fn decode(nibble: u8) -> Option<u32> {
        match nibble & 0xF {
            IMPASSABLE => None,
            c => Some(c as u32),
        }
    }
}

/// Direction nibble format: bit 3 valid, bits 2:0 compass index.
pub mod direction {
    use super::Compass;

    /// Valid bit.
    pub const VALID: u8 = 0x8;
    /// Compass index mask.
    pub const INDEX_MASK: u8 = 0x7;

    /// Nibble for an optional predecessor direction.
    #[must_use]
    pub const fn encode(dir: Option<Compass>) -> u8 {
        match dir {
            Some(c) => VALID | c.index(),
            None => 0,
        }
    }

    /// Predecessor direction, or `None` if the valid bit is clear
    /// (unreachable cell or the start cell).
    #[must_use]
    pub const fn decode(nibble: u8) -> Option<Compass> {
        if nibble & VALID == 0 {
            None
        } else {
            Some(Compass::from_index(nibble & INDEX_MASK))
        }
    }
}
