//! Terrain cost table.
//!
//! Costs are whole units (the pathfinders double them into half-unit fixed
//! point). The table covers the 7-bit symbol range; anything the table does not
//! name is an obstruction.
//!
//! | Symbols | Cost |
//! |---------|------|
//! | `' '` `'.'` | 0 |
//! | `'0'`–`'9'` | 0–9 |
//! | `'a'`–`'e'`, `'A'`–`'E'` | 10–14 |
//! | everything else (`'#'`, `'f'`, `'*'`, …) | impassable |
//!
//! Costs stop at 14 so every passable cost survives the 4-bit cost nibble,
//! where 0xF is reserved for obstructions.

/// Sentinel stored for impassable symbols. Never an arithmetic value.
#[allow(clippy::cast_possible_wrap)]
pub const IMPASSABLE: i32 = 0xDEAD_BEEF_u32 as i32;

/// Largest passable cost.
pub const MAX_COST: i32 = 14;

/// Symbol-to-cost table.
pub static COST_TABLE: [i32; 128] = build_table();

const fn build_table() -> [i32; 128] {
    let mut t = [IMPASSABLE; 128];
    t[b' ' as usize] = 0;
    t[b'.' as usize] = 0;
    let mut i = 0;
    while i < 10 {
        t[(b'0' + i) as usize] = i as i32;
        i += 1;
    }
    let mut i = 0;
    while i < 5 {
        t[(b'a' + i) as usize] = 10 + i as i32;
        t[(b'A' + i) as usize] = 10 + i as i32;
        i += 1;
    }
    t
}

/// Raw table value for `symbol`; [`IMPASSABLE`] for obstructions and for
/// bytes outside the table.
#[must_use]
pub fn cost(symbol: u8) -> i32 {
    COST_TABLE
        .get(usize::from(symbol))
        .copied()
        .unwrap_or(IMPASSABLE)
}

/// Range-checked cost: `None` for impassable symbols.
#[must_use]
pub fn terrain(symbol: u8) -> Option<u32> {
    match cost(symbol) {
        IMPASSABLE => None,
        c => u32::try_from(c).ok(),
    }
}

/// True if `symbol` cannot be entered.
#[must_use]
pub fn is_impassable(symbol: u8) -> bool {
    cost(symbol) == IMPASSABLE
}

/// Canonical symbol for a cost (`None` for impassable), used by the generator
/// and by tests that build grids from cost lists.
///
/// # Panics
///
/// Panics if `cost` exceeds [`MAX_COST`].
#[must_use]
pub fn symbol_for(cost: Option<u32>) -> u8 {
    match cost {
        None => b'#',
        #[allow(clippy::cast_possible_truncation)]
        Some(c @ 0..=9) => b'0' + c as u8,
        #[allow(clippy::cast_possible_truncation)]
        Some(c @ 10..=14) => b'a' + (c - 10) as u8,
        Some(c) => panic!("terrain cost {c} exceeds {MAX_COST}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_and_letters() {
        assert_eq!(cost(b'0'), 0);
        assert_eq!(cost(b'7'), 7);
        assert_eq!(cost(b'a'), 10);
        assert_eq!(cost(b'E'), 14);
        assert_eq!(cost(b'.'), 0);
    }

    #[test]
    fn unknown_symbols_are_obstructions() {
        for s in [b'#', b'f', b'F', b'*', b'X', b'\n', 0x7F, 0x80, 0xFF] {
            assert!(is_impassable(s), "{s:#x}");
            assert_eq!(terrain(s), None);
        }
    }

    #[test]
    fn sentinel_is_deadbeef() {
        assert_eq!(IMPASSABLE as u32, 0xDEAD_BEEF);
    }

    #[test]
    fn symbol_for_inverts_terrain() {
        for c in 0..=14u32 {
            assert_eq!(terrain(symbol_for(Some(c))), Some(c));
        }
        assert!(is_impassable(symbol_for(None)));
    }
}
