//! Compass directions in the fabric's bit order.
//!
//! A direction names the neighbour a cell was reached *from*. Screen
//! coordinates: x grows east, y grows south.

/// One of the eight neighbour directions. The discriminant is the 3-bit index
/// stored in a direction nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Compass {
    /// (0, -1)
    North = 0,
    /// (1, -1)
    NorthEast = 1,
    /// (1, 0)
    East = 2,
    /// (1, 1)
    SouthEast = 3,
    /// (0, 1)
    South = 4,
    /// (-1, 1)
    SouthWest = 5,
    /// (-1, 0)
    West = 6,
    /// (-1, -1)
    NorthWest = 7,
}

const DELTAS: [(i8, i8); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

impl Compass {
    /// All directions in index order.
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Direction for a 3-bit index (upper bits ignored).
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        Self::ALL[(index & 0x7) as usize]
    }

    /// 3-bit index.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// (dx, dy) step.
    #[must_use]
    pub const fn delta(self) -> (i8, i8) {
        DELTAS[self as usize]
    }

    /// Direction for a unit step, `None` for (0, 0) or non-unit deltas.
    #[must_use]
    pub fn from_delta(dx: i8, dy: i8) -> Option<Self> {
        DELTAS
            .iter()
            .position(|&d| d == (dx, dy))
            .map(|i| Self::ALL[i])
    }

    /// Diagonal moves cost 1.5, axis moves 1.0.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        let (dx, dy) = self.delta();
        dx != 0 && dy != 0
    }

    /// Glyph used when rendering a direction field.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::North => '^',
            Self::NorthEast => '/',
            Self::East => '>',
            Self::SouthEast => '\\',
            Self::South => 'v',
            Self::SouthWest => ',',
            Self::West => '<',
            Self::NorthWest => '`',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_order_matches_fabric() {
        assert_eq!(Compass::from_index(0), Compass::North);
        assert_eq!(Compass::from_index(2), Compass::East);
        assert_eq!(Compass::from_index(7), Compass::NorthWest);
        assert_eq!(Compass::from_index(0xF), Compass::NorthWest);
    }

    #[test]
    fn delta_lookup_is_inverse() {
        for c in Compass::ALL {
            let (dx, dy) = c.delta();
            assert_eq!(Compass::from_delta(dx, dy), Some(c));
        }
        assert_eq!(Compass::from_delta(0, 0), None);
        assert_eq!(Compass::from_delta(2, 0), None);
    }

    #[test]
    fn odd_indices_are_diagonal() {
        for c in Compass::ALL {
            assert_eq!(c.is_diagonal(), c.index() % 2 == 1, "{c:?}");
        }
    }
}
