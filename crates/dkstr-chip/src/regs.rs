//! Control block register map.
//!
//! ```text
//! word  offset  name          access
//! ────  ──────  ────────────  ───────────────────────────────────────────
//!  0    0x00    CONTROL       write: load start + launch; read: RUN = busy
//!  1    0x04    LOAD_CYCLES   cycles spent loading cost nibbles into PEs
//!  2    0x08    RUN_CYCLES    cycles spent relaxing
//!  3    0x0C    STORE_CYCLES  cycles spent storing direction nibbles
//! ```

/// Control word (write to start, read to poll).
pub const CONTROL: usize = 0x00;
/// Load-phase cycle counter.
pub const LOAD_CYCLES: usize = 0x04;
/// Run-phase cycle counter.
pub const RUN_CYCLES: usize = 0x08;
/// Store-phase cycle counter.
pub const STORE_CYCLES: usize = 0x0C;

/// Control word bit definitions.
pub mod control {
    /// Launch / busy. Stays set until the fabric has stored its result.
    pub const RUN: u32 = 1 << 31;
    /// Latch the start coordinate and reload cost nibbles from the map BRAM.
    pub const LOAD: u32 = 1 << 30;
    /// Start column field mask (after shifting).
    pub const X_MASK: u32 = 0x1F;
    /// Start column field shift.
    pub const X_SHIFT: u32 = 0;
    /// Start row field mask (after shifting).
    pub const Y_MASK: u32 = 0x1F;
    /// Start row field shift.
    pub const Y_SHIFT: u32 = 5;
}

/// A control register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlWord(u32);

impl ControlWord {
    /// RUN | LOAD with the given start coordinate.
    ///
    /// Returns `None` if either coordinate does not fit the 5-bit field; the
    /// fabric would otherwise silently wrap it.
    #[must_use]
    pub const fn launch(x: u32, y: u32) -> Option<Self> {
        if x > control::X_MASK || y > control::Y_MASK {
            return None;
        }
        Some(Self(
            control::RUN | control::LOAD | (y << control::Y_SHIFT) | (x << control::X_SHIFT),
        ))
    }

    /// Wrap a raw register value.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw register value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// RUN bit.
    #[must_use]
    pub const fn is_running(self) -> bool {
        self.0 & control::RUN != 0
    }

    /// LOAD bit.
    #[must_use]
    pub const fn is_load(self) -> bool {
        self.0 & control::LOAD != 0
    }

    /// Start column field.
    #[must_use]
    pub const fn start_x(self) -> u32 {
        (self.0 >> control::X_SHIFT) & control::X_MASK
    }

    /// Start row field.
    #[must_use]
    pub const fn start_y(self) -> u32 {
        (self.0 >> control::Y_SHIFT) & control::Y_MASK
    }

    /// The value the fabric leaves behind once it is done: RUN and LOAD clear,
    /// start fields untouched.
    #[must_use]
    pub const fn completed(self) -> Self {
        Self(self.0 & !(control::RUN | control::LOAD))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_word_layout() {
        let w = ControlWord::launch(3, 7).unwrap();
        assert_eq!(w.raw(), 0xC000_0000 | (7 << 5) | 3);
        assert!(w.is_running());
        assert!(w.is_load());
        assert_eq!(w.start_x(), 3);
        assert_eq!(w.start_y(), 7);
    }

    #[test]
    fn launch_rejects_wide_coordinates() {
        assert!(ControlWord::launch(31, 31).is_some());
        assert!(ControlWord::launch(32, 0).is_none());
        assert!(ControlWord::launch(0, 40).is_none());
    }

    #[test]
    fn completed_clears_only_handshake_bits() {
        let w = ControlWord::launch(5, 9).unwrap().completed();
        assert!(!w.is_running());
        assert!(!w.is_load());
        assert_eq!((w.start_x(), w.start_y()), (5, 9));
    }

    #[test]
    fn counters_follow_control_word() {
        assert_eq!(LOAD_CYCLES, CONTROL + 4);
        assert_eq!(RUN_CYCLES, CONTROL + 8);
        assert_eq!(STORE_CYCLES, CONTROL + 12);
    }
}
