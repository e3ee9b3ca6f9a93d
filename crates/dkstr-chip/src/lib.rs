//! Silicon model for the dkstr pathfinding accelerator.
//!
//! This crate has **no dependencies** and **no hardware access**: it is a
//! pure model of the fabric's software-visible surface: the physical address
//! map, the control/status register block, the control-word layout and the
//! 4-bit cost and direction formats carried in the BRAM buffers.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`layout`] | Physical address map (map BRAM, direction BRAM, control block) |
//! | [`regs`] | Control block register offsets and control-word encoding |
//! | [`nibble`] | Packed 4-bit field access, cost nibble and direction nibble formats |
//! | [`compass`] | The eight compass directions in hardware bit order |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod compass;
pub mod layout;
pub mod nibble;
pub mod regs;

pub use compass::Compass;
pub use regs::ControlWord;
