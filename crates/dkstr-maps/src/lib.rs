#![deny(unsafe_code)]

//! Grid maps for the dkstr pathfinder.
//!
//! A map is a rectangle of terrain symbols. Each symbol resolves through a
//! fixed cost table to a traversal cost, or to the impassable sentinel.
//!
//! # Text format
//!
//! ```text
//! 3 4        <- height width
//! 0.1#
//! 0#..
//! 00a0
//! ```
//!
//! # Example
//!
//! ```no_run
//! use dkstr_maps::{Coord, Grid};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let grid = Grid::from_file("maps/maze.txt")?;
//! println!("{}x{}", grid.width(), grid.height());
//! println!("cost at origin: {:?}", grid.terrain(Coord::new(0, 0)));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cost;
mod coord;
mod error;
pub mod generate;
mod grid;
mod parser;

pub use coord::Coord;
pub use error::{MapError, Result};
pub use generate::MapGenerator;
pub use grid::Grid;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{Coord, Grid, MapError, MapGenerator, Result};
}
