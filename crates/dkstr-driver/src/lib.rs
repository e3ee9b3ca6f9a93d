//! Pathfinding engine and register-level driver for the dkstr accelerator.
//!
//! The same query (grid, start, end) can be answered by three interchangeable
//! backends, so results and per-stage timings can be cross-checked:
//!
//! ```text
//! Software:
//!   IncrementalBackend   FIFO label-correcting relaxation
//!   SynchronousBackend   whole-grid lock-step sweeps (models the PE array)
//!
//! Hardware:
//!   HardwarePathfinder<MappedBus>              /dev/mem windows on the FPGA
//!   HardwarePathfinder<SimulatedAccelerator>   register-accurate emulator
//! ```
//!
//! Every backend returns a [`Solution`]: the reconstructed [`Route`] plus a
//! five-stage [`ProfileSample`].
//!
//! # Quick start
//!
//! ```no_run
//! use dkstr_driver::{select_backend, BackendSelection, DriverConfig};
//! use dkstr_maps::{Coord, Grid};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let grid = Grid::from_file("maps/maze.txt")?;
//! let config = DriverConfig::from_env()?;
//! let mut backend = select_backend(BackendSelection::Auto, &config)?;
//!
//! let solution = backend.find(&grid, Coord::new(0, 0), Coord::new(27, 27))?;
//! match solution.route.path() {
//!     Some(path) => println!("cost {}", path.cost(&grid, Coord::new(0, 0))?),
//!     None => println!("no path"),
//! }
//! println!("{}", solution.profile);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod backend;
mod config;
mod error;
mod field;
mod graph;
pub mod hw;
pub mod pack;
mod path;
pub mod profile;
pub mod software;

pub use backend::{select_backend, BackendSelection, BackendType, PathBackend, Solution};
pub use config::{AddressMap, DriverConfig, WaitMode};
pub use error::{DkstrError, Result};
pub use field::{CostField, DirectionField};
pub use graph::{Node, ScratchGraph};
pub use hw::{
    CompletionLatch, CompletionWait, CycleCounters, HardwarePathfinder, LatchWait, MappedBus,
    PollWait, RegisterBus, SignalWait, SimulatedAccelerator,
};
pub use pack::{pack_costs, pack_directions, unpack_direction, PackedCosts, PackedDirections};
pub use path::{reconstruct, HalfUnits, Movement, Path, Route};
pub use profile::{BatchStats, ProfileSample, Stage, StageTimer, Stats};
pub use software::{IncrementalBackend, RelaxStats, SynchronousBackend};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        select_backend, BackendSelection, DkstrError, DriverConfig, HalfUnits, Path,
        PathBackend, ProfileSample, Result, Route, Solution, WaitMode,
    };
    pub use dkstr_maps::{Coord, Grid};
}
