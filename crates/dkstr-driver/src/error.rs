//! Error types for dkstr pathfinding and driver operations

use dkstr_chip::Compass;
use dkstr_maps::{Coord, MapError};
use thiserror::Error;

/// Result type alias for dkstr operations
pub type Result<T> = std::result::Result<T, DkstrError>;

/// Errors that can occur while finding, reconstructing or offloading a path
#[derive(Debug, Error)]
pub enum DkstrError {
    /// Map could not be loaded or built
    #[error("Map error: {source}")]
    Map {
        /// Underlying map error
        #[from]
        source: MapError,
    },

    /// I/O error during device communication
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Coordinate outside the grid
    #[error("{coord} lies outside the {width}x{height} grid")]
    OutOfBounds {
        /// Offending coordinate
        coord: Coord,
        /// Grid width
        width: usize,
        /// Grid height
        height: usize,
    },

    /// Incremental frontier exceeded its fixed capacity
    #[error("Frontier queue overflow (capacity {capacity})")]
    QueueOverflow {
        /// Queue capacity
        capacity: usize,
    },

    /// Accumulated cost outgrew the scratch node's cost field
    #[error("Accumulated cost at {at} exceeds the {max:#x} half-unit node range")]
    CostOverflow {
        /// Cell whose cost would not fit
        at: Coord,
        /// Largest storable cost
        max: u32,
    },

    /// Reconstruction walked more steps than the grid has cells
    #[error("Path reconstruction exceeded {budget} steps (cyclic direction field?)")]
    StepBudgetExceeded {
        /// Step budget (width × height)
        budget: usize,
    },

    /// A stored direction points off the grid
    #[error("Direction {direction:?} at {at} leaves the grid")]
    DirectionOutOfBounds {
        /// Cell holding the direction
        at: Coord,
        /// Stored direction
        direction: Compass,
    },

    /// A path does not describe a valid walk on the grid
    #[error("Invalid path: {reason}")]
    InvalidPath {
        /// Reason for failure
        reason: String,
    },

    /// Request violates the accelerator's register protocol
    #[error("Protocol violation: {reason}")]
    ProtocolViolation {
        /// Reason for failure
        reason: String,
    },

    /// Accelerator (or its device files) could not be reached
    #[error("Hardware unavailable: {reason}")]
    HardwareUnavailable {
        /// Reason for failure
        reason: String,
    },

    /// Accelerator still has RUN set from a previous request
    #[error("Accelerator busy: RUN bit still set")]
    Busy,

    /// Wait for completion was interrupted by the user
    #[error("Interrupted while waiting for completion")]
    Interrupted,

    /// Register window access failed
    #[error("Transfer failed: {reason}")]
    TransferFailed {
        /// Reason for failure
        reason: String,
    },

    /// Configuration value could not be parsed
    #[error("Invalid configuration: {reason}")]
    Config {
        /// Reason for failure
        reason: String,
    },
}

impl DkstrError {
    /// Create an out-of-bounds error
    pub const fn out_of_bounds(coord: Coord, width: usize, height: usize) -> Self {
        Self::OutOfBounds {
            coord,
            width,
            height,
        }
    }

    /// Create a cost overflow error for the cell at `at`
    pub const fn cost_overflow(at: Coord) -> Self {
        Self::CostOverflow {
            at,
            max: crate::graph::Node::COST_MAX,
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            reason: reason.into(),
        }
    }

    /// Create a protocol violation error
    pub fn protocol_violation(reason: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            reason: reason.into(),
        }
    }

    /// Create a hardware unavailable error
    pub fn hardware_unavailable(reason: impl Into<String>) -> Self {
        Self::HardwareUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a transfer failed error
    pub fn transfer_failed(reason: impl Into<String>) -> Self {
        Self::TransferFailed {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
