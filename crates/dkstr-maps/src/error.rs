//! Error types for map operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for map operations
pub type Result<T> = std::result::Result<T, MapError>;

/// Errors that can occur while loading or building a map
#[derive(Debug, Error)]
pub enum MapError {
    /// File not found or cannot be opened
    #[error("Map file not found: {path}")]
    FileNotFound {
        /// Path that was attempted
        path: PathBuf,
    },

    /// Map text is malformed
    #[error("Failed to parse map (line {line}): {reason}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// Reason for failure
        reason: String,
    },

    /// Width or height is zero, or the buffer does not match them
    #[error("Invalid map dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
        /// Reason for failure
        reason: String,
    },

    /// Symbol outside the 7-bit cost table
    #[error("Invalid terrain symbol {symbol:#04x} at ({x}, {y})")]
    InvalidSymbol {
        /// Offending byte
        symbol: u8,
        /// Column
        x: usize,
        /// Row
        y: usize,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl MapError {
    /// Create a parse error
    pub fn parse_error(line: usize, reason: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            reason: reason.into(),
        }
    }

    /// Create an invalid dimensions error
    pub fn invalid_dimensions(width: usize, height: usize, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }
}
