//! Map text parser
//!
//! First line `<height> <width>`, then `height` rows of at least `width`
//! symbols. Anything after the last row is ignored.

use crate::error::{MapError, Result};
use crate::grid::Grid;
use std::path::Path;
use tracing::debug;

impl Grid {
    /// Load a map file.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::FileNotFound`] if the file does not exist, or a parse
    /// error if its contents are malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MapError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let grid = Self::parse(&text)?;
        debug!(
            "Loaded map {}: {}x{}",
            path.display(),
            grid.width(),
            grid.height()
        );
        Ok(grid)
    }

    /// Parse map text.
    ///
    /// # Errors
    ///
    /// Returns a parse error on a missing or malformed header, a short row, or
    /// fewer rows than the header announces.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().map(|l| l.trim_end_matches('\r'));

        let header = lines
            .next()
            .ok_or_else(|| MapError::parse_error(1, "empty map file"))?;
        let (height, width) = parse_header(header)?;

        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            let line_no = y + 2;
            let row = lines.next().ok_or_else(|| {
                MapError::parse_error(line_no, format!("expected {height} rows, found {y}"))
            })?;
            let bytes = row.as_bytes();
            if bytes.len() < width {
                return Err(MapError::parse_error(
                    line_no,
                    format!("row has {} symbols, expected {width}", bytes.len()),
                ));
            }
            cells.extend_from_slice(&bytes[..width]);
        }

        Self::new(width, height, cells)
    }
}

fn parse_header(line: &str) -> Result<(usize, usize)> {
    let mut fields = line.split_whitespace().map(str::parse::<usize>);
    match (fields.next(), fields.next()) {
        (Some(Ok(h)), Some(Ok(w))) => Ok((h, w)),
        _ => Err(MapError::parse_error(
            1,
            format!("expected \"<height> <width>\", got {line:?}"),
        )),
    }
}
