//! Driver configuration
//!
//! Defaults match the reference FPGA image. Every field can be overridden
//! from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `DKSTR_WAIT_MODE` | `poll` or `interrupt` |
//! | `DKSTR_MEM_DEVICE` | physical memory device (`/dev/mem`) |
//! | `DKSTR_INT_DEVICE` | interrupt-forwarding device (`/dev/dkstr_int`) |
//! | `DKSTR_INT_STATUS` | interrupt count file (`/proc/dkstr-interrupt`) |
//! | `DKSTR_MAP_BASE` | map-input window base |
//! | `DKSTR_DIR_BASE` | direction-output window base |
//! | `DKSTR_CTRL_BASE` | control window base |
//! | `DKSTR_FABRIC_SIDE` | PE array side length (28) |

use crate::error::{DkstrError, Result};
use dkstr_chip::layout::{Window, MAX_GRID_SIDE};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// How the driver learns that the accelerator finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WaitMode {
    /// Spin on the control register's RUN bit
    #[default]
    Poll,
    /// Block until the completion interrupt is delivered
    Interrupt,
}

impl FromStr for WaitMode {
    type Err = DkstrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poll" | "polling" => Ok(Self::Poll),
            "interrupt" | "irq" | "int" => Ok(Self::Interrupt),
            other => Err(DkstrError::config(format!(
                "unknown wait mode {other:?} (expected poll or interrupt)"
            ))),
        }
    }
}

impl fmt::Display for WaitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poll => write!(f, "poll"),
            Self::Interrupt => write!(f, "interrupt"),
        }
    }
}

/// Physical base address of each register window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressMap {
    /// Map-input BRAM
    pub map_input: u64,
    /// Direction-output BRAM
    pub dir_output: u64,
    /// Control/status block
    pub control: u64,
}

impl AddressMap {
    /// Base address of `window`
    pub const fn base(&self, window: Window) -> u64 {
        match window {
            Window::MapInput => self.map_input,
            Window::DirOutput => self.dir_output,
            Window::Control => self.control,
        }
    }
}

impl Default for AddressMap {
    fn default() -> Self {
        Self {
            map_input: Window::MapInput.typical_addr(),
            dir_output: Window::DirOutput.typical_addr(),
            control: Window::Control.typical_addr(),
        }
    }
}

/// PE array size of the reference FPGA image.
pub const DEFAULT_FABRIC_SIDE: usize = 28;

/// Everything the hardware backends need to reach the accelerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Window base addresses
    pub address_map: AddressMap,
    /// Completion mechanism
    pub wait_mode: WaitMode,
    /// Device exposing physical memory
    pub mem_device: PathBuf,
    /// Interrupt-forwarding character device
    pub interrupt_device: PathBuf,
    /// Status file reporting the interrupt count
    pub interrupt_status: PathBuf,
    /// Side of the square PE array; queries must use exactly this grid size
    pub fabric_side: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            address_map: AddressMap::default(),
            wait_mode: WaitMode::default(),
            mem_device: PathBuf::from("/dev/mem"),
            interrupt_device: PathBuf::from("/dev/dkstr_int"),
            interrupt_status: PathBuf::from("/proc/dkstr-interrupt"),
            fabric_side: DEFAULT_FABRIC_SIDE,
        }
    }
}

impl DriverConfig {
    /// Defaults overridden by `DKSTR_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`DkstrError::Config`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    ///
    /// # Errors
    ///
    /// Returns [`DkstrError::Config`] if a value is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("DKSTR_WAIT_MODE") {
            config.wait_mode = v.parse()?;
        }
        if let Some(v) = lookup("DKSTR_MEM_DEVICE") {
            config.mem_device = PathBuf::from(v);
        }
        if let Some(v) = lookup("DKSTR_INT_DEVICE") {
            config.interrupt_device = PathBuf::from(v);
        }
        if let Some(v) = lookup("DKSTR_INT_STATUS") {
            config.interrupt_status = PathBuf::from(v);
        }
        if let Some(v) = lookup("DKSTR_MAP_BASE") {
            config.address_map.map_input = parse_address("DKSTR_MAP_BASE", &v)?;
        }
        if let Some(v) = lookup("DKSTR_DIR_BASE") {
            config.address_map.dir_output = parse_address("DKSTR_DIR_BASE", &v)?;
        }
        if let Some(v) = lookup("DKSTR_CTRL_BASE") {
            config.address_map.control = parse_address("DKSTR_CTRL_BASE", &v)?;
        }
        if let Some(v) = lookup("DKSTR_FABRIC_SIDE") {
            config.fabric_side = parse_side(&v)?;
        }

        Ok(config)
    }
}

/// Parse `0x`-prefixed hex or plain decimal, `_` separators allowed.
pub(crate) fn parse_address(name: &str, value: &str) -> Result<u64> {
    let cleaned: String = value.trim().chars().filter(|&c| c != '_').collect();
    let parsed = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => cleaned.parse(),
    };
    let addr =
        parsed.map_err(|e| DkstrError::config(format!("{name}={value:?} is not an address: {e}")))?;
    if addr % 4096 != 0 {
        return Err(DkstrError::config(format!(
            "{name}={addr:#x} is not page aligned"
        )));
    }
    Ok(addr)
}

fn parse_side(value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(side) if (1..=MAX_GRID_SIDE).contains(&side) => Ok(side),
        _ => Err(DkstrError::config(format!(
            "DKSTR_FABRIC_SIDE={value:?} is not a side length in 1..={MAX_GRID_SIDE}"
        ))),
    }
}
