//! Accelerator offload
//!
//! Layers, bottom up:
//! - **mmio**: one `/dev/mem` window, volatile and bounds-checked
//! - **bus**: the three windows behind [`RegisterBus`]; [`MappedBus`] for the
//!   FPGA, [`SimulatedAccelerator`] in memory
//! - **wait**: completion by polling RUN, by SIGIO, or by an in-process latch
//! - **driver**: [`HardwarePathfinder`], the launch protocol on top of any bus

mod bus;
mod driver;
pub mod mmio;
pub mod signal;
mod sim;
mod wait;

pub use bus::{MappedBus, RegisterBus};
pub use driver::{CycleCounters, HardwarePathfinder};
pub use mmio::MmapRegion;
pub use signal::{read_interrupt_count, stray_interrupts, SignalWait};
pub use sim::SimulatedAccelerator;
pub use wait::{CompletionLatch, CompletionWait, LatchWait, PollWait};
