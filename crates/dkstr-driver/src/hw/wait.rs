//! Completion waits
//!
//! The driver calls [`CompletionWait::arm`] *before* writing the control
//! word and [`CompletionWait::wait`] after it, so a completion that fires
//! immediately is never missed. If the control write fails it calls
//! [`CompletionWait::disarm`] instead of waiting.

use super::bus::RegisterBus;
use crate::config::WaitMode;
use crate::error::Result;
use dkstr_chip::layout::Window;
use dkstr_chip::{regs, ControlWord};
use std::fmt::Debug;
use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// How the driver blocks until the accelerator clears RUN.
pub trait CompletionWait: Debug + Send {
    /// Prepare to observe the next completion.
    ///
    /// # Errors
    ///
    /// Returns error if the notification mechanism cannot be armed.
    fn arm(&mut self) -> Result<()>;

    /// Block until the operation launched after [`arm`](Self::arm) finishes.
    /// Returns the number of status reads spent, 0 for event-driven waits.
    ///
    /// # Errors
    ///
    /// Returns error if the bus fails or the wait is interrupted.
    fn wait(&mut self, bus: &dyn RegisterBus) -> Result<u64>;

    /// Undo [`arm`](Self::arm) when the launch never happened. Nothing to
    /// undo for waits that hold no thread state.
    fn disarm(&mut self) {}

    /// Mechanism name, for logging
    fn mode(&self) -> WaitMode;
}

/// Spins on the RUN bit.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollWait;

impl CompletionWait for PollWait {
    fn arm(&mut self) -> Result<()> {
        Ok(())
    }

    fn wait(&mut self, bus: &dyn RegisterBus) -> Result<u64> {
        let mut polls = 0;
        loop {
            polls += 1;
            let word = ControlWord::from_raw(bus.read_u32(Window::Control, regs::CONTROL)?);
            if !word.is_running() {
                return Ok(polls);
            }
            std::hint::spin_loop();
        }
    }

    fn mode(&self) -> WaitMode {
        WaitMode::Poll
    }
}

/// One-shot completion flag shared between a notifier and a waiter.
///
/// Stands in for the interrupt line when the accelerator is emulated.
#[derive(Debug, Default)]
pub struct CompletionLatch {
    done: Mutex<bool>,
    signal: Condvar,
}

impl CompletionLatch {
    /// New, un-signalled latch
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the flag ahead of a new operation.
    pub fn arm(&self) {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }

    /// Signal completion and wake the waiter.
    pub fn notify(&self) {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.signal.notify_all();
    }

    /// Block until [`notify`](Self::notify) has been called since the last
    /// [`arm`](Self::arm).
    pub fn wait(&self) {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        while !*done {
            done = self
                .signal
                .wait(done)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// True if signalled and not re-armed
    pub fn is_signalled(&self) -> bool {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Event-driven wait on a [`CompletionLatch`].
#[derive(Debug, Clone)]
pub struct LatchWait {
    latch: Arc<CompletionLatch>,
}

impl LatchWait {
    /// Wait on `latch`
    pub fn new(latch: Arc<CompletionLatch>) -> Self {
        Self { latch }
    }
}

impl CompletionWait for LatchWait {
    fn arm(&mut self) -> Result<()> {
        self.latch.arm();
        Ok(())
    }

    fn wait(&mut self, _bus: &dyn RegisterBus) -> Result<u64> {
        self.latch.wait();
        Ok(0)
    }

    fn mode(&self) -> WaitMode {
        WaitMode::Interrupt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn latch_wakes_waiter_on_other_thread() {
        let latch = Arc::new(CompletionLatch::new());
        latch.arm();
        let waiter = {
            let latch = Arc::clone(&latch);
            thread::spawn(move || latch.wait())
        };
        thread::sleep(Duration::from_millis(10));
        latch.notify();
        waiter.join().unwrap();
        assert!(latch.is_signalled());
    }

    #[test]
    fn notify_before_wait_is_not_lost() {
        let latch = CompletionLatch::new();
        latch.arm();
        latch.notify();
        latch.wait();
    }

    #[test]
    fn arm_clears_previous_completion() {
        let latch = CompletionLatch::new();
        latch.notify();
        latch.arm();
        assert!(!latch.is_signalled());
    }
}
