//! Interrupt-driven completion via SIGIO
//!
//! The interrupt-forwarding kernel driver raises one SIGIO on the owning
//! process per accelerator interrupt once its device has `O_ASYNC` set.
//!
//! ```text
//! arm():  block {SIGIO, SIGINT} on this thread, remember the old mask
//! (driver writes the control word)
//! wait(): sigwaitinfo({SIGIO, SIGINT})   atomically unblocks and dequeues
//!         restore the old mask
//! disarm(): restore the old mask (control write failed, nothing to wait on)
//! ```
//!
//! Outside a wait SIGIO stays unblocked and lands in a counting no-op
//! handler, so a stray interrupt can never kill the process. Only the thread
//! that drives the accelerator may leave SIGIO blocked.

use super::bus::RegisterBus;
use super::wait::CompletionWait;
use crate::config::WaitMode;
use crate::error::{DkstrError, Result};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static STRAY_SIGIO: AtomicU64 = AtomicU64::new(0);

extern "C" fn on_sigio(_signo: libc::c_int) {
    STRAY_SIGIO.fetch_add(1, Ordering::Relaxed);
}

/// SIGIO deliveries that arrived outside a wait.
pub fn stray_interrupts() -> u64 {
    STRAY_SIGIO.load(Ordering::Relaxed)
}

/// Completion wait on the interrupt-forwarding device.
pub struct SignalWait {
    _device: File,
    path: PathBuf,
    wait_set: libc::sigset_t,
    saved_mask: Option<libc::sigset_t>,
    completions: u64,
}

impl SignalWait {
    /// Open `device`, claim its SIGIO for this process and enable async
    /// notification.
    ///
    /// # Errors
    ///
    /// Returns [`DkstrError::HardwareUnavailable`] if the device cannot be
    /// opened, or an I/O error if signal setup fails.
    pub fn open(device: &Path) -> Result<Self> {
        install_handler()?;

        let file = OpenOptions::new().read(true).open(device).map_err(|e| {
            DkstrError::hardware_unavailable(format!(
                "Cannot open {}: {e}. Is the interrupt module loaded?",
                device.display()
            ))
        })?;
        let fd = file.as_raw_fd();

        // SAFETY: fd is open for the duration of these calls; F_SETOWN,
        // F_GETFL and F_SETFL take plain integer arguments.
        unsafe {
            if libc::fcntl(fd, libc::F_SETOWN, libc::getpid()) < 0 {
                return Err(io::Error::last_os_error().into());
            }
            let flags = libc::fcntl(fd, libc::F_GETFL);
            if flags < 0 || libc::fcntl(fd, libc::F_SETFL, flags | libc::O_ASYNC) < 0 {
                return Err(io::Error::last_os_error().into());
            }
        }

        tracing::info!("SIGIO completion armed on {}", device.display());

        Ok(Self {
            _device: file,
            path: device.to_path_buf(),
            wait_set: signal_set(&[libc::SIGIO, libc::SIGINT]),
            saved_mask: None,
            completions: 0,
        })
    }

    /// Completions observed through this wait
    pub const fn completions(&self) -> u64 {
        self.completions
    }

    fn restore_mask(&mut self) {
        if let Some(old) = self.saved_mask.take() {
            // SAFETY: old was filled in by pthread_sigmask in arm().
            let rc = unsafe { libc::pthread_sigmask(libc::SIG_SETMASK, &old, std::ptr::null_mut()) };
            if rc != 0 {
                tracing::error!(
                    "Failed to restore signal mask: {}",
                    io::Error::from_raw_os_error(rc)
                );
            }
        }
    }
}

impl CompletionWait for SignalWait {
    fn arm(&mut self) -> Result<()> {
        if self.saved_mask.is_some() {
            return Ok(());
        }
        let mut old = MaybeUninit::<libc::sigset_t>::uninit();
        // SAFETY: wait_set is initialised; old is written by the call.
        let rc = unsafe { libc::pthread_sigmask(libc::SIG_BLOCK, &self.wait_set, old.as_mut_ptr()) };
        if rc != 0 {
            return Err(io::Error::from_raw_os_error(rc).into());
        }
        // SAFETY: pthread_sigmask succeeded, so old is initialised.
        self.saved_mask = Some(unsafe { old.assume_init() });
        Ok(())
    }

    fn wait(&mut self, _bus: &dyn RegisterBus) -> Result<u64> {
        if self.saved_mask.is_none() {
            return Err(DkstrError::protocol_violation(
                "signal wait entered without arm()",
            ));
        }

        let outcome = loop {
            // SAFETY: wait_set is initialised; a null siginfo pointer is allowed.
            let sig = unsafe { libc::sigwaitinfo(&self.wait_set, std::ptr::null_mut()) };
            match sig {
                libc::SIGIO => break Ok(0),
                libc::SIGINT => break Err(DkstrError::Interrupted),
                -1 => {
                    let e = io::Error::last_os_error();
                    if e.kind() != io::ErrorKind::Interrupted {
                        break Err(e.into());
                    }
                }
                other => tracing::debug!("Ignoring signal {other} during wait"),
            }
        };

        self.restore_mask();
        if outcome.is_ok() {
            self.completions += 1;
        }
        outcome
    }

    fn disarm(&mut self) {
        self.restore_mask();
    }

    fn mode(&self) -> WaitMode {
        WaitMode::Interrupt
    }
}

impl Drop for SignalWait {
    fn drop(&mut self) {
        self.restore_mask();
    }
}

impl fmt::Debug for SignalWait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalWait")
            .field("device", &self.path)
            .field("armed", &self.saved_mask.is_some())
            .field("completions", &self.completions)
            .finish_non_exhaustive()
    }
}

fn install_handler() -> Result<()> {
    // SAFETY: an all-zero sigaction is a valid starting value; the handler
    // only touches an atomic, which is async-signal-safe.
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = on_sigio as extern "C" fn(libc::c_int) as libc::sighandler_t;
        libc::sigemptyset(&mut action.sa_mask);
        action.sa_flags = libc::SA_RESTART;
        if libc::sigaction(libc::SIGIO, &action, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error().into());
        }
    }
    Ok(())
}

fn signal_set(signals: &[libc::c_int]) -> libc::sigset_t {
    let mut set = MaybeUninit::<libc::sigset_t>::uninit();
    // SAFETY: sigemptyset fully initialises the set before sigaddset reads it.
    unsafe {
        libc::sigemptyset(set.as_mut_ptr());
        for &s in signals {
            libc::sigaddset(set.as_mut_ptr(), s);
        }
        set.assume_init()
    }
}

/// Interrupt count reported by the kernel driver's status file
/// (`dkstr_int: interrupt count: N`).
///
/// # Errors
///
/// Returns error if the file cannot be read or does not end in a number.
pub fn read_interrupt_count(status: &Path) -> Result<u64> {
    let text = std::fs::read_to_string(status)?;
    text.split_whitespace()
        .last()
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| {
            DkstrError::hardware_unavailable(format!(
                "{}: unexpected contents {:?}",
                status.display(),
                text.trim()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::SimulatedAccelerator;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_status_file() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "dkstr_int: interrupt count: 42").unwrap();
        assert_eq!(read_interrupt_count(f.path()).unwrap(), 42);
    }

    #[test]
    fn rejects_garbage_status() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "dkstr_int: offline").unwrap();
        assert!(read_interrupt_count(f.path()).is_err());
    }

    #[test]
    fn missing_device_is_unavailable() {
        let err = SignalWait::open(Path::new("/nonexistent/dkstr_int")).unwrap_err();
        assert!(matches!(err, DkstrError::HardwareUnavailable { .. }));
    }

    #[test]
    fn wait_without_arm_is_refused() {
        let f = NamedTempFile::new().unwrap();
        let mut w = SignalWait::open(f.path()).unwrap();
        let bus = SimulatedAccelerator::new(4);
        assert!(matches!(
            w.wait(&bus),
            Err(DkstrError::ProtocolViolation { .. })
        ));
    }

    #[test]
    fn armed_sigio_completes_wait() {
        let f = NamedTempFile::new().unwrap();
        let mut w = SignalWait::open(f.path()).unwrap();
        let bus = SimulatedAccelerator::new(4);
        w.arm().unwrap();
        // thread-directed, so only this test's thread sees it
        unsafe { libc::raise(libc::SIGIO) };
        assert_eq!(w.wait(&bus).unwrap(), 0);
        assert_eq!(w.completions(), 1);
    }

    fn blocked_on_this_thread(signo: libc::c_int) -> bool {
        let mut current = MaybeUninit::<libc::sigset_t>::uninit();
        unsafe {
            libc::pthread_sigmask(libc::SIG_BLOCK, std::ptr::null(), current.as_mut_ptr());
            libc::sigismember(current.as_ptr(), signo) == 1
        }
    }

    #[test]
    fn disarm_restores_signal_mask() {
        let f = NamedTempFile::new().unwrap();
        let mut w = SignalWait::open(f.path()).unwrap();
        let bus = SimulatedAccelerator::new(4);
        assert!(!blocked_on_this_thread(libc::SIGINT));

        w.arm().unwrap();
        assert!(blocked_on_this_thread(libc::SIGINT));
        assert!(blocked_on_this_thread(libc::SIGIO));
        w.disarm();
        assert!(!blocked_on_this_thread(libc::SIGINT));
        assert!(!blocked_on_this_thread(libc::SIGIO));

        // nothing armed any more, and the next arm starts clean
        assert!(matches!(
            w.wait(&bus),
            Err(DkstrError::ProtocolViolation { .. })
        ));
        w.arm().unwrap();
        assert!(blocked_on_this_thread(libc::SIGINT));
        w.disarm();
    }

    #[test]
    fn sigint_interrupts_wait() {
        let f = NamedTempFile::new().unwrap();
        let mut w = SignalWait::open(f.path()).unwrap();
        let bus = SimulatedAccelerator::new(4);
        w.arm().unwrap();
        unsafe { libc::raise(libc::SIGINT) };
        assert!(matches!(w.wait(&bus), Err(DkstrError::Interrupted)));
        assert_eq!(w.completions(), 0);
    }
}
