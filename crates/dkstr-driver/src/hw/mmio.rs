//! Memory-mapped physical register window
//!
//! One 4 KiB window of physical address space mapped through `/dev/mem`
//! (opened `O_SYNC` so the kernel maps it uncached). All access is
//! bounds-checked and volatile; the unsafe surface is confined to this file.

use crate::error::{DkstrError, Result};
use rustix::fd::OwnedFd;
use rustix::fs::{open, Mode, OFlags};
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// A mapped window of device memory.
#[derive(Debug)]
pub struct MmapRegion {
    ptr: NonNull<u8>,
    size: usize,
    _fd: OwnedFd,
    device: PathBuf,
    phys_addr: u64,
}

impl MmapRegion {
    /// Map `size` bytes at physical address `phys_addr` of `device`.
    ///
    /// # Errors
    ///
    /// Returns [`DkstrError::HardwareUnavailable`] if the device cannot be
    /// opened (usually missing root) or the mapping is refused.
    pub fn new(device: &Path, phys_addr: u64, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(DkstrError::hardware_unavailable("zero-sized window"));
        }

        tracing::debug!("Mapping {size:#x} bytes at {phys_addr:#x} via {}", device.display());

        let fd = open(device, OFlags::RDWR | OFlags::SYNC | OFlags::CLOEXEC, Mode::empty())
            .map_err(|e| {
                DkstrError::hardware_unavailable(format!(
                    "Cannot open {}: {e}. Running as root?",
                    device.display()
                ))
            })?;

        // SAFETY: mmap is unsafe but we validate all preconditions:
        // - fd is valid (just opened) and kept alive in the struct
        // - size is non-zero (checked above)
        // - PROT_READ|PROT_WRITE with MAP_SHARED is the only sensible MMIO mapping
        // - phys_addr page alignment is enforced by the kernel (EINVAL otherwise)
        // - the mapping is released in Drop with the same size
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                &fd,
                phys_addr,
            )
        }
        .map_err(|e| {
            DkstrError::hardware_unavailable(format!("mmap of {phys_addr:#x} failed: {e}"))
        })?;

        let ptr = NonNull::new(ptr.cast::<u8>())
            .ok_or_else(|| DkstrError::hardware_unavailable("mmap returned null"))?;

        tracing::info!("Mapped {size:#x} bytes at {phys_addr:#x} ({ptr:p})");

        Ok(Self {
            ptr,
            size,
            _fd: fd,
            device: device.to_path_buf(),
            phys_addr,
        })
    }

    /// Read the 32-bit word at byte `offset`.
    ///
    /// # Errors
    ///
    /// Returns error if `offset` is misaligned or out of bounds.
    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        self.check(offset, "read")?;

        // SAFETY: Volatile read from a mapped device register.
        // - offset + 4 <= size and offset is 4-aligned (checked above)
        // - ptr is valid for the lifetime of self (mapping released in Drop)
        // - volatile: hardware may change the value between reads
        #[allow(clippy::cast_ptr_alignment)]
        let value = unsafe { self.ptr.as_ptr().add(offset).cast::<u32>().read_volatile() };

        tracing::trace!("{:#x}+{offset:#x} -> {value:#x}", self.phys_addr);
        Ok(value)
    }

    /// Write the 32-bit word at byte `offset`.
    ///
    /// # Errors
    ///
    /// Returns error if `offset` is misaligned or out of bounds.
    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<()> {
        self.check(offset, "write")?;

        tracing::trace!("{:#x}+{offset:#x} <- {value:#x}", self.phys_addr);

        // SAFETY: Volatile write to a mapped device register.
        // - offset + 4 <= size and offset is 4-aligned (checked above)
        // - ptr is valid for the lifetime of self
        // - volatile: writes trigger hardware side effects and must not be elided
        #[allow(clippy::cast_ptr_alignment)]
        unsafe {
            self.ptr
                .as_ptr()
                .add(offset)
                .cast::<u32>()
                .write_volatile(value);
        }
        Ok(())
    }

    /// Window size in bytes
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Physical base address
    pub const fn phys_addr(&self) -> u64 {
        self.phys_addr
    }

    /// Device the window was mapped from
    pub fn device(&self) -> &Path {
        &self.device
    }

    fn check(&self, offset: usize, op: &str) -> Result<()> {
        if offset % 4 != 0 || offset + 4 > self.size {
            return Err(DkstrError::transfer_failed(format!(
                "Bad {op}: offset={offset:#x}, size=4, limit={:#x}",
                self.size
            )));
        }
        Ok(())
    }
}

impl Drop for MmapRegion {
    fn drop(&mut self) {
        tracing::debug!("Unmapping {:#x} ({:#x} bytes)", self.phys_addr, self.size);

        // SAFETY: ptr and size are exactly what mmap returned/was given in new(),
        // and no references into the mapping outlive self.
        unsafe {
            if let Err(e) = munmap(self.ptr.as_ptr().cast(), self.size) {
                tracing::error!("munmap failed during drop: {e}");
            }
        }
    }
}

// SAFETY: MmapRegion exclusively owns its mapping; moving it to another thread
// does not invalidate the pointer, and the fd is kept open alongside.
unsafe impl Send for MmapRegion {}

// SAFETY: writes need &mut self; concurrent &self reads are bounds-checked
// volatile loads from device memory.
unsafe impl Sync for MmapRegion {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_device_is_unavailable() {
        let err = MmapRegion::new(Path::new("/nonexistent/dkstr-mem"), 0x4000_0000, 0x1000)
            .unwrap_err();
        assert!(matches!(err, DkstrError::HardwareUnavailable { .. }));
    }

    #[test]
    fn zero_size_is_refused() {
        let err = MmapRegion::new(Path::new("/dev/mem"), 0, 0).unwrap_err();
        assert!(matches!(err, DkstrError::HardwareUnavailable { .. }));
    }

    #[test]
    fn file_backed_window_reads_and_writes() {
        // a regular file stands in for /dev/mem
        let f = tempfile::NamedTempFile::new().unwrap();
        f.as_file().set_len(0x1000).unwrap();
        let mut region = MmapRegion::new(f.path(), 0, 0x1000).unwrap();
        region.write_u32(0x10, 0xDEAD_0001).unwrap();
        assert_eq!(region.read_u32(0x10).unwrap(), 0xDEAD_0001);
        assert!(region.read_u32(0x1000).is_err());
        assert!(region.write_u32(0x2, 0).is_err());
    }
}
