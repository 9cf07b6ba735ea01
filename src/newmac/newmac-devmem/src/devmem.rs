use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::ptr::{self, NonNull};

use log::{debug, warn};
use newmac_core::constants::{MAP_BASE, MAP_SIZE};
use newmac_core::RegisterWindow;

use crate::{HostError, Result};

pub const DEV_MEM: &str = "/dev/mem";

/// Shared, uncached mapping of a physical window.
///
/// The controller sits on a 16-bit bus with its register offsets counted in
/// half-words, so register offset `n` is the `n`-th `u16` of the window.
/// The mapping is released when the value is dropped.
pub struct DevMem {
    base: NonNull<u16>,
    len: usize,
    _file: File,
}

impl DevMem {
    /// The LAN9221 window on this board
    pub fn board() -> Result<Self> {
        Self::open(DEV_MEM, MAP_BASE, MAP_SIZE)
    }

    pub fn open<P: AsRef<Path>>(path: P, phys: u64, len: usize) -> Result<Self> {
        let path = path.as_ref();
        // O_SYNC so that stores are not buffered on the way to the device
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(path)
            .map_err(|source| HostError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("{} opened", path.display());

        let map_failed = |source: std::io::Error| HostError::Map { phys, len, source };
        let offset = libc::off_t::try_from(phys).map_err(|_| {
            map_failed(std::io::Error::from_raw_os_error(libc::EOVERFLOW))
        })?;

        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                offset,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(map_failed(std::io::Error::last_os_error()));
        }
        let base = NonNull::new(addr as *mut u16)
            .ok_or_else(|| map_failed(std::io::Error::from_raw_os_error(libc::ENOMEM)))?;
        debug!("{:#010x} mapped at {:p}", phys, base);

        Ok(DevMem {
            base,
            len,
            _file: file,
        })
    }

    pub fn as_ptr(&self) -> *const u16 {
        self.base.as_ptr()
    }

    fn slot(&self, offset: usize) -> *mut u16 {
        assert!(
            offset < self.len / 2,
            "register offset {:#x} outside the {:#x} byte window",
            offset,
            self.len
        );
        unsafe { self.base.as_ptr().add(offset) }
    }
}

impl RegisterWindow for DevMem {
    fn read(&self, offset: usize) -> u16 {
        unsafe { ptr::read_volatile(self.slot(offset)) }
    }

    fn write(&mut self, offset: usize, value: u16) {
        unsafe { ptr::write_volatile(self.slot(offset), value) }
    }
}

impl Drop for DevMem {
    fn drop(&mut self) {
        let result = unsafe { libc::munmap(self.base.as_ptr() as *mut libc::c_void, self.len) };
        if result != 0 {
            warn!("munmap failed: {}", std::io::Error::last_os_error());
        }
    }
}
