//! Memory protection for seed material
//!
//! Best-effort only. Containers and unprivileged users often cannot lock
//! pages or change rlimits, so failures are logged and ignored.

use std::sync::atomic::{AtomicBool, Ordering};

use zeroize::Zeroize;

static CORE_DUMPS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable core dumps for the current process so a crash never writes
/// a mnemonic or seed to disk. Call once at startup.
///
/// Returns `true` if core dumps are disabled after the call.
pub fn disable_core_dumps() -> bool {
    if CORE_DUMPS_DISABLED.swap(true, Ordering::SeqCst) {
        return true;
    }

    #[cfg(unix)]
    let disabled = unix::set_core_limit_zero();

    #[cfg(not(unix))]
    let disabled = {
        log::warn!("core dump prevention is not supported on this platform");
        false
    };

    if !disabled {
        CORE_DUMPS_DISABLED.store(false, Ordering::SeqCst);
    }
    disabled
}

/// Fixed-size heap buffer that is mlocked while alive and zeroized on drop.
pub struct LockedBuffer {
    data: Vec<u8>,
    locked: bool,
}

impl LockedBuffer {
    /// Allocate `len` zero bytes and try to lock them in RAM.
    pub fn new(len: usize) -> Self {
        let data = vec![0u8; len];
        let locked = data.is_empty() || lock(&data);
        if !locked {
            log::warn!("could not mlock {} bytes, secret may be swappable", len);
        }
        Self { data, locked }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the pages are actually locked
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl Drop for LockedBuffer {
    fn drop(&mut self) {
        self.data.as_mut_slice().zeroize();
        if self.locked && !self.data.is_empty() {
            unlock(&self.data);
        }
    }
}

#[cfg(unix)]
fn lock(data: &[u8]) -> bool {
    unix::mlock(data)
}

#[cfg(not(unix))]
fn lock(_data: &[u8]) -> bool {
    false
}

#[cfg(unix)]
fn unlock(data: &[u8]) {
    unix::munlock(data);
}

#[cfg(not(unix))]
fn unlock(_data: &[u8]) {}

#[cfg(unix)]
mod unix {
    pub fn set_core_limit_zero() -> bool {
        let rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: setrlimit only reads the struct we pass by reference
        let result = unsafe { libc::setrlimit(libc::RLIMIT_CORE, &rlim) };
        if result != 0 {
            log::warn!(
                "failed to disable core dumps: {}",
                std::io::Error::last_os_error()
            );
            return false;
        }
        true
    }

    pub fn mlock(data: &[u8]) -> bool {
        // SAFETY: the slice is a live allocation of exactly data.len() bytes
        let result = unsafe { libc::mlock(data.as_ptr() as *const libc::c_void, data.len()) };
        if result != 0 {
            log::debug!("mlock failed: {}", std::io::Error::last_os_error());
            return false;
        }
        true
    }

    pub fn munlock(data: &[u8]) {
        // SAFETY: same region that was passed to mlock
        unsafe {
            libc::munlock(data.as_ptr() as *const libc::c_void, data.len());
        }
    }
}
