//! Exclusive writer locks.
//!
//! A chain has exactly one writer. The file store enforces this across
//! processes with a non-blocking `flock` on a sibling `.lock` file; the
//! memory store uses a flag. The lock is held until the guard is dropped.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, StoreError};

/// Guard for the single-writer lock of one chain.
#[derive(Debug)]
pub struct WriterLock {
    held: Held,
}

#[derive(Debug)]
enum Held {
    // Closing the file releases the flock.
    File { _file: File, path: PathBuf },
    Flag(Arc<AtomicBool>),
}

impl WriterLock {
    /// Take the exclusive lock on `lock_path`, creating the file if needed.
    ///
    /// Fails with [`StoreError::WriterLocked`] when another handle, in this
    /// process or another, already holds it.
    pub fn acquire_file(lock_path: &Path) -> Result<Self> {
        if let Some(dir) = lock_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path)?;

        if !try_flock_exclusive(&file)? {
            return Err(StoreError::WriterLocked(lock_path.display().to_string()));
        }
        debug!(path = %lock_path.display(), "writer lock acquired");
        Ok(Self {
            held: Held::File {
                _file: file,
                path: lock_path.to_path_buf(),
            },
        })
    }

    /// Take the lock represented by `flag`, naming `location` on failure.
    pub(crate) fn acquire_flag(flag: &Arc<AtomicBool>, location: &str) -> Result<Self> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StoreError::WriterLocked(location.to_string()));
        }
        Ok(Self {
            held: Held::Flag(Arc::clone(flag)),
        })
    }
}

impl Drop for WriterLock {
    fn drop(&mut self) {
        match &self.held {
            Held::File { path, .. } => debug!(path = %path.display(), "writer lock released"),
            Held::Flag(flag) => flag.store(false, Ordering::Release),
        }
    }
}

/// Try to take an exclusive flock without blocking.
///
/// Returns `Ok(false)` if another open file description holds it.
fn try_flock_exclusive(file: &File) -> io::Result<bool> {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        // SAFETY: `file` owns a valid descriptor for the duration of the call.
        let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if result == 0 {
            return Ok(true);
        }
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(libc::EWOULDBLOCK) {
            return Ok(false);
        }
        Err(err)
    }
    #[cfg(not(unix))]
    {
        let _ = file;
        Ok(true)
    }
}
