//! Advisory locking of the data directory.
//!
//! The CLI and the daemon may both mutate the saved links. Each
//! read-modify-write cycle holds an exclusive `flock()` on a lock file in the
//! base directory, so neither sees the other's half-applied state.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

const LOCK_FILE_NAME: &str = "linkshelf.lock";

/// A held file lock that releases on drop
pub struct FileLock {
    #[allow(dead_code)]
    file: File,
}

impl FileLock {
    fn open(base_path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(base_path.join(LOCK_FILE_NAME))
    }

    /// Acquire the lock, blocking until available.
    pub fn acquire_blocking(base_path: &Path) -> io::Result<Self> {
        let file = Self::open(base_path)?;
        Self::lock_exclusive(&file)?;
        Ok(FileLock { file })
    }

    #[cfg(unix)]
    fn lock_exclusive(file: &File) -> io::Result<()> {
        let fd = file.as_raw_fd();
        let result = unsafe { libc::flock(fd, libc::LOCK_EX) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    // TODO: LockFileEx on windows, until then there is no cross-process protection
    #[cfg(not(unix))]
    fn lock_exclusive(_file: &File) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(unix)]
impl Drop for FileLock {
    fn drop(&mut self) {
        let fd = self.file.as_raw_fd();
        // Release the lock - ignore errors on drop
        unsafe { libc::flock(fd, libc::LOCK_UN) };
    }
}
