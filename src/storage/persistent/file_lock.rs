//! Advisory lock held while a snapshot is being written.
//!
//! The lock lives in a sidecar file next to the snapshot (`pairbook.json.lock`)
//! so the snapshot itself can be replaced by rename while the lock is held.
//! The lock is released when [`FileLock`] is dropped.

use std::fs::{File, OpenOptions};
use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::path::{Path, PathBuf};

/// Guard over the `.lock` file of one snapshot; only one writer at a time.
#[derive(Debug)]
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

impl FileLock {
    /// Path of the lock file guarding `snapshot`.
    #[must_use]
    pub fn lock_path_for(snapshot: &Path) -> PathBuf {
        let mut name = snapshot.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".lock");
        snapshot.with_file_name(name)
    }

    /// Claims the write lock for `snapshot` without waiting.
    ///
    /// # Errors
    /// `ErrorKind::WouldBlock` when some other save holds the lock. Failing to
    /// open the lock file is returned as is.
    pub fn acquire(snapshot: &Path) -> IoResult<Self> {
        let lock_path = Self::lock_path_for(snapshot);

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        Self::try_lock(&file)?;

        Ok(Self {
            _file: file,
            path: lock_path,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(unix)]
    fn try_lock(file: &File) -> IoResult<()> {
        use std::os::unix::io::AsRawFd;

        // SAFETY: the descriptor belongs to `file`, which outlives the call.
        if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) } == 0 {
            return Ok(());
        }
        match IoError::last_os_error() {
            busy if busy.raw_os_error() == Some(libc::EWOULDBLOCK) => {
                Err(IoError::new(ErrorKind::WouldBlock, "another save is in progress"))
            }
            other => Err(other),
        }
    }

    #[cfg(windows)]
    fn try_lock(file: &File) -> IoResult<()> {
        use std::os::windows::io::AsRawHandle;
        use windows_sys::Win32::Foundation::HANDLE;
        use windows_sys::Win32::Storage::FileSystem::{LockFileEx, LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY};

        // SAFETY: the handle belongs to `file`; a zeroed OVERLAPPED locks from offset 0.
        let locked = unsafe {
            let mut from_start = std::mem::zeroed::<windows_sys::Win32::System::IO::OVERLAPPED>();
            LockFileEx(
                file.as_raw_handle() as HANDLE,
                LOCKFILE_EXCLUSIVE_LOCK | LOCKFILE_FAIL_IMMEDIATELY,
                0,
                1,
                0,
                &mut from_start,
            )
        };
        if locked != 0 {
            return Ok(());
        }
        let cause = IoError::last_os_error();
        Err(IoError::new(ErrorKind::WouldBlock, format!("another save is in progress ({cause})")))
    }

    #[cfg(not(any(unix, windows)))]
    fn try_lock(_file: &File) -> IoResult<()> {
        tracing::warn!("no advisory locks here, saving unguarded");
        Ok(())
    }
}
