//! Advisory process lockfile
//!
//! Mutual exclusion between cooperating processes is keyed on a single
//! lockfile: its existence means the lock is held, and its content is the
//! decimal process id of the owner (one line, nothing else). Creation uses
//! the filesystem's atomic create-new, which is the sole serialization point
//! between processes.
//!
//! Ownership is decided by id string equality alone; the lock never probes
//! whether the recorded process is still alive. A lockfile orphaned by a
//! crash therefore blocks every acquirer until it is removed by hand.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

/// Errors from lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// The lockfile already exists, so exclusive creation cannot proceed.
    #[error("lockfile already exists: {0}")]
    AlreadyLocked(PathBuf),

    /// The lockfile records a process id other than this instance's.
    #[error("lock held by another process: {0}")]
    HeldByOther(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Observed ownership of the lockfile, from this instance's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No lockfile exists.
    Free,
    /// The lockfile records this instance's process id.
    HeldBySelf,
    /// The lockfile exists with a foreign id, or could not be read.
    HeldByOther,
}

/// Advisory exclusive lock on a lockfile path.
///
/// Each instance carries its own process id, fixed at construction; there is
/// no process-wide lock registry. Acquire and release are single attempts
/// with no retry, wait, or timeout.
#[derive(Debug)]
pub struct ProcessLock {
    lock_path: PathBuf,
    process_id: String,
}

impl ProcessLock {
    /// Create a lock handle with an explicit process id.
    pub fn new(lock_path: impl Into<PathBuf>, process_id: impl Into<String>) -> Self {
        Self {
            lock_path: lock_path.into(),
            process_id: process_id.into(),
        }
    }

    /// Create a lock handle owned by the current OS process.
    pub fn for_current_process(lock_path: impl Into<PathBuf>) -> Self {
        Self::new(lock_path, std::process::id().to_string())
    }

    /// The lockfile path.
    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    /// The process id this handle writes into the lockfile.
    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    /// Inspect the lockfile and classify its ownership.
    ///
    /// An unreadable lockfile is reported as [`LockState::HeldByOther`]: when
    /// in doubt, assume someone else holds the lock rather than clobber it.
    pub fn state(&self) -> LockState {
        if !self.lock_path.is_file() {
            return LockState::Free;
        }
        match fs::read_to_string(&self.lock_path) {
            Ok(content) => {
                let owner = content.lines().next().unwrap_or("");
                if owner == self.process_id {
                    LockState::HeldBySelf
                } else {
                    LockState::HeldByOther
                }
            }
            Err(err) => {
                warn!(
                    path = %self.lock_path.display(),
                    %err,
                    "could not read lockfile, treating as held"
                );
                LockState::HeldByOther
            }
        }
    }

    /// Whether a process other than this instance holds the lock.
    pub fn is_held_by_other(&self) -> bool {
        self.state() == LockState::HeldByOther
    }

    /// Take the lock: create the lockfile exclusively and record our id.
    ///
    /// Fails if the lockfile already exists, regardless of who owns it;
    /// acquiring is not reentrant. Losing the create race to another process
    /// is reported the same way. A single attempt, no waiting.
    pub fn acquire(&self) -> Result<(), LockError> {
        if self.lock_path.is_file() {
            warn!(path = %self.lock_path.display(), "lockfile already exists");
            return Err(LockError::AlreadyLocked(self.lock_path.clone()));
        }
        let created = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)
            .and_then(|mut file| file.write_all(self.process_id.as_bytes()));
        match created {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                warn!(path = %self.lock_path.display(), "lost creation race for lockfile");
                Err(LockError::AlreadyLocked(self.lock_path.clone()))
            }
            Err(err) => {
                warn!(path = %self.lock_path.display(), %err, "failed to create lockfile");
                Err(LockError::Io(err))
            }
        }
    }

    /// Drop the lock: delete the lockfile.
    ///
    /// Refuses to remove a lockfile recording a foreign id. Removing a
    /// lockfile that does not exist is an I/O failure, as is any other
    /// deletion error.
    pub fn release(&self) -> Result<(), LockError> {
        if self.is_held_by_other() {
            warn!(path = %self.lock_path.display(), "lock held by another process");
            return Err(LockError::HeldByOther(self.lock_path.clone()));
        }
        fs::remove_file(&self.lock_path).map_err(|err| {
            warn!(path = %self.lock_path.display(), %err, "failed to remove lockfile");
            LockError::Io(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lock_in(dir: &TempDir, pid: &str) -> ProcessLock {
        ProcessLock::new(dir.path().join("test.lock"), pid)
    }

    #[test]
    fn test_acquire_writes_pid_as_content() {
        let dir = TempDir::new().unwrap();
        let lock = lock_in(&dir, "1234");

        lock.acquire().unwrap();

        assert_eq!(fs::read_to_string(lock.path()).unwrap(), "1234");
        assert_eq!(lock.state(), LockState::HeldBySelf);
    }

    #[test]
    fn test_state_free_when_no_lockfile() {
        let dir = TempDir::new().unwrap();
        let lock = lock_in(&dir, "1234");

        assert_eq!(lock.state(), LockState::Free);
        assert!(!lock.is_held_by_other());
    }

    #[test]
    fn test_foreign_pid_means_held_by_other() {
        let dir = TempDir::new().unwrap();
        let lock = lock_in(&dir, "1234");
        fs::write(lock.path(), "9999").unwrap();

        assert_eq!(lock.state(), LockState::HeldByOther);
    }

    #[test]
    fn test_empty_lockfile_means_held_by_other() {
        let dir = TempDir::new().unwrap();
        let lock = lock_in(&dir, "1234");
        fs::write(lock.path(), "").unwrap();

        assert_eq!(lock.state(), LockState::HeldByOther);
    }

    #[test]
    fn test_acquire_fails_on_existing_lockfile_and_preserves_content() {
        let dir = TempDir::new().unwrap();
        let lock = lock_in(&dir, "1234");
        fs::write(lock.path(), "9999").unwrap();

        let err = lock.acquire().unwrap_err();
        assert!(matches!(err, LockError::AlreadyLocked(_)));
        assert_eq!(fs::read_to_string(lock.path()).unwrap(), "9999");
    }

    #[test]
    fn test_acquire_not_reentrant() {
        let dir = TempDir::new().unwrap();
        let lock = lock_in(&dir, "1234");

        lock.acquire().unwrap();
        let err = lock.acquire().unwrap_err();
        assert!(matches!(err, LockError::AlreadyLocked(_)));
    }

    #[test]
    fn test_release_removes_own_lockfile() {
        let dir = TempDir::new().unwrap();
        let lock = lock_in(&dir, "1234");

        lock.acquire().unwrap();
        lock.release().unwrap();

        assert!(!lock.path().exists());
        assert_eq!(lock.state(), LockState::Free);
    }

    #[test]
    fn test_release_refuses_foreign_lockfile() {
        let dir = TempDir::new().unwrap();
        let lock = lock_in(&dir, "1234");
        fs::write(lock.path(), "9999").unwrap();

        let err = lock.release().unwrap_err();
        assert!(matches!(err, LockError::HeldByOther(_)));
        assert_eq!(fs::read_to_string(lock.path()).unwrap(), "9999");
    }

    #[test]
    fn test_release_without_lockfile_is_io_error() {
        let dir = TempDir::new().unwrap();
        let lock = lock_in(&dir, "1234");

        let err = lock.release().unwrap_err();
        assert!(matches!(err, LockError::Io(_)));
    }

    #[test]
    fn test_two_instances_exclusive_create() {
        let dir = TempDir::new().unwrap();
        let first = lock_in(&dir, "1111");
        let second = lock_in(&dir, "2222");

        first.acquire().unwrap();
        assert!(second.acquire().is_err());
        assert!(second.is_held_by_other());
        // Owner content is still the winner's.
        assert_eq!(fs::read_to_string(first.path()).unwrap(), "1111");

        first.release().unwrap();
        second.acquire().unwrap();
        assert_eq!(fs::read_to_string(second.path()).unwrap(), "2222");
    }
}
