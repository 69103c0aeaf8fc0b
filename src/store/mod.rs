//! Lock-guarded configuration store
//!
//! `ConfigStore` owns the in-memory config tree and orchestrates every
//! operation as lock → read → mutate → write → unlock. Persistence goes
//! through the injected [`ConfigBackend`] capability; [`JsonBackend`] is the
//! concrete variant shipped with the crate.
//!
//! The lock protocol is deliberately forgiving: `get` and `set` carry on with
//! the current in-memory tree when `pull` fails, and `push` reports the
//! writer's result even when releasing the lock fails afterwards. Every
//! swallowed failure leaves a warn-level diagnostic.

mod json;

pub use json::JsonBackend;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::lock::ProcessLock;
use crate::platform::{self, PlatformError};
use crate::tree::{self, TreeError};

/// Lockfile name inside every config directory.
pub const LOCKFILE_NAME: &str = "confstore.lock";

/// Errors from backend read/write operations
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors surfaced by store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another process holds the lock, or taking it failed.
    #[error("config store lock is unavailable")]
    LockUnavailable,

    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),

    #[error("path accessor failure: {0}")]
    Tree(#[from] TreeError),

    #[error("failed to prepare config directory: {0}")]
    Io(#[from] io::Error),

    #[error("platform resolution failed: {0}")]
    Platform(#[from] PlatformError),
}

/// Reader/Writer capability for the backing data file.
///
/// Implementations decide the file name and format inside the config
/// directory. Failures are logged where they happen and returned as values;
/// the store never panics on a backend failure.
pub trait ConfigBackend {
    /// Load the backing file into a config tree.
    fn read(&self, config_dir: &Path) -> Result<Value, BackendError>;

    /// Persist the config tree to the backing file.
    fn write(&self, config_dir: &Path, tree: &Value) -> Result<(), BackendError>;
}

/// File-backed, cross-process-locked key-path store.
///
/// Construction creates `base/name` as the config directory (idempotent) and
/// fixes this instance's process id; the lockfile lives next to the data file
/// as `confstore.lock`.
pub struct ConfigStore<B: ConfigBackend> {
    config_dir: PathBuf,
    lock: ProcessLock,
    tree: Value,
    backend: B,
}

impl<B: ConfigBackend> ConfigStore<B> {
    /// Create a store rooted at `base_dir/name`, creating the directory if
    /// absent. The instance is owned by the current OS process.
    pub fn new(name: &str, base_dir: &Path, backend: B) -> Result<Self, StoreError> {
        let config_dir = base_dir.join(name);
        fs::create_dir_all(&config_dir)?;
        let lock = ProcessLock::for_current_process(config_dir.join(LOCKFILE_NAME));
        Ok(Self {
            config_dir,
            lock,
            tree: Value::Object(Map::new()),
            backend,
        })
    }

    /// Create a store under the platform's per-user config root.
    pub fn open(name: &str, backend: B) -> Result<Self, StoreError> {
        let base = platform::config_prefix()?;
        Self::new(name, &base, backend)
    }

    /// Replace the process id used for lock ownership.
    ///
    /// Lets tests and supervisors model several cooperating instances inside
    /// one OS process; each store keeps exactly one lock handle either way.
    pub fn with_process_id(mut self, process_id: impl Into<String>) -> Self {
        self.lock = ProcessLock::new(self.lock.path().to_path_buf(), process_id);
        self
    }

    /// The directory holding the data file and lockfile.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// The current in-memory tree.
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Take the lock and load the tree from the backend.
    ///
    /// Fails without reading when another process holds the lock or the lock
    /// cannot be taken. On a read failure the lock stays held and the
    /// previous in-memory tree is kept; a fresh store therefore still exposes
    /// an empty tree when no data file exists yet.
    pub fn pull(&mut self) -> Result<(), StoreError> {
        if self.lock.is_held_by_other() {
            warn!(
                dir = %self.config_dir.display(),
                "config store is locked by another process"
            );
            return Err(StoreError::LockUnavailable);
        }
        if self.lock.acquire().is_err() {
            // Details are logged by the lock itself.
            return Err(StoreError::LockUnavailable);
        }
        self.tree = self.backend.read(&self.config_dir)?;
        Ok(())
    }

    /// Write the tree through the backend and drop the lock.
    ///
    /// Fails without writing when another process holds the lock. The lock is
    /// released regardless of the write outcome, and the reported result is
    /// the writer's result; a release failure is only logged.
    pub fn push(&mut self) -> Result<(), StoreError> {
        if self.lock.is_held_by_other() {
            warn!(
                dir = %self.config_dir.display(),
                "config store is locked by another process"
            );
            return Err(StoreError::LockUnavailable);
        }
        let written = self.backend.write(&self.config_dir, &self.tree);
        // Release failures are logged by the lock; push reports the write result.
        let _ = self.lock.release();
        Ok(written?)
    }

    /// Read the value at `path` through a full pull/push cycle.
    ///
    /// The pull result is not consulted: when it fails, the lookup runs
    /// against the current in-memory tree. `push` is always attempted so the
    /// lock is dropped even when the lookup misses.
    pub fn get<S: AsRef<str>>(&mut self, path: &[S]) -> Result<Value, StoreError> {
        let _ = self.pull();
        let found = tree::get_path(&self.tree, path).cloned();
        let _ = self.push();
        Ok(found?)
    }

    /// Assign `value` at `path` through a full pull/push cycle, creating
    /// intermediate branches.
    ///
    /// An empty path fails with [`TreeError::InvalidPath`] before any lock or
    /// I/O activity. The pull result is not consulted; the reported result is
    /// the push result.
    pub fn set<S: AsRef<str>>(&mut self, path: &[S], value: Value) -> Result<(), StoreError> {
        if path.is_empty() {
            return Err(StoreError::Tree(TreeError::InvalidPath));
        }
        let _ = self.pull();
        tree::set_path(&mut self.tree, path, value)?;
        self.push()
    }

    /// Typed read: [`ConfigStore::get`] plus deserialization.
    pub fn get_as<T: DeserializeOwned, S: AsRef<str>>(
        &mut self,
        path: &[S],
    ) -> Result<T, StoreError> {
        let value = self.get(path)?;
        Ok(serde_json::from_value(value).map_err(BackendError::Parse)?)
    }

    /// Typed write: serialization plus [`ConfigStore::set`].
    pub fn set_as<T: Serialize, S: AsRef<str>>(
        &mut self,
        path: &[S],
        value: &T,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(BackendError::Parse)?;
        self.set(path, value)
    }
}
