//! confstore - file-backed, cross-process-locked key-path store
//!
//! A nested string-keyed configuration tree persisted to a single file inside
//! a per-application config directory. Cross-process mutual exclusion is
//! cooperative: an advisory lockfile whose content is the owning process id
//! serializes read-modify-write cycles between cooperating processes.
//!
//! The store is synchronous and single-threaded per process; concurrency
//! exists only *across* process instances, via the filesystem.

pub mod lock;
pub mod platform;
pub mod store;
pub mod tree;

pub use lock::{LockError, LockState, ProcessLock};
pub use platform::{config_prefix, PlatformError};
pub use store::{BackendError, ConfigBackend, ConfigStore, JsonBackend, StoreError, LOCKFILE_NAME};
pub use tree::{get_path, set_path, TreeError};
