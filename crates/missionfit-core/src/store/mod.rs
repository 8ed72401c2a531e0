//! Task persistence.
//!
//! Provides the `TaskStore` trait and its two backends:
//!
//! * [`JsonFileStore`] keeps the whole collection in one JSON array and
//!   rewrites it on every mutation. Writers inside one process are
//!   serialized; across processes the last writer wins.
//! * [`TaskDb`] keeps one redb key per task, so each create / update /
//!   delete is a single atomic write transaction.
//!
//! Both backends share the same contract: `list` never fails (unreadable
//! storage reads as empty), `update` on an unknown id reports
//! `TaskNotFound` without writing, `delete` always succeeds for unknown ids,
//! and write failures propagate.

pub mod db;
pub mod file;

pub use db::TaskDb;
pub use file::JsonFileStore;

use std::path::Path;

use crate::config::{Config, StorageBackend};
use crate::error::Result;
use crate::task::{NewTask, Task};

pub trait TaskStore: Send + Sync {
    /// All tasks in insertion order. Empty if storage is absent or unreadable.
    fn list(&self) -> Vec<Task>;

    /// Assign a fresh id, persist, and return the stored record.
    fn create(&self, new: NewTask) -> Result<Task>;

    /// Replace the record with the same id wholesale.
    fn update(&self, task: Task) -> Result<Task>;

    /// Remove every record with this id. Unknown ids are not an error.
    fn delete(&self, id: &str) -> Result<()>;

    fn backend(&self) -> StorageBackend;
}

/// Open the backend selected in `config`, with paths resolved against `root`.
pub fn open(config: &Config, root: &Path) -> Result<Box<dyn TaskStore>> {
    let path = config.tasks_path(root);
    tracing::debug!(backend = %config.storage.backend, path = %path.display(), "opening task store");
    match config.storage.backend {
        StorageBackend::Json => Ok(Box::new(JsonFileStore::new(path))),
        StorageBackend::Redb => Ok(Box::new(TaskDb::open(&path)?)),
    }
}

// ---------------------------------------------------------------------------
// Contract tests, run against both backends
// ---------------------------------------------------------------------------
