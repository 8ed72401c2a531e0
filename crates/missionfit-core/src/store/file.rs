use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::StorageBackend;
use crate::error::Result;
use crate::task::{self, NewTask, Task};

use super::TaskStore;

/// The whole collection as one pretty-printed JSON array on disk.
///
/// Every mutation reads the file, changes the list in memory and rewrites
/// the file through `atomic_write`. The mutex serializes that cycle for all
/// callers sharing this value; separate processes still race.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Vec<Task> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "task file unreadable, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&data) {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "task file is not a task array, treating as empty");
                Vec::new()
            }
        }
    }

    fn write(&self, tasks: &[Task]) -> Result<()> {
        let data = serde_json::to_string_pretty(tasks)?;
        crate::io::atomic_write(&self.path, data.as_bytes())
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut Vec<Task>) -> Result<T>) -> Result<T> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut tasks = self.read();
        let out = f(&mut tasks)?;
        self.write(&tasks)?;
        Ok(out)
    }
}

impl TaskStore for JsonFileStore {
    fn list(&self) -> Vec<Task> {
        self.read()
    }

    fn create(&self, new: NewTask) -> Result<Task> {
        self.mutate(|tasks| Ok(task::create_task(tasks, new)))
    }

    fn update(&self, updated: Task) -> Result<Task> {
        // replace_task errors before anything is written
        self.mutate(|tasks| {
            task::replace_task(tasks, updated.clone())?;
            Ok(updated)
        })
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.mutate(|tasks| {
            let removed = task::remove_task(tasks, id);
            tracing::debug!(id, removed, "deleted task");
            Ok(())
        })
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Json
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
