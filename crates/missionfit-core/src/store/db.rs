//! Task storage on redb.
//!
//! # Table design
//!
//! ```text
//! TASKS: id (&str)  -> JSON { seq, id, title, completed, parentId? }
//! META:  "next_seq" -> u64
//! ```
//!
//! Every mutation is one write transaction touching one `TASKS` key (plus the
//! sequence counter on create), so concurrent writers cannot clobber each
//! other's records. `seq` is taken from the counter inside the same
//! transaction and restores insertion order on `list`, since keys are
//! random UUIDs.
//!
//! redb holds an exclusive file lock for as long as a handle is open, so a
//! second process (the CLI while `missionfit serve` runs) cannot open the
//! file. That handle opens detached: `list` reads as empty and every write
//! fails with [`MissionError::TaskDb`] naming the lock.

use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::config::StorageBackend;
use crate::error::{MissionError, Result};
use crate::task::{NewTask, Task};

use super::TaskStore;

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

const TASKS: TableDefinition<&str, &[u8]> = TableDefinition::new("tasks");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");
const NEXT_SEQ: &str = "next_seq";

#[derive(Serialize, Deserialize)]
struct StoredTask {
    seq: u64,
    #[serde(flatten)]
    task: Task,
}

fn db_err(e: impl std::fmt::Display) -> MissionError {
    MissionError::TaskDb(e.to_string())
}

// ---------------------------------------------------------------------------
// TaskDb
// ---------------------------------------------------------------------------

pub struct TaskDb {
    path: PathBuf,
    /// `None` when another process holds the file lock.
    db: Option<Database>,
}

impl TaskDb {
    /// Open or create the database at `path`, creating both tables so
    /// read transactions never see a missing table.
    ///
    /// A file already locked by another handle is not an error here; see the
    /// module docs.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            crate::io::ensure_dir(parent)?;
        }
        let db = match Database::create(path) {
            Ok(db) => db,
            Err(redb::DatabaseError::DatabaseAlreadyOpen) => {
                tracing::warn!(
                    path = %path.display(),
                    "task database locked by another process, opening detached"
                );
                return Ok(Self {
                    path: path.to_path_buf(),
                    db: None,
                });
            }
            Err(e) => return Err(db_err(e)),
        };
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(TASKS).map_err(db_err)?;
        wt.open_table(META).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self {
            path: path.to_path_buf(),
            db: Some(db),
        })
    }

    fn db(&self) -> Result<&Database> {
        self.db.as_ref().ok_or_else(|| {
            MissionError::TaskDb(format!(
                "{} is in use by another process (is `missionfit serve` running?)",
                self.path.display()
            ))
        })
    }

    fn try_list(&self) -> Result<Vec<Task>> {
        let rt = self.db()?.begin_read().map_err(db_err)?;
        let table = rt.open_table(TASKS).map_err(db_err)?;

        let mut stored = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, v) = entry.map_err(db_err)?;
            let record: StoredTask = serde_json::from_slice(v.value())?;
            stored.push(record);
        }
        stored.sort_by_key(|s| s.seq);
        Ok(stored.into_iter().map(|s| s.task).collect())
    }

    fn put(&self, task: &Task, must_exist: bool) -> Result<()> {
        let wt = self.db()?.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(TASKS).map_err(db_err)?;
            let existing_seq = match table.get(task.id.as_str()).map_err(db_err)? {
                Some(guard) => Some(serde_json::from_slice::<StoredTask>(guard.value())?.seq),
                None => None,
            };

            let seq = match existing_seq {
                Some(seq) => seq,
                // dropping `wt` without commit aborts the transaction
                None if must_exist => return Err(MissionError::TaskNotFound(task.id.clone())),
                None => {
                    let mut meta = wt.open_table(META).map_err(db_err)?;
                    let next = meta
                        .get(NEXT_SEQ)
                        .map_err(db_err)?
                        .map(|g| g.value())
                        .unwrap_or(0);
                    meta.insert(NEXT_SEQ, next + 1).map_err(db_err)?;
                    next
                }
            };

            let value = serde_json::to_vec(&StoredTask {
                seq,
                task: task.clone(),
            })?;
            table
                .insert(task.id.as_str(), value.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }
}

impl TaskStore for TaskDb {
    fn list(&self) -> Vec<Task> {
        self.try_list().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "task database unreadable, treating as empty");
            Vec::new()
        })
    }

    fn create(&self, new: NewTask) -> Result<Task> {
        let task = new.into_task();
        self.put(&task, false)?;
        Ok(task)
    }

    fn update(&self, task: Task) -> Result<Task> {
        self.put(&task, true)?;
        Ok(task)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let wt = self.db()?.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(TASKS).map_err(db_err)?;
            table.remove(id).map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Redb
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
