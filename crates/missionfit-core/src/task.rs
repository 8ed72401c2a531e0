use crate::error::{MissionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A to-do item. Field names on the wire are camelCase (`parentId`).
///
/// `parent_id` is never validated: a dangling or self reference is stored as
/// given, and only affects how the list is grouped for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Body of a create request. Any `id` the caller sends is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn subtask_of(title: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
            parent_id: Some(parent_id.into()),
        }
    }

    /// Stamp a fresh identifier onto the partial record.
    pub fn into_task(self) -> Task {
        Task {
            id: new_task_id(),
            title: self.title,
            completed: self.completed,
            parent_id: self.parent_id,
        }
    }
}

pub fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Collection operations (operate on a mutable Vec<Task>)
// ---------------------------------------------------------------------------

pub fn create_task(tasks: &mut Vec<Task>, new: NewTask) -> Task {
    let task = new.into_task();
    tasks.push(task.clone());
    task
}

/// Replace the entry whose id matches `task.id`. The slice is untouched on
/// `TaskNotFound`.
pub fn replace_task(tasks: &mut [Task], task: Task) -> Result<()> {
    let slot = tasks
        .iter_mut()
        .find(|t| t.id == task.id)
        .ok_or_else(|| MissionError::TaskNotFound(task.id.clone()))?;
    *slot = task;
    Ok(())
}

/// Remove every entry with this id. Returns how many were removed.
pub fn remove_task(tasks: &mut Vec<Task>, id: &str) -> usize {
    let before = tasks.len();
    tasks.retain(|t| t.id != id);
    before - tasks.len()
}

// ---------------------------------------------------------------------------
// Grouping for display
// ---------------------------------------------------------------------------

/// A top-level task and the tasks that name it as parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskGroup {
    pub task: Task,
    pub subtasks: Vec<Task>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedTasks {
    pub groups: Vec<TaskGroup>,
    /// Tasks whose parent is missing or is not top-level; the list view
    /// never reaches them through a parent.
    pub orphans: Vec<Task>,
}

/// Group a flat list into one level of nesting, keeping list order.
pub fn group_subtasks(tasks: &[Task]) -> GroupedTasks {
    let top_level: HashSet<&str> = tasks
        .iter()
        .filter(|t| t.parent_id.is_none())
        .map(|t| t.id.as_str())
        .collect();

    let groups = tasks
        .iter()
        .filter(|t| t.parent_id.is_none())
        .map(|parent| TaskGroup {
            task: parent.clone(),
            subtasks: tasks
                .iter()
                .filter(|sub| sub.parent_id.as_deref() == Some(parent.id.as_str()))
                .cloned()
                .collect(),
        })
        .collect();

    let orphans = tasks
        .iter()
        .filter(|t| {
            t.parent_id
                .as_deref()
                .is_some_and(|p| !top_level.contains(p))
        })
        .cloned()
        .collect();

    GroupedTasks { groups, orphans }
}

/// "3/5 completed"
pub fn summarize(tasks: &[Task]) -> String {
    let done = tasks.iter().filter(|t| t.completed).count();
    format!("{done}/{} completed", tasks.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
