use crate::output::{check_mark, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use missionfit_core::config::Config;
use missionfit_core::store::{self, TaskStore};
use missionfit_core::task::{self as task_ops, NewTask, Task};
use missionfit_core::MissionError;
use std::path::Path;

#[derive(Subcommand)]
pub enum TaskSubcommand {
    /// List tasks with their subtasks
    List,
    /// Add a task, or a subtask with --parent
    Add {
        #[arg(required = true)]
        title: Vec<String>,
        /// Id of the task this one belongs under
        #[arg(long)]
        parent: Option<String>,
    },
    /// Flip a task between done and not done
    Toggle { id: String },
    /// Change a task's title
    Rename {
        id: String,
        #[arg(required = true)]
        title: Vec<String>,
    },
    /// Delete a task
    Rm { id: String },
}

pub fn run(root: &Path, subcmd: TaskSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let store = store::open(&config, root).context("failed to open task store")?;
    let store = store.as_ref();

    match subcmd {
        TaskSubcommand::List => list(store, json),
        TaskSubcommand::Add { title, parent } => add(store, title.join(" "), parent, json),
        TaskSubcommand::Toggle { id } => toggle(store, &id, json),
        TaskSubcommand::Rename { id, title } => rename(store, &id, title.join(" "), json),
        TaskSubcommand::Rm { id } => remove(store, &id, json),
    }
}

fn find(store: &dyn TaskStore, id: &str) -> anyhow::Result<Task> {
    store
        .list()
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| MissionError::TaskNotFound(id.to_string()).into())
}

fn report(task: &Task, verb: &str, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(task)?;
    } else {
        println!("{verb} {} [{}]: {}", check_mark(task.completed), task.id, task.title);
    }
    Ok(())
}

fn list(store: &dyn TaskStore, json: bool) -> anyhow::Result<()> {
    let tasks = store.list();
    if json {
        return print_json(&tasks);
    }
    if tasks.is_empty() {
        println!("No tasks yet. Add one with `missionfit task add <title>`.");
        return Ok(());
    }

    let grouped = task_ops::group_subtasks(&tasks);
    let mut rows = Vec::new();
    for group in &grouped.groups {
        rows.push(row(&group.task, group.task.title.clone()));
        for sub in &group.subtasks {
            rows.push(row(sub, format!("└ {}", sub.title)));
        }
    }
    for orphan in &grouped.orphans {
        let parent = orphan.parent_id.as_deref().unwrap_or_default();
        rows.push(row(orphan, format!("{} (parent {parent} not found)", orphan.title)));
    }

    print_table(&["DONE", "ID", "TITLE"], &rows);
    println!();
    println!("{}", task_ops::summarize(&tasks));
    Ok(())
}

fn row(task: &Task, title: String) -> Vec<String> {
    vec![check_mark(task.completed).to_string(), task.id.clone(), title]
}

fn add(
    store: &dyn TaskStore,
    title: String,
    parent: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let new = match parent {
        Some(parent_id) => {
            if !store.list().iter().any(|t| t.id == parent_id) {
                tracing::warn!(parent = %parent_id, "parent task does not exist; adding anyway");
            }
            NewTask::subtask_of(title, parent_id)
        }
        None => NewTask::titled(title),
    };
    let task = store.create(new).context("failed to save task")?;
    report(&task, "Added", json)
}

fn toggle(store: &dyn TaskStore, id: &str, json: bool) -> anyhow::Result<()> {
    let mut task = find(store, id)?;
    task.completed = !task.completed;
    let task = store.update(task).context("failed to save task")?;
    report(&task, "Updated", json)
}

fn rename(store: &dyn TaskStore, id: &str, title: String, json: bool) -> anyhow::Result<()> {
    let mut task = find(store, id)?;
    task.title = title;
    let task = store.update(task).context("failed to save task")?;
    report(&task, "Renamed", json)
}

fn remove(store: &dyn TaskStore, id: &str, json: bool) -> anyhow::Result<()> {
    store.delete(id).context("failed to delete task")?;
    if json {
        print_json(&serde_json::json!({ "success": true, "id": id }))?;
    } else {
        println!("Removed [{id}]");
    }
    Ok(())
}
