//! Creating and transforming tasks.
//!
//! Every function here is pure with respect to its inputs: tasks and
//! collections are taken by reference and a new value is returned, so a
//! caller still holding the old value never sees it change.

use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;

use crate::dates;
use crate::error::{Result, TodoError};
use crate::fields::*;
use crate::task::{Task, TaskId};
use crate::validate::{validate, TaskDraft};

const ID_SUFFIX_LEN: usize = 9;

/// Everything `create_task` accepts besides the text. Absent values take
/// their defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateOptions {
    pub priority: Priority,
    pub category: Category,
    pub due_date: Option<DateTime<Utc>>,
    pub description: String,
    pub tags: Vec<String>,
}

/// Field overwrites for `update_task`. `None` leaves a field alone;
/// `due_date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub text: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        *self == TaskUpdate::default()
    }
}

/// Generate a task id: `todo_<unix millis>_<9 base-36 chars>`.
pub fn generate_id() -> TaskId {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from_digit(rng.random_range(0..36), 36).unwrap_or('0'))
        .collect();
    TaskId::new(format!("todo_{}_{}", Utc::now().timestamp_millis(), suffix))
}

/// Normalise a tag by trimming, lowercasing and replacing spaces with hyphens.
pub fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "-")
}

/// Split comma-separated tag inputs, normalise each and drop empties and
/// repeats while keeping first-seen order.
pub fn split_and_normalise_tags(inputs: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for raw in inputs {
        for part in raw.split(',') {
            let tag = normalise_tag(part);
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}

fn check(draft: &TaskDraft) -> Result<()> {
    let report = validate(draft);
    if report.is_valid {
        Ok(())
    } else {
        Err(TodoError::Validation(report))
    }
}

/// Create a new pending task.
pub fn create_task(text: &str, options: CreateOptions) -> Result<Task> {
    let text = text.trim().to_string();
    let description = options.description.trim().to_string();
    let due_date = options.due_date.map(|d| d.trunc_subsecs(3));
    check(&TaskDraft {
        text: Some(text.clone()),
        description: Some(description.clone()),
        due_date: due_date.as_ref().map(dates::format_instant),
        ..TaskDraft::default()
    })?;

    let now = dates::now();
    let task = Task {
        id: generate_id(),
        text,
        description,
        completed: false,
        status: Status::Pending,
        priority: options.priority,
        category: options.category,
        tags: options.tags,
        due_date,
        created_at: now,
        updated_at: now,
        completed_at: None,
    };
    tracing::debug!(id = %task.id, "created task");
    Ok(task)
}

/// Return a copy of `task` with `updates` applied and `updated_at` refreshed.
///
/// A status change keeps `completed` and `completed_at` in step with it.
pub fn update_task(task: &Task, updates: TaskUpdate) -> Result<Task> {
    let mut next = task.clone();
    if let Some(text) = updates.text {
        next.text = text.trim().to_string();
    }
    if let Some(description) = updates.description {
        next.description = description.trim().to_string();
    }
    if let Some(due) = updates.due_date {
        next.due_date = due.map(|d| d.trunc_subsecs(3));
    }
    check(&TaskDraft {
        text: Some(next.text.clone()),
        description: Some(next.description.clone()),
        due_date: next.due_date.as_ref().map(dates::format_instant),
        ..TaskDraft::default()
    })?;

    let now = dates::now();
    if let Some(status) = updates.status {
        let completing = status == Status::Completed;
        if completing && !next.completed {
            next.completed_at = Some(now);
        } else if !completing {
            next.completed_at = None;
        }
        next.status = status;
        next.completed = completing;
    }
    if let Some(priority) = updates.priority {
        next.priority = priority;
    }
    if let Some(category) = updates.category {
        next.category = category;
    }
    if let Some(tags) = updates.tags {
        next.tags = tags;
    }
    next.updated_at = now;
    Ok(next)
}

/// Flip a task between pending and completed.
pub fn toggle_completion(task: &Task) -> Task {
    let now = dates::now();
    let completing = !task.completed;
    Task {
        completed: completing,
        status: if completing { Status::Completed } else { Status::Pending },
        completed_at: if completing { Some(now) } else { None },
        updated_at: now,
        ..task.clone()
    }
}

pub fn find_task<'a>(tasks: &'a [Task], id: &TaskId) -> Option<&'a Task> {
    tasks.iter().find(|t| &t.id == id)
}

/// Append `task`, giving it a fresh id if its id is already taken.
pub fn add_task(tasks: &[Task], mut task: Task) -> Vec<Task> {
    while find_task(tasks, &task.id).is_some() {
        let fresh = generate_id();
        tracing::warn!(old = %task.id, new = %fresh, "task id collision, regenerating");
        task.id = fresh;
    }
    let mut next = tasks.to_vec();
    next.push(task);
    next
}

/// Apply `updates` to the task with `id`. Unknown ids leave the collection
/// unchanged.
pub fn update_task_by_id(tasks: &[Task], id: &TaskId, updates: TaskUpdate) -> Result<Vec<Task>> {
    let Some(pos) = tasks.iter().position(|t| &t.id == id) else {
        tracing::debug!(%id, "update of unknown task ignored");
        return Ok(tasks.to_vec());
    };
    let updated = update_task(&tasks[pos], updates)?;
    let mut next = tasks.to_vec();
    next[pos] = updated;
    Ok(next)
}

/// Toggle completion of the task with `id`. Unknown ids are a no-op.
pub fn toggle_task_by_id(tasks: &[Task], id: &TaskId) -> Vec<Task> {
    if find_task(tasks, id).is_none() {
        tracing::debug!(%id, "toggle of unknown task ignored");
    }
    tasks
        .iter()
        .map(|t| if &t.id == id { toggle_completion(t) } else { t.clone() })
        .collect()
}

/// The collection minus the task with `id`. Unknown ids are a no-op.
pub fn delete_task(tasks: &[Task], id: &TaskId) -> Vec<Task> {
    let next: Vec<Task> = tasks.iter().filter(|t| &t.id != id).cloned().collect();
    if next.len() == tasks.len() {
        tracing::debug!(%id, "delete of unknown task ignored");
    }
    next
}

/// Drop every completed task.
pub fn clear_completed(tasks: &[Task]) -> Vec<Task> {
    tasks.iter().filter(|t| !t.completed).cloned().collect()
}
