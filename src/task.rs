//! Task data structure and its stored representation.
//!
//! A `Task` is only ever built by [`crate::factory::create_task`] or read back
//! from the persistence slot, and only ever changed through the mutators in
//! [`crate::factory`]. The JSON field names below are the storage format.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::fields::*;

/// Opaque task identifier, unique within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

/// Ids written by older versions were bare millisecond numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for TaskId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => TaskId(s),
            RawId::Number(n) => TaskId(n.to_string()),
        }
    }
}

/// A single tracked unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredTask")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub description: String,
    pub completed: bool,
    pub status: Status,
    pub priority: Priority,
    pub category: Category,
    pub tags: Vec<String>,
    #[serde(with = "dates::iso::option")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(with = "dates::iso")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "dates::iso")]
    pub updated_at: DateTime<Utc>,
    #[serde(with = "dates::iso::option")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_overdue_at(&self, now: &DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < *now)
    }
}

/// A task as found in storage: every field but `id` and `text` may be
/// missing, which is how records from the minimal text-only shape look.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: TaskId,
    text: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    status: Option<Status>,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    category: Category,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default, with = "dates::iso::option")]
    due_date: Option<DateTime<Utc>>,
    #[serde(default, with = "dates::iso::option")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "dates::iso::option")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default, with = "dates::iso::option")]
    completed_at: Option<DateTime<Utc>>,
}

impl From<StoredTask> for Task {
    fn from(s: StoredTask) -> Self {
        // Without an explicit status the completed flag decides.
        let status = match s.status {
            Some(status) => status,
            None if s.completed => Status::Completed,
            None => Status::Pending,
        };
        let completed = status == Status::Completed;
        let created_at = s.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Task {
            id: s.id,
            text: s.text,
            description: s.description,
            completed,
            status,
            priority: s.priority,
            category: s.category,
            tags: s.tags,
            due_date: s.due_date,
            created_at,
            updated_at: s.updated_at.unwrap_or(created_at),
            completed_at: if completed { s.completed_at } else { None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Task {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        Task {
            id: TaskId::new("todo_1704096000000_abc123xyz"),
            text: "Write report".into(),
            description: "Quarterly numbers".into(),
            completed: false,
            status: Status::InProgress,
            priority: Priority::High,
            category: Category::Work,
            tags: vec!["q1".into(), "finance".into()],
            due_date: Some(Utc.with_ymd_and_hms(2024, 1, 5, 17, 0, 0).unwrap()),
            created_at: created,
            updated_at: created,
            completed_at: None,
        }
    }

    #[test]
    fn test_json_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "category", "completed", "completedAt", "createdAt", "description", "dueDate",
                "id", "priority", "status", "tags", "text", "updatedAt",
            ]
        );
        assert_eq!(obj["status"], "in_progress");
        assert_eq!(obj["dueDate"], "2024-01-05T17:00:00.000Z");
        assert_eq!(obj["completedAt"], serde_json::Value::Null);
    }

    #[test]
    fn test_json_round_trip() {
        let task = sample();
        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_reads_minimal_legacy_shape() {
        let json = r#"{"id": 1704096000000, "text": "Buy milk", "completed": true,
                       "createdAt": "2024-01-01T08:00:00.000Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();

        assert_eq!(task.id.as_str(), "1704096000000");
        assert_eq!(task.status, Status::Completed);
        assert!(task.completed);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, Category::Other);
        assert!(task.tags.is_empty());
        assert_eq!(task.description, "");
        assert_eq!(task.updated_at, task.created_at);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn test_status_wins_over_stale_completed_flag() {
        let json = r#"{"id": "a", "text": "x", "completed": true, "status": "pending",
                       "completedAt": "2024-01-01T08:00:00.000Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
        assert_eq!(task.created_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_rejects_bad_timestamp() {
        let json = r#"{"id": "a", "text": "x", "dueDate": "yesterday-ish"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn test_is_overdue_at() {
        let mut task = sample();
        let after = Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap();
        assert!(task.is_overdue_at(&after));
        assert!(!task.is_overdue_at(&before));
        task.completed = true;
        assert!(!task.is_overdue_at(&after));
    }
}
