//! Field-level validation of candidate tasks.
//!
//! Validation never fails outright: it always hands back a
//! [`ValidationReport`] so callers can decide whether to reject the input
//! or just show the per-field messages.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::dates;
use crate::fields::*;
use crate::task::Task;

pub const MAX_TEXT_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Fields a validation message can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Text,
    Description,
    Priority,
    Category,
    DueDate,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Description => "description",
            Self::Priority => "priority",
            Self::Category => "category",
            Self::DueDate => "dueDate",
        }
    }
}

/// A candidate task with every field in raw, unchecked form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub text: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub due_date: Option<String>,
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        TaskDraft {
            text: Some(task.text.clone()),
            description: Some(task.description.clone()),
            priority: Some(task.priority.as_str().to_string()),
            category: Some(task.category.as_str().to_string()),
            due_date: task.due_date.as_ref().map(dates::format_instant),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: BTreeMap<Field, String>,
}

impl ValidationReport {
    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field.as_str(), message)?;
            first = false;
        }
        Ok(())
    }
}

/// Check a candidate against the field constraints.
pub fn validate(draft: &TaskDraft) -> ValidationReport {
    let mut errors = BTreeMap::new();

    match draft.text.as_deref().map(str::trim) {
        None | Some("") => {
            errors.insert(Field::Text, "Task text is required".to_string());
        }
        Some(text) if text.chars().count() > MAX_TEXT_LEN => {
            errors.insert(
                Field::Text,
                format!("Task text must be at most {MAX_TEXT_LEN} characters"),
            );
        }
        Some(_) => {}
    }

    if let Some(desc) = draft.description.as_deref() {
        if desc.chars().count() > MAX_DESCRIPTION_LEN {
            errors.insert(
                Field::Description,
                format!("Description must be at most {MAX_DESCRIPTION_LEN} characters"),
            );
        }
    }

    if let Some(p) = draft.priority.as_deref().filter(|p| !p.is_empty()) {
        if Priority::parse(p).is_none() {
            errors.insert(Field::Priority, format!("Invalid priority value '{p}'"));
        }
    }

    if let Some(c) = draft.category.as_deref().filter(|c| !c.is_empty()) {
        if Category::parse(c).is_none() {
            errors.insert(Field::Category, format!("Invalid category value '{c}'"));
        }
    }

    if let Some(due) = draft.due_date.as_deref().filter(|d| !d.is_empty()) {
        if dates::parse_instant(due).is_none() {
            errors.insert(Field::DueDate, "Invalid due date".to_string());
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(text: &str) -> TaskDraft {
        TaskDraft {
            text: Some(text.to_string()),
            ..TaskDraft::default()
        }
    }

    #[test]
    fn test_empty_text_is_invalid() {
        let report = validate(&draft(""));
        assert!(!report.is_valid);
        assert!(report.error(Field::Text).is_some());

        let report = validate(&draft("   "));
        assert!(!report.is_valid);

        let report = validate(&TaskDraft::default());
        assert!(report.error(Field::Text).is_some());
    }

    #[test]
    fn test_text_length_limit() {
        let report = validate(&draft(&"a".repeat(201)));
        assert!(!report.is_valid);
        assert!(report.error(Field::Text).is_some());

        assert!(validate(&draft(&"a".repeat(200))).is_valid);
        // Surrounding whitespace does not count.
        assert!(validate(&draft(&format!("  {}  ", "a".repeat(200)))).is_valid);
        // Length is counted in characters, not bytes.
        assert!(validate(&draft(&"é".repeat(200))).is_valid);
    }

    #[test]
    fn test_description_length_limit() {
        let mut d = draft("ok");
        d.description = Some("x".repeat(501));
        let report = validate(&d);
        assert!(!report.is_valid);
        assert!(report.error(Field::Description).is_some());
        assert!(report.error(Field::Text).is_none());

        d.description = Some("x".repeat(500));
        assert!(validate(&d).is_valid);
    }

    #[test]
    fn test_enum_membership() {
        let mut d = draft("ok");
        d.priority = Some("critical".into());
        d.category = Some("hobby".into());
        let report = validate(&d);
        assert!(!report.is_valid);
        assert!(report.error(Field::Priority).is_some());
        assert!(report.error(Field::Category).is_some());

        d.priority = Some("urgent".into());
        d.category = Some("learning".into());
        assert!(validate(&d).is_valid);
    }

    #[test]
    fn test_due_date_must_parse() {
        let mut d = draft("ok");
        d.due_date = Some("not-a-date".into());
        assert!(validate(&d).error(Field::DueDate).is_some());

        d.due_date = Some("2024-01-01T00:00:00.000Z".into());
        assert!(validate(&d).is_valid);

        d.due_date = Some("+10240-07-07T23:59:59.000Z".into());
        assert!(validate(&d).error(Field::DueDate).is_some());
    }

    #[test]
    fn test_collects_every_error() {
        let d = TaskDraft {
            text: Some(String::new()),
            description: Some("x".repeat(600)),
            priority: Some("nope".into()),
            category: Some("nope".into()),
            due_date: Some("nope".into()),
        };
        let report = validate(&d);
        assert_eq!(report.errors.len(), 5);
    }

    #[test]
    fn test_report_json_shape() {
        let report = validate(&draft(""));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["isValid"], false);
        assert!(json["errors"]["text"].is_string());
    }

    #[test]
    fn test_report_display() {
        let mut d = draft("");
        d.priority = Some("x".into());
        let text = validate(&d).to_string();
        assert!(text.starts_with("text: "));
        assert!(text.contains("; priority: "));
    }
}
