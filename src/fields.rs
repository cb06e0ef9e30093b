//! Enumerations and field types for tasks.
//!
//! This module defines the closed value sets a task draws from (status,
//! priority, category) together with the sort and due-date selectors used by
//! the query engine and the command line.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a task.
///
/// `Completed` is the only state in which a task's `completed` flag is set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    #[value(alias = "in_progress")]
    InProgress,
    Completed,
    Cancelled,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::InProgress,
        Status::Completed,
        Status::Cancelled,
    ];

    /// Wire name as stored in the persistence slot.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

/// How important a task is.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }

    /// Numeric weight used for ordering: urgent(4) > high(3) > medium(2) > low(1).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
        }
    }
}

/// Area of life a task belongs to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Work,
    Personal,
    Shopping,
    Health,
    Learning,
    Education,
    Finance,
    Travel,
    Home,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Work,
        Category::Personal,
        Category::Shopping,
        Category::Health,
        Category::Learning,
        Category::Education,
        Category::Finance,
        Category::Travel,
        Category::Home,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Personal => "personal",
            Self::Shopping => "shopping",
            Self::Health => "health",
            Self::Learning => "learning",
            Self::Education => "education",
            Self::Finance => "finance",
            Self::Travel => "travel",
            Self::Home => "home",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

/// Available orderings for task lists.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum SortKey {
    /// Most recently created first.
    #[default]
    Newest,
    /// Oldest created first.
    Oldest,
    /// Highest priority first.
    Priority,
    /// Lowest priority first.
    PriorityAsc,
    /// Earliest due date first, undated last.
    Due,
    /// Latest due date first, undated last.
    DueDesc,
    /// Text A-Z.
    Title,
    /// Text Z-A.
    TitleDesc,
}

/// Filtering options for tasks based on due dates.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum DueFilter {
    Today,
    Tomorrow,
    Overdue,
    None,
}
