//! Filtering, searching, sorting and statistics over a task collection.
//!
//! All queries borrow the collection and return a new `Vec<Task>`; none of
//! them reorder or modify their input. Sorts are stable.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::dates;
use crate::fields::*;
use crate::task::Task;

fn select(tasks: &[Task], keep: impl Fn(&Task) -> bool) -> Vec<Task> {
    tasks.iter().filter(|t| keep(t)).cloned().collect()
}

pub fn filter_by_status(tasks: &[Task], status: Status) -> Vec<Task> {
    select(tasks, |t| t.status == status)
}

pub fn filter_by_category(tasks: &[Task], category: Category) -> Vec<Task> {
    select(tasks, |t| t.category == category)
}

pub fn filter_by_priority(tasks: &[Task], priority: Priority) -> Vec<Task> {
    select(tasks, |t| t.priority == priority)
}

pub fn completed_tasks(tasks: &[Task]) -> Vec<Task> {
    select(tasks, |t| t.completed)
}

pub fn pending_tasks(tasks: &[Task]) -> Vec<Task> {
    select(tasks, |t| !t.completed)
}

/// Case-insensitive substring search over text, description and tags.
/// A blank term matches everything.
pub fn search(tasks: &[Task], term: &str) -> Vec<Task> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return tasks.to_vec();
    }
    select(tasks, |t| {
        t.text.to_lowercase().contains(&term)
            || t.description.to_lowercase().contains(&term)
            || t.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
    })
}

fn sorted(tasks: &[Task], cmp: impl FnMut(&Task, &Task) -> Ordering) -> Vec<Task> {
    let mut out = tasks.to_vec();
    out.sort_by(cmp);
    out
}

pub fn sort_by_created(tasks: &[Task], ascending: bool) -> Vec<Task> {
    sorted(tasks, |a, b| {
        let ord = a.created_at.cmp(&b.created_at);
        if ascending { ord } else { ord.reverse() }
    })
}

/// Highest priority first; equal priorities keep their input order.
pub fn sort_by_priority(tasks: &[Task]) -> Vec<Task> {
    sorted(tasks, |a, b| b.priority.rank().cmp(&a.priority.rank()))
}

/// Earliest due date first. Undated tasks go after all dated ones and keep
/// their relative order.
pub fn sort_by_due_date(tasks: &[Task]) -> Vec<Task> {
    sorted(tasks, |a, b| cmp_due(a, b, false))
}

fn cmp_due(a: &Task, b: &Task, latest_first: bool) -> Ordering {
    match (a.due_date, b.due_date) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) if latest_first => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
    }
}

fn cmp_text(a: &Task, b: &Task) -> Ordering {
    a.text.to_lowercase().cmp(&b.text.to_lowercase())
}

pub fn sort_tasks(tasks: &[Task], key: SortKey) -> Vec<Task> {
    match key {
        SortKey::Newest => sort_by_created(tasks, false),
        SortKey::Oldest => sort_by_created(tasks, true),
        SortKey::Priority => sort_by_priority(tasks),
        SortKey::PriorityAsc => sorted(tasks, |a, b| a.priority.rank().cmp(&b.priority.rank())),
        SortKey::Due => sort_by_due_date(tasks),
        SortKey::DueDesc => sorted(tasks, |a, b| cmp_due(a, b, true)),
        SortKey::Title => sorted(tasks, cmp_text),
        SortKey::TitleDesc => sorted(tasks, |a, b| cmp_text(b, a)),
    }
}

/// Incomplete tasks whose due date is strictly before `now`.
pub fn overdue_at(tasks: &[Task], now: &DateTime<Utc>) -> Vec<Task> {
    select(tasks, |t| t.is_overdue_at(now))
}

pub fn overdue(tasks: &[Task]) -> Vec<Task> {
    overdue_at(tasks, &Utc::now())
}

/// Tasks due on the given local calendar day.
pub fn due_on(tasks: &[Task], day: NaiveDate) -> Vec<Task> {
    select(tasks, |t| t.due_date.as_ref().is_some_and(|d| dates::local_day(d) == day))
}

pub fn due_today(tasks: &[Task]) -> Vec<Task> {
    due_on(tasks, dates::today())
}

pub fn due_tomorrow(tasks: &[Task]) -> Vec<Task> {
    due_on(tasks, dates::today() + Duration::days(1))
}

pub fn undated(tasks: &[Task]) -> Vec<Task> {
    select(tasks, |t| t.due_date.is_none())
}

/// Apply a [`DueFilter`] relative to `now`.
pub fn filter_by_due_at(tasks: &[Task], filter: DueFilter, now: &DateTime<Utc>) -> Vec<Task> {
    let today = dates::local_day(now);
    match filter {
        DueFilter::Today => due_on(tasks, today),
        DueFilter::Tomorrow => due_on(tasks, today + Duration::days(1)),
        DueFilter::Overdue => overdue_at(tasks, now),
        DueFilter::None => undated(tasks),
    }
}

/// Percentage of completed tasks, rounded; 0 for an empty collection.
pub fn completion_rate(tasks: &[Task]) -> u8 {
    if tasks.is_empty() {
        return 0;
    }
    let completed = tasks.iter().filter(|t| t.completed).count();
    (completed as f64 / tasks.len() as f64 * 100.0).round() as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub completion_rate: u8,
}

pub fn stats_at(tasks: &[Task], now: &DateTime<Utc>) -> TaskStats {
    let completed = tasks.iter().filter(|t| t.completed).count();
    TaskStats {
        total: tasks.len(),
        completed,
        pending: tasks.len() - completed,
        overdue: tasks.iter().filter(|t| t.is_overdue_at(now)).count(),
        due_today: due_on(tasks, dates::local_day(now)).len(),
        completion_rate: completion_rate(tasks),
    }
}

pub fn stats(tasks: &[Task]) -> TaskStats {
    stats_at(tasks, &Utc::now())
}
