//! Command implementations for the CLI interface.
//!
//! Each handler loads nothing itself: it receives the current collection,
//! routes one intent through the core, prints the outcome and, for
//! mutations, saves the new collection explicitly.

use std::collections::BTreeMap;

use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::config::Config;
use crate::dates::{self, format_due_relative};
use crate::db::{Storage, TaskStore};
use crate::error::{Result, TodoError};
use crate::factory::*;
use crate::fields::*;
use crate::query;
use crate::task::{Task, TaskId};
use crate::validate::{validate, Field, TaskDraft, ValidationReport};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// What needs doing.
        text: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        #[arg(long, value_enum, default_value_t = Category::Other)]
        category: Category,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Due date: YYYY-MM-DD, an ISO timestamp, "today", "tomorrow", "friday", or "in Nd".
        #[arg(long)]
        due: Option<String>,
    },

    /// List tasks with optional filters.
    List {
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, value_enum)]
        category: Option<Category>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Only tasks that are not completed.
        #[arg(long, conflicts_with = "completed")]
        pending: bool,
        /// Only completed tasks.
        #[arg(long)]
        completed: bool,
        /// Case-insensitive search over text, description and tags.
        #[arg(long)]
        search: Option<String>,
        /// Due filter: today | tomorrow | overdue | none.
        #[arg(long, value_enum)]
        due: Option<DueFilter>,
        #[arg(long, value_enum, default_value_t = SortKey::Newest)]
        sort: SortKey,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task by id or text.
    View { id: String },

    /// Update fields on a task.
    Edit {
        /// Task id or text.
        id: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, value_enum)]
        category: Option<Category>,
        /// Add tags. May be repeated and comma-separated.
        #[arg(long = "add-tag")]
        add_tags: Vec<String>,
        /// Remove tags. May be repeated and comma-separated.
        #[arg(long = "rm-tag")]
        rm_tags: Vec<String>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
    },

    /// Mark a task done, or reopen it if it is already done.
    Toggle { id: String },

    /// Delete a task by id or text.
    Delete { id: String },

    /// Delete every completed task.
    ClearCompleted,

    /// Show counts and completion rate.
    Stats {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check a candidate task without saving it and print the report as JSON.
    Validate {
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Run one command against the configured store.
pub fn run(command: Commands, config: &Config) -> Result<()> {
    dispatch(command, &config.open_store(), config)
}

/// Route one command. Only commands that need the collection read it, so
/// `validate` and `completions` work even when the slot is unreadable.
fn dispatch<S: Storage>(command: Commands, store: &TaskStore<S>, config: &Config) -> Result<()> {
    let load = || store.load_with(config.load_policy);
    match command {
        Commands::Add { text, desc, priority, category, tags, due } => {
            let options = CreateOptions {
                priority,
                category,
                due_date: due.as_deref().map(parse_due).transpose()?,
                description: desc.unwrap_or_default(),
                tags: split_and_normalise_tags(&tags),
            };
            cmd_add(store, &load()?, &text, options, config.max_tasks).map(|_| ())
        }
        Commands::List { status, category, priority, pending, completed, search, due, sort, limit } => {
            let filter = ListFilter {
                status,
                category,
                priority,
                completed: if completed {
                    Some(true)
                } else if pending {
                    Some(false)
                } else {
                    None
                },
                search,
                due,
                sort,
                limit,
            };
            cmd_list(&load()?, &filter);
            Ok(())
        }
        Commands::View { id } => cmd_view(&load()?, &id),
        Commands::Edit { id, text, desc, status, priority, category, add_tags, rm_tags, due, clear_due } => {
            let tasks = load()?;
            let target = resolve_task(&tasks, &id)?;
            let tags = edit_tags(&target.tags, &add_tags, &rm_tags);
            let due_date = if clear_due {
                Some(None)
            } else {
                due.as_deref().map(parse_due).transpose()?.map(Some)
            };
            let updates = TaskUpdate {
                text,
                description: desc,
                status,
                priority,
                category,
                tags,
                due_date,
            };
            let target_id = target.id.clone();
            cmd_edit(store, &tasks, &target_id, updates).map(|_| ())
        }
        Commands::Toggle { id } => {
            let tasks = load()?;
            let target_id = resolve_task(&tasks, &id)?.id.clone();
            cmd_toggle(store, &tasks, &target_id).map(|_| ())
        }
        Commands::Delete { id } => {
            let tasks = load()?;
            let target_id = resolve_task(&tasks, &id)?.id.clone();
            cmd_delete(store, &tasks, &target_id).map(|_| ())
        }
        Commands::ClearCompleted => cmd_clear_completed(store, &load()?).map(|_| ()),
        Commands::Stats { json } => {
            cmd_stats(&load()?, json);
            Ok(())
        }
        Commands::Validate { text, desc, priority, category, due } => cmd_validate(TaskDraft {
            text,
            description: desc,
            priority,
            category,
            due_date: due,
        }),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

fn parse_due(s: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    dates::parse_due_input(s).ok_or_else(|| {
        let mut errors = BTreeMap::new();
        errors.insert(Field::DueDate, format!("Invalid due date '{s}'"));
        TodoError::Validation(ValidationReport {
            is_valid: false,
            errors,
        })
    })
}

/// New tag list after adding and removing, or `None` if neither was asked for.
fn edit_tags(current: &[String], add: &[String], remove: &[String]) -> Option<Vec<String>> {
    if add.is_empty() && remove.is_empty() {
        return None;
    }
    let remove = split_and_normalise_tags(remove);
    let mut tags: Vec<String> = current
        .iter()
        .filter(|t| !remove.contains(t))
        .cloned()
        .collect();
    for tag in split_and_normalise_tags(add) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    Some(tags)
}

/// Resolve a task reference (an id, or the task text) to a task.
/// Text matches are case-insensitive and must be unique.
pub fn resolve_task<'a>(tasks: &'a [Task], identifier: &str) -> Result<&'a Task> {
    if let Some(task) = find_task(tasks, &TaskId::new(identifier.trim())) {
        return Ok(task);
    }
    let wanted = identifier.trim().to_lowercase();
    let matches: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.text.to_lowercase() == wanted)
        .collect();
    match matches.as_slice() {
        [] => Err(TodoError::NotFound(identifier.to_string())),
        [task] => Ok(task),
        _ => Err(TodoError::Ambiguous(identifier.to_string())),
    }
}

/// Add a task to the list.
pub fn cmd_add<S: Storage>(
    store: &TaskStore<S>,
    tasks: &[Task],
    text: &str,
    options: CreateOptions,
    max_tasks: usize,
) -> Result<Vec<Task>> {
    if tasks.len() >= max_tasks {
        return Err(TodoError::CapacityExceeded { limit: max_tasks });
    }
    let task = create_task(text, options)?;
    let id = task.id.clone();
    let next = add_task(tasks, task);
    store.save(&next)?;
    println!("Added task {id}");
    Ok(next)
}

/// Criteria for `list`.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<Status>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    pub search: Option<String>,
    pub due: Option<DueFilter>,
    pub sort: SortKey,
    pub limit: Option<usize>,
}

/// Apply a `ListFilter` to the collection.
pub fn select_tasks(tasks: &[Task], filter: &ListFilter) -> Vec<Task> {
    let mut out = tasks.to_vec();
    if let Some(status) = filter.status {
        out = query::filter_by_status(&out, status);
    }
    if let Some(category) = filter.category {
        out = query::filter_by_category(&out, category);
    }
    if let Some(priority) = filter.priority {
        out = query::filter_by_priority(&out, priority);
    }
    match filter.completed {
        Some(true) => out = query::completed_tasks(&out),
        Some(false) => out = query::pending_tasks(&out),
        None => {}
    }
    if let Some(term) = filter.search.as_deref() {
        out = query::search(&out, term);
    }
    if let Some(due) = filter.due {
        out = query::filter_by_due_at(&out, due, &chrono::Utc::now());
    }
    out = query::sort_tasks(&out, filter.sort);
    if let Some(limit) = filter.limit {
        out.truncate(limit);
    }
    out
}

/// List tasks with optional filtering and sorting.
pub fn cmd_list(tasks: &[Task], filter: &ListFilter) {
    let selected = select_tasks(tasks, filter);
    if selected.is_empty() {
        println!("No tasks.");
        return;
    }
    print_table(&selected);
}

/// Show every field of one task.
pub fn cmd_view(tasks: &[Task], id: &str) -> Result<()> {
    let t = resolve_task(tasks, id)?;
    let today = dates::today();
    println!("ID:          {}", t.id);
    println!("Text:        {}", t.text);
    if !t.description.is_empty() {
        println!("Description: {}", t.description);
    }
    println!("Status:      {}", t.status.as_str());
    println!("Priority:    {}", t.priority.as_str());
    println!("Category:    {}", t.category.as_str());
    if !t.tags.is_empty() {
        println!("Tags:        {}", t.tags.join(", "));
    }
    println!("Due:         {}", format_due_relative(t.due_date.as_ref(), today));
    if t.is_overdue_at(&chrono::Utc::now()) {
        println!("             (overdue)");
    }
    println!("Created:     {}", dates::format_instant(&t.created_at));
    println!("Updated:     {}", dates::format_instant(&t.updated_at));
    if let Some(done) = t.completed_at.as_ref() {
        println!("Completed:   {}", dates::format_instant(done));
    }
    Ok(())
}

/// Apply field changes to a task.
pub fn cmd_edit<S: Storage>(
    store: &TaskStore<S>,
    tasks: &[Task],
    id: &TaskId,
    updates: TaskUpdate,
) -> Result<Vec<Task>> {
    if updates.is_empty() {
        println!("Nothing to change.");
        return Ok(tasks.to_vec());
    }
    let next = update_task_by_id(tasks, id, updates)?;
    store.save(&next)?;
    println!("Updated {id}");
    Ok(next)
}

/// Flip a task between done and pending.
pub fn cmd_toggle<S: Storage>(store: &TaskStore<S>, tasks: &[Task], id: &TaskId) -> Result<Vec<Task>> {
    let next = toggle_task_by_id(tasks, id);
    store.save(&next)?;
    match find_task(&next, id) {
        Some(t) if t.completed => println!("Marked {id} done."),
        Some(_) => println!("Reopened {id}"),
        None => {}
    }
    Ok(next)
}

pub fn cmd_delete<S: Storage>(store: &TaskStore<S>, tasks: &[Task], id: &TaskId) -> Result<Vec<Task>> {
    let next = delete_task(tasks, id);
    store.save(&next)?;
    println!("Deleted {id}");
    Ok(next)
}

pub fn cmd_clear_completed<S: Storage>(store: &TaskStore<S>, tasks: &[Task]) -> Result<Vec<Task>> {
    let next = clear_completed(tasks);
    let removed = tasks.len() - next.len();
    if removed > 0 {
        store.save(&next)?;
    }
    println!("Removed {removed} completed task(s).");
    Ok(next)
}

pub fn cmd_stats(tasks: &[Task], json: bool) {
    let s = query::stats(tasks);
    if json {
        match serde_json::to_string_pretty(&s) {
            Ok(out) => println!("{out}"),
            Err(e) => eprintln!("Failed to encode stats: {e}"),
        }
        return;
    }
    println!("Total:      {}", s.total);
    println!("Completed:  {}", s.completed);
    println!("Pending:    {}", s.pending);
    println!("Overdue:    {}", s.overdue);
    println!("Due today:  {}", s.due_today);
    println!("Done:       {}%", s.completion_rate);
}

/// Print the validation report for a draft. Invalid drafts are reported,
/// not treated as errors.
pub fn cmd_validate(draft: TaskDraft) -> Result<()> {
    let report = validate(&draft);
    let out = serde_json::to_string_pretty(&report)
        .map_err(|e| TodoError::Storage(std::io::Error::other(e)))?;
    println!("{out}");
    Ok(())
}

pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[Task]) {
    println!(
        "{:<30} {:<11} {:<7} {:<10} {:<13} {}",
        "ID", "Status", "Pri", "Category", "Due", "Text [tags]"
    );
    let today = dates::today();
    let now = chrono::Utc::now();
    for t in tasks {
        let tags = if t.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags.join(","))
        };
        let mut due = format_due_relative(t.due_date.as_ref(), today);
        if t.is_overdue_at(&now) {
            due.push('!');
        }
        println!(
            "{:<30} {:<11} {:<7} {:<10} {:<13} {}{}",
            truncate(t.id.as_str(), 30),
            t.status.as_str(),
            t.priority.as_str(),
            t.category.as_str(),
            due,
            truncate(&t.text, 60),
            tags
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}
