//! # todo - a local task tracker
//!
//! Create, edit, complete, delete, filter and sort short text tasks, with the
//! whole list kept as one JSON document on disk between sessions.
//!
//! ## Layout
//!
//! - [`task`] and [`fields`]: the task record and its closed value sets
//! - [`factory`]: creating tasks and producing changed copies of them
//! - [`query`]: filters, search, sorting and statistics
//! - [`validate`]: per-field checks returning a structured report
//! - [`db`]: the JSON slot the collection is saved to and loaded from
//! - [`cli`], [`cmd`] and [`config`]: the `todo` command line
//!
//! Core calls never mutate what they are given. The caller owns the current
//! collection, passes it in, gets a new one back and saves it:
//!
//! ```no_run
//! use todo_tracker::db::{FileStorage, TaskStore};
//! use todo_tracker::factory::{add_task, create_task, CreateOptions};
//!
//! # fn main() -> todo_tracker::error::Result<()> {
//! let store = TaskStore::new(FileStorage::new("/tmp/todo"), "todos");
//! let tasks = store.load()?;
//! let task = create_task("Buy milk", CreateOptions::default())?;
//! let tasks = add_task(&tasks, task);
//! store.save(&tasks)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! todo add "Buy milk" --priority high --category shopping --due tomorrow
//! todo list --pending --sort due
//! todo toggle "Buy milk"
//! todo stats
//! ```
//!
//! Data is stored in `~/.todo/todos.json` unless `--dir`/`--key` (or
//! `TODO_DIR`/`TODO_KEY`) say otherwise.

pub mod cli;
pub mod cmd;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod factory;
pub mod fields;
pub mod query;
pub mod task;
pub mod validate;
