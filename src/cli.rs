use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Simple, file-backed todo list.
/// Tasks are stored as JSON in <dir>/<key>.json, by default ~/.todo/todos.json.
#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Local task tracker")]
pub struct Cli {
    /// Directory holding the task data.
    #[arg(long, global = true, env = "TODO_DIR")]
    pub dir: Option<PathBuf>,

    /// Storage key (file stem) the task list is kept under.
    #[arg(long, global = true, env = "TODO_KEY", default_value = crate::db::DEFAULT_KEY)]
    pub key: String,

    /// Fail instead of starting fresh when stored data is unreadable.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Maximum number of tasks the list may hold.
    #[arg(long, global = true, env = "TODO_MAX_TASKS", default_value_t = crate::config::DEFAULT_MAX_TASKS)]
    pub max_tasks: usize,

    #[command(subcommand)]
    pub command: Commands,
}
