//! Runtime configuration resolved from the command line and environment.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::db::{FileStorage, LoadPolicy, TaskStore, DEFAULT_KEY};

pub const DEFAULT_MAX_TASKS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the slot files.
    pub data_dir: PathBuf,
    /// Name of the slot the collection is stored under.
    pub storage_key: String,
    pub load_policy: LoadPolicy,
    /// Upper bound on the number of tasks `add` accepts.
    pub max_tasks: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_data_dir(),
            storage_key: DEFAULT_KEY.to_string(),
            load_policy: LoadPolicy::Lenient,
            max_tasks: DEFAULT_MAX_TASKS,
        }
    }
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Config {
            data_dir: cli.dir.clone().unwrap_or_else(default_data_dir),
            storage_key: cli.key.clone(),
            load_policy: if cli.strict {
                LoadPolicy::Strict
            } else {
                LoadPolicy::Lenient
            },
            max_tasks: cli.max_tasks,
        }
    }

    pub fn open_store(&self) -> TaskStore<FileStorage> {
        TaskStore::new(FileStorage::new(&self.data_dir), self.storage_key.clone())
    }
}

/// `~/.todo`, or `./.todo` when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".todo")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_cli_flags() {
        let cli = Cli::try_parse_from([
            "todo", "--dir", "/tmp/tasks", "--key", "work", "--strict", "--max-tasks", "5",
            "stats",
        ])
        .unwrap();
        let config = Config::from_cli(&cli);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/tasks"));
        assert_eq!(config.storage_key, "work");
        assert_eq!(config.load_policy, LoadPolicy::Strict);
        assert_eq!(config.max_tasks, 5);
        assert_eq!(
            config.open_store().storage().path_for(config.open_store().key()),
            PathBuf::from("/tmp/tasks/work.json")
        );
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage_key, DEFAULT_KEY);
        assert_eq!(config.load_policy, LoadPolicy::Lenient);
        assert_eq!(config.max_tasks, DEFAULT_MAX_TASKS);
        assert!(config.data_dir.ends_with(".todo"));
    }
}
