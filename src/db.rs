//! Persistence of the task collection.
//!
//! The whole collection lives in a single key-value slot as a JSON array.
//! [`TaskStore`] reads and writes snapshots of it; it never holds on to the
//! collection between calls.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, TodoError};
use crate::factory::generate_id;
use crate::task::Task;

pub const DEFAULT_KEY: &str = "todos";

/// A durable string-to-string slot store.
pub trait Storage {
    /// Read the value stored under `key`, `None` if nothing is stored.
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    /// Replace whatever is stored under `key`.
    fn write(&self, key: &str, value: &str) -> io::Result<()>;
}

/// One `<key>.json` file per slot inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Atomic-ish write via temp file + rename.
    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(value.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

/// In-process slot store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        self.slots.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// What `load` does when the slot holds something unreadable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Log a warning and start from an empty collection.
    #[default]
    Lenient,
    /// Surface [`TodoError::CorruptState`].
    Strict,
}

/// The task collection bound to one storage slot.
#[derive(Debug)]
pub struct TaskStore<S> {
    storage: S,
    key: String,
}

impl<S: Storage> TaskStore<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        TaskStore {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read the collection. An empty slot is an empty collection; anything
    /// other than a JSON array of tasks is [`TodoError::CorruptState`].
    pub fn load(&self) -> Result<Vec<Task>> {
        let Some(raw) = self.storage.read(&self.key)? else {
            tracing::debug!(key = %self.key, "slot empty, starting with no tasks");
            return Ok(Vec::new());
        };
        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| TodoError::CorruptState(format!("invalid JSON: {e}")))?;
        if !value.is_array() {
            return Err(TodoError::CorruptState(format!(
                "expected an array of tasks, found {}",
                json_kind(&value)
            )));
        }
        let tasks: Vec<Task> = serde_json::from_value(value)
            .map_err(|e| TodoError::CorruptState(format!("malformed task: {e}")))?;
        Ok(dedupe_ids(tasks))
    }

    /// Read the collection, applying `policy` to corrupt data. Storage I/O
    /// errors are always returned.
    pub fn load_with(&self, policy: LoadPolicy) -> Result<Vec<Task>> {
        match self.load() {
            Err(TodoError::CorruptState(reason)) if policy == LoadPolicy::Lenient => {
                tracing::warn!(key = %self.key, %reason, "stored tasks unreadable, starting fresh");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Overwrite the slot with `tasks`.
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        let data = serde_json::to_string_pretty(tasks)
            .map_err(|e| TodoError::Storage(io::Error::other(e)))?;
        self.storage.write(&self.key, &data)?;
        tracing::info!(key = %self.key, count = tasks.len(), "saved tasks");
        Ok(())
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Give any task whose id repeats an earlier one a fresh id.
fn dedupe_ids(mut tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::new();
    for task in tasks.iter_mut() {
        while !seen.insert(task.id.clone()) {
            let fresh = generate_id();
            tracing::warn!(old = %task.id, new = %fresh, "duplicate stored id, regenerating");
            task.id = fresh;
        }
    }
    tasks
}
