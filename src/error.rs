//! Error taxonomy for the task core.

use crate::validate::ValidationReport;

pub type Result<T, E = TodoError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    /// Bad input to the factory or a mutator. Carries the per-field report.
    #[error("invalid task: {0}")]
    Validation(ValidationReport),

    /// The persistence slot holds something that is not a task list.
    #[error("stored task data is corrupt: {0}")]
    CorruptState(String),

    #[error("no task matches '{0}'")]
    NotFound(String),

    #[error("'{0}' matches more than one task; use the task id instead")]
    Ambiguous(String),

    #[error("task limit of {limit} reached")]
    CapacityExceeded { limit: usize },

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}
