use flowmig_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    /// The document failed pre-flight validation; one entry per problem.
    #[error("Migration validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Internal invariant violated while rewriting the tree. Fatal to this
    /// instance's migration; nothing was committed.
    #[error("Transformation error: {0}")]
    Transformation(String),

    #[error("Process instance not found: {0}")]
    UnknownProcessInstance(String),

    #[error("Process definition not found: {0}")]
    UnknownProcessDefinition(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrationError {
    /// Error text recorded on a batch part: validation messages verbatim,
    /// anything else via Display.
    pub fn part_message(&self) -> String {
        match self {
            MigrationError::Validation(messages) => messages.join("; "),
            other => other.to_string(),
        }
    }
}
