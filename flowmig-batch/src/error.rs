use flowmig_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Batch not found: {0}")]
    UnknownBatch(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
