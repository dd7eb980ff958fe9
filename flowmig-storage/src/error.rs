use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violation for {entity}.{field}: '{value}' already exists")]
    UniqueConstraintViolation {
        entity: String,
        field: String,
        value: String,
    },

    #[error("Optimistic lock conflict for {entity} with id '{id}'. Expected version {expected_version}, found {actual_version}")]
    OptimisticLockConflict {
        entity: String,
        id: String,
        expected_version: i64,
        actual_version: i64,
    },
}
