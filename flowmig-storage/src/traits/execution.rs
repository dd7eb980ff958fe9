use crate::entities::execution::{StoredExecution, UpdateStoredExecution};
use crate::error::StorageError;

#[async_trait::async_trait]
pub trait ExecutionStorage: Send + Sync {
    /// Create a new execution
    async fn create_execution(&self, exec: &StoredExecution) -> Result<(), StorageError>;

    /// Get an execution by id
    async fn get_execution(
        &self,
        execution_id: &str,
    ) -> Result<Option<StoredExecution>, StorageError>;

    /// All executions of one process instance (the full tree, unordered)
    async fn find_executions_by_process_instance(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<StoredExecution>, StorageError>;

    /// Direct children of an execution
    async fn find_child_executions(
        &self,
        parent_id: &str,
    ) -> Result<Vec<StoredExecution>, StorageError>;

    /// Process instance ids whose root execution points at the given
    /// definition
    async fn find_process_instance_ids_by_definition(
        &self,
        process_definition_id: &str,
    ) -> Result<Vec<String>, StorageError>;

    /// Update an execution
    async fn update_execution(
        &self,
        execution_id: &str,
        changes: &UpdateStoredExecution,
    ) -> Result<(), StorageError>;

    /// Delete an execution
    async fn delete_execution(&self, execution_id: &str) -> Result<(), StorageError>;
}
