use crate::entities::task::{StoredTask, UpdateStoredTask};
use crate::error::StorageError;

#[async_trait::async_trait]
pub trait TaskStorage: Send + Sync {
    async fn create_task(&self, task: &StoredTask) -> Result<(), StorageError>;

    async fn get_task(&self, task_id: &str) -> Result<Option<StoredTask>, StorageError>;

    /// The task owned by one execution, if any (tasks are 1:1 with their
    /// owning execution)
    async fn find_task_by_execution(
        &self,
        execution_id: &str,
    ) -> Result<Option<StoredTask>, StorageError>;

    async fn find_tasks_by_process_instance(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<StoredTask>, StorageError>;

    async fn update_task(
        &self,
        task_id: &str,
        changes: &UpdateStoredTask,
    ) -> Result<(), StorageError>;

    async fn delete_task(&self, task_id: &str) -> Result<(), StorageError>;
}
