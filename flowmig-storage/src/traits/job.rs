use crate::entities::job::{StoredJob, UpdateStoredJob};
use crate::error::StorageError;

#[async_trait::async_trait]
pub trait JobStorage: Send + Sync {
    async fn create_job(&self, job: &StoredJob) -> Result<(), StorageError>;

    async fn get_job(&self, job_id: &str) -> Result<Option<StoredJob>, StorageError>;

    async fn find_jobs_by_execution(
        &self,
        execution_id: &str,
    ) -> Result<Vec<StoredJob>, StorageError>;

    async fn find_jobs_by_process_instance(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<StoredJob>, StorageError>;

    async fn update_job(&self, job_id: &str, changes: &UpdateStoredJob)
        -> Result<(), StorageError>;

    async fn delete_job(&self, job_id: &str) -> Result<(), StorageError>;
}
