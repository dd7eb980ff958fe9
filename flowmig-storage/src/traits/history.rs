use crate::entities::history::{
    StoredHistoricActivity, StoredHistoricProcessInstance, StoredHistoricTask,
    UpdateStoredHistoricActivity, UpdateStoredHistoricProcessInstance, UpdateStoredHistoricTask,
};
use crate::error::StorageError;

#[async_trait::async_trait]
pub trait HistoryStorage: Send + Sync {
    async fn create_historic_process_instance(
        &self,
        instance: &StoredHistoricProcessInstance,
    ) -> Result<(), StorageError>;

    async fn get_historic_process_instance(
        &self,
        process_instance_id: &str,
    ) -> Result<Option<StoredHistoricProcessInstance>, StorageError>;

    async fn update_historic_process_instance(
        &self,
        process_instance_id: &str,
        changes: &UpdateStoredHistoricProcessInstance,
    ) -> Result<(), StorageError>;

    async fn create_historic_activity(
        &self,
        activity: &StoredHistoricActivity,
    ) -> Result<(), StorageError>;

    async fn find_historic_activities_by_process_instance(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<StoredHistoricActivity>, StorageError>;

    async fn update_historic_activity(
        &self,
        id: &str,
        changes: &UpdateStoredHistoricActivity,
    ) -> Result<(), StorageError>;

    async fn create_historic_task(&self, task: &StoredHistoricTask) -> Result<(), StorageError>;

    async fn find_historic_tasks_by_process_instance(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<StoredHistoricTask>, StorageError>;

    async fn update_historic_task(
        &self,
        id: &str,
        changes: &UpdateStoredHistoricTask,
    ) -> Result<(), StorageError>;
}
