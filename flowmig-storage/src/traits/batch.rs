use crate::entities::batch::{
    StoredBatch, StoredBatchPart, UpdateStoredBatch, UpdateStoredBatchPart,
};
use crate::error::StorageError;

#[async_trait::async_trait]
pub trait BatchStorage: Send + Sync {
    async fn create_batch(&self, batch: &StoredBatch) -> Result<(), StorageError>;

    async fn get_batch(&self, batch_id: &str) -> Result<Option<StoredBatch>, StorageError>;

    /// Batches whose `search_key` (source definition id) matches
    async fn find_batches_by_search_key(
        &self,
        search_key: &str,
    ) -> Result<Vec<StoredBatch>, StorageError>;

    async fn update_batch(
        &self,
        batch_id: &str,
        changes: &UpdateStoredBatch,
    ) -> Result<(), StorageError>;

    /// Delete a batch and all of its parts
    async fn delete_batch(&self, batch_id: &str) -> Result<(), StorageError>;

    async fn create_part(&self, part: &StoredBatchPart) -> Result<(), StorageError>;

    async fn get_part(&self, part_id: &str) -> Result<Option<StoredBatchPart>, StorageError>;

    async fn find_parts_by_batch(
        &self,
        batch_id: &str,
    ) -> Result<Vec<StoredBatchPart>, StorageError>;

    async fn find_parts_by_batch_and_status(
        &self,
        batch_id: &str,
        status: &str,
    ) -> Result<Vec<StoredBatchPart>, StorageError>;

    /// Any WAITING, unclaimed part, or `None` when the queue is drained
    async fn find_waiting_part(&self) -> Result<Option<StoredBatchPart>, StorageError>;

    /// Atomically claim a WAITING part for `owner`. Returns `false` when the
    /// part was already claimed or completed by another worker; losing
    /// claimers move on to the next part.
    async fn claim_part(&self, part_id: &str, owner: &str) -> Result<bool, StorageError>;

    async fn update_part(
        &self,
        part_id: &str,
        changes: &UpdateStoredBatchPart,
    ) -> Result<(), StorageError>;
}
