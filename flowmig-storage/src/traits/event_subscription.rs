use crate::entities::event_subscription::{StoredEventSubscription, UpdateStoredEventSubscription};
use crate::error::StorageError;

#[async_trait::async_trait]
pub trait EventSubscriptionStorage: Send + Sync {
    async fn create_subscription(
        &self,
        subscription: &StoredEventSubscription,
    ) -> Result<(), StorageError>;

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<StoredEventSubscription>, StorageError>;

    async fn find_subscriptions_by_execution(
        &self,
        execution_id: &str,
    ) -> Result<Vec<StoredEventSubscription>, StorageError>;

    async fn find_subscriptions_by_process_instance(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<StoredEventSubscription>, StorageError>;

    async fn update_subscription(
        &self,
        subscription_id: &str,
        changes: &UpdateStoredEventSubscription,
    ) -> Result<(), StorageError>;

    async fn delete_subscription(&self, subscription_id: &str) -> Result<(), StorageError>;
}
