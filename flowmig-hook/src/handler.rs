use crate::event::MigrationEvent;

#[async_trait::async_trait]
pub trait MigrationEventHandler: Send + Sync {
    async fn handle_event(&self, event: MigrationEvent);
}
