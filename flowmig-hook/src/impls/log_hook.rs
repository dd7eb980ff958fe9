use crate::MigrationEventHandler;
use crate::event::MigrationEvent;
use log::info;
use std::sync::Arc;

pub struct LogHook;

impl LogHook {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

#[async_trait::async_trait]
impl MigrationEventHandler for LogHook {
    async fn handle_event(&self, event: MigrationEvent) {
        info!("[LogHook] {:?}", event);
    }
}
