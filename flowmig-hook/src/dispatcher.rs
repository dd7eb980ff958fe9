use crate::MigrationEventHandler;
use crate::event::MigrationEvent;
use std::sync::Arc;

/// Fans one event out to every registered handler, in registration order.
///
/// The handler list is injected at construction; there is no global
/// registry. Commands that need observability carry an
/// `Arc<MigrationEventDispatcher>`.
pub struct MigrationEventDispatcher {
    handlers: Vec<Arc<dyn MigrationEventHandler>>,
}

impl MigrationEventDispatcher {
    pub fn new(handlers: Vec<Arc<dyn MigrationEventHandler>>) -> Self {
        Self { handlers }
    }

    /// A dispatcher nobody listens to, for callers that do not care.
    pub fn noop() -> Self {
        Self::new(Vec::new())
    }

    pub async fn dispatch(&self, event: MigrationEvent) {
        for handler in &self.handlers {
            handler.handle_event(event.clone()).await;
        }
    }
}
