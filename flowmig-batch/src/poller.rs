//! Stamps a batch COMPLETED once every part has been worked.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{info, warn};
use tokio::task::JoinHandle;

use flowmig_hook::{MigrationEvent, MigrationEventDispatcher};
use flowmig_storage::entities::batch::{
    BATCH_STATUS_COMPLETED, PART_STATUS_COMPLETED, UpdateStoredBatch,
};
use flowmig_storage::PersistenceManager;

use crate::error::BatchError;

pub struct BatchStatusPoller {
    persistence: Arc<dyn PersistenceManager>,
    event_dispatcher: Arc<MigrationEventDispatcher>,
}

impl BatchStatusPoller {
    pub fn new(
        persistence: Arc<dyn PersistenceManager>,
        event_dispatcher: Arc<MigrationEventDispatcher>,
    ) -> Self {
        Self {
            persistence,
            event_dispatcher,
        }
    }

    /// One completion check. Returns `true` once the batch is COMPLETED,
    /// whether stamped now or on an earlier check. Part results do not
    /// matter here; FAIL parts complete a batch like SUCCESS parts do.
    pub async fn check_once(&self, batch_id: &str) -> Result<bool, BatchError> {
        let batch = self
            .persistence
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| BatchError::UnknownBatch(batch_id.to_string()))?;
        if batch.status == BATCH_STATUS_COMPLETED {
            return Ok(true);
        }

        let parts = self.persistence.find_parts_by_batch(batch_id).await?;
        if parts.iter().any(|p| p.status != PART_STATUS_COMPLETED) {
            return Ok(false);
        }

        self.persistence
            .update_batch(
                batch_id,
                &UpdateStoredBatch {
                    status: Some(BATCH_STATUS_COMPLETED.to_string()),
                    complete_time: Some(Some(Utc::now().naive_utc())),
                },
            )
            .await?;
        info!("[BatchStatusPoller] batch {} completed", batch_id);
        self.event_dispatcher
            .dispatch(MigrationEvent::BatchCompleted {
                batch_id: batch_id.to_string(),
            })
            .await;
        Ok(true)
    }

    /// Poll until the batch completes.
    pub fn spawn(self: Arc<Self>, batch_id: String, poll_interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.check_once(&batch_id).await {
                    Ok(true) => break,
                    Ok(false) => tokio::time::sleep(poll_interval).await,
                    Err(err) => {
                        warn!("[BatchStatusPoller] {}", err);
                        tokio::time::sleep(poll_interval).await;
                    }
                }
            }
        })
    }
}
