//! Claims WAITING parts and migrates one instance per part.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::task::JoinHandle;

use flowmig_engine::{MigrationEngine, ProcessInstanceMigrationDocument};
use flowmig_hook::{MigrationEvent, MigrationEventDispatcher};
use flowmig_storage::entities::batch::{
    PART_RESULT_FAIL, PART_RESULT_SUCCESS, PART_STATUS_COMPLETED, StoredBatchPart,
    UpdateStoredBatchPart,
};
use flowmig_storage::PersistenceManager;

use crate::error::BatchError;

pub struct BatchWorker {
    worker_id: String,
    persistence: Arc<dyn PersistenceManager>,
    engine: Arc<MigrationEngine>,
    event_dispatcher: Arc<MigrationEventDispatcher>,
}

impl BatchWorker {
    pub fn new(
        worker_id: impl Into<String>,
        persistence: Arc<dyn PersistenceManager>,
        engine: Arc<MigrationEngine>,
        event_dispatcher: Arc<MigrationEventDispatcher>,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            persistence,
            engine,
            event_dispatcher,
        }
    }

    /// Claim and work one part. `Ok(false)` means the queue was empty; a
    /// lost claim race returns `Ok(true)` and the caller simply tries again.
    pub async fn run_once(&self) -> Result<bool, BatchError> {
        let Some(part) = self.persistence.find_waiting_part().await? else {
            return Ok(false);
        };
        if !self.persistence.claim_part(&part.part_id, &self.worker_id).await? {
            debug!(
                "[BatchWorker:{}] lost claim on part {}",
                self.worker_id, part.part_id
            );
            return Ok(true);
        }
        self.work_part(&part).await?;
        Ok(true)
    }

    /// Work parts until the queue is empty.
    pub async fn run_until_drained(&self) -> Result<(), BatchError> {
        while self.run_once().await? {}
        Ok(())
    }

    /// Background polling loop. Errors are logged, never fatal to the loop.
    pub fn spawn(self: Arc<Self>, poll_interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.run_once().await {
                    Ok(true) => {}
                    Ok(false) => tokio::time::sleep(poll_interval).await,
                    Err(err) => {
                        warn!("[BatchWorker:{}] {}", self.worker_id, err);
                        tokio::time::sleep(poll_interval).await;
                    }
                }
            }
        })
    }

    async fn work_part(&self, part: &StoredBatchPart) -> Result<(), BatchError> {
        let batch = self
            .persistence
            .get_batch(&part.batch_id)
            .await?
            .ok_or_else(|| BatchError::UnknownBatch(part.batch_id.clone()))?;
        let document = ProcessInstanceMigrationDocument::from_json(&batch.configuration)?;

        // One instance per part: a failure here is recorded on the part and
        // never aborts the batch.
        let (result, message) = match self.engine.migrate(&part.scope_id, &document).await {
            Ok(()) => (PART_RESULT_SUCCESS, None),
            Err(err) => (PART_RESULT_FAIL, Some(err.part_message())),
        };

        self.persistence
            .update_part(
                &part.part_id,
                &UpdateStoredBatchPart {
                    status: Some(PART_STATUS_COMPLETED.to_string()),
                    result: Some(result.to_string()),
                    message: Some(message),
                    claim_owner: Some(None),
                },
            )
            .await?;
        self.event_dispatcher
            .dispatch(MigrationEvent::BatchPartCompleted {
                batch_id: part.batch_id.clone(),
                part_id: part.part_id.clone(),
                result: result.to_string(),
            })
            .await;
        Ok(())
    }
}
