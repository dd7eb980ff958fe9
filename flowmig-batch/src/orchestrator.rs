//! Batch submission and result inspection.

use std::sync::Arc;

use chrono::Utc;
use log::info;
use uuid::Uuid;

use flowmig_engine::ProcessInstanceMigrationDocument;
use flowmig_hook::{MigrationEvent, MigrationEventDispatcher};
use flowmig_storage::entities::batch::{
    BATCH_STATUS_IN_PROGRESS, BATCH_TYPE_PROCESS_MIGRATION, PART_RESULT_FAIL, PART_RESULT_SUCCESS,
    PART_RESULT_WAITING, PART_SCOPE_TYPE_BPMN, PART_STATUS_WAITING, StoredBatch, StoredBatchPart,
};
use flowmig_storage::PersistenceManager;

use crate::error::BatchError;

pub struct BatchOrchestrator {
    persistence: Arc<dyn PersistenceManager>,
    event_dispatcher: Arc<MigrationEventDispatcher>,
}

/// Per-result view over one batch's parts.
#[derive(Debug)]
pub struct BatchMigrationResults {
    pub batch: StoredBatch,
    pub all_parts: Vec<StoredBatchPart>,
    pub waiting_parts: Vec<StoredBatchPart>,
    pub successful_parts: Vec<StoredBatchPart>,
    pub failed_parts: Vec<StoredBatchPart>,
}

impl BatchOrchestrator {
    pub fn new(
        persistence: Arc<dyn PersistenceManager>,
        event_dispatcher: Arc<MigrationEventDispatcher>,
    ) -> Self {
        Self {
            persistence,
            event_dispatcher,
        }
    }

    /// Split a bulk migration into one WAITING part per running instance of
    /// the source definition. The document is stored on the batch, so a
    /// worker needs nothing but the part to do its job.
    pub async fn batch_migrate_process_instances(
        &self,
        source_definition_id: &str,
        document: &ProcessInstanceMigrationDocument,
    ) -> Result<StoredBatch, BatchError> {
        let instance_ids = self
            .persistence
            .find_process_instance_ids_by_definition(source_definition_id)
            .await?;

        let batch = StoredBatch {
            batch_id: Uuid::new_v4().to_string(),
            batch_type: BATCH_TYPE_PROCESS_MIGRATION.to_string(),
            search_key: source_definition_id.to_string(),
            search_key2: target_label(document),
            configuration: document.as_json_string()?,
            status: BATCH_STATUS_IN_PROGRESS.to_string(),
            create_time: Utc::now().naive_utc(),
            complete_time: None,
            version: 0,
        };
        self.persistence.create_batch(&batch).await?;

        for instance_id in &instance_ids {
            self.persistence
                .create_part(&StoredBatchPart {
                    part_id: Uuid::new_v4().to_string(),
                    batch_id: batch.batch_id.clone(),
                    scope_id: instance_id.clone(),
                    scope_type: PART_SCOPE_TYPE_BPMN.to_string(),
                    status: PART_STATUS_WAITING.to_string(),
                    result: PART_RESULT_WAITING.to_string(),
                    message: None,
                    claim_owner: None,
                    version: 0,
                })
                .await?;
        }

        info!(
            "[BatchOrchestrator] batch {} submitted with {} parts ({} -> {})",
            batch.batch_id,
            instance_ids.len(),
            batch.search_key,
            batch.search_key2
        );
        self.event_dispatcher
            .dispatch(MigrationEvent::BatchSubmitted {
                batch_id: batch.batch_id.clone(),
                part_count: instance_ids.len(),
            })
            .await;
        Ok(batch)
    }

    pub async fn get_results_of_batch_process_instance_migration(
        &self,
        batch_id: &str,
    ) -> Result<BatchMigrationResults, BatchError> {
        let batch = self
            .persistence
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| BatchError::UnknownBatch(batch_id.to_string()))?;
        let all_parts = self.persistence.find_parts_by_batch(batch_id).await?;
        let by_result = |result: &str| -> Vec<StoredBatchPart> {
            all_parts
                .iter()
                .filter(|p| p.result == result)
                .cloned()
                .collect()
        };
        Ok(BatchMigrationResults {
            waiting_parts: by_result(PART_RESULT_WAITING),
            successful_parts: by_result(PART_RESULT_SUCCESS),
            failed_parts: by_result(PART_RESULT_FAIL),
            all_parts,
            batch,
        })
    }

    /// Remove a batch and all of its parts. Migrations already applied stay
    /// applied.
    pub async fn delete_batch(&self, batch_id: &str) -> Result<(), BatchError> {
        self.persistence.delete_batch(batch_id).await?;
        Ok(())
    }
}

fn target_label(document: &ProcessInstanceMigrationDocument) -> String {
    if let Some(id) = &document.to_process_definition_id {
        return id.clone();
    }
    match (
        &document.to_process_definition_key,
        document.to_process_definition_version,
    ) {
        (Some(key), Some(version)) => format!("{}:{}", key, version),
        _ => String::new(),
    }
}
