//! In-memory [`PersistenceManager`] used by tests and the batch runtime.
//!
//! A real deployment plugs a database-backed implementation into the same
//! traits; the engine never sees the difference. Atomicity of
//! [`TransactionManager::commit_unit`] is by staging: all changes are
//! applied to a copy of the store under one write guard, and the copy only
//! replaces the live state when every change succeeded.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::entities::batch::{PART_STATUS_WAITING, StoredBatch, StoredBatchPart, UpdateStoredBatch, UpdateStoredBatchPart};
use crate::entities::event_subscription::{StoredEventSubscription, UpdateStoredEventSubscription};
use crate::entities::execution::{StoredExecution, UpdateStoredExecution};
use crate::entities::history::{
    StoredHistoricActivity, StoredHistoricProcessInstance, StoredHistoricTask,
    UpdateStoredHistoricActivity, UpdateStoredHistoricProcessInstance, UpdateStoredHistoricTask,
};
use crate::entities::job::{StoredJob, UpdateStoredJob};
use crate::entities::task::{StoredTask, UpdateStoredTask};
use crate::error::StorageError;
use crate::traits::*;
use crate::transaction::{ChangeSet, EntityChange, TransactionManager};

#[derive(Debug, Clone, Default)]
struct Inner {
    executions: HashMap<String, StoredExecution>,
    tasks: HashMap<String, StoredTask>,
    jobs: HashMap<String, StoredJob>,
    subscriptions: HashMap<String, StoredEventSubscription>,
    historic_instances: HashMap<String, StoredHistoricProcessInstance>,
    historic_activities: HashMap<String, StoredHistoricActivity>,
    historic_tasks: HashMap<String, StoredHistoricTask>,
    batches: HashMap<String, StoredBatch>,
    parts: HashMap<String, StoredBatchPart>,
}

pub struct InMemoryPersistence {
    inner: RwLock<Inner>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

fn unique<T>(
    map: &HashMap<String, T>,
    entity: &str,
    id: &str,
) -> Result<(), StorageError> {
    if map.contains_key(id) {
        return Err(StorageError::UniqueConstraintViolation {
            entity: entity.to_string(),
            field: "id".to_string(),
            value: id.to_string(),
        });
    }
    Ok(())
}

fn missing(entity: &str, id: &str) -> StorageError {
    StorageError::NotFound(format!("{} '{}'", entity, id))
}

fn check_version(
    entity: &str,
    id: &str,
    expected: Option<i64>,
    actual: i64,
) -> Result<(), StorageError> {
    match expected {
        Some(e) if e != actual => Err(StorageError::OptimisticLockConflict {
            entity: entity.to_string(),
            id: id.to_string(),
            expected_version: e,
            actual_version: actual,
        }),
        _ => Ok(()),
    }
}

// Update helpers. Each bumps the row version, mirroring what a database
// backend does for optimistic locking; an update that carries an expected
// version is rejected when the row has moved on.
impl Inner {
    fn create_execution(&mut self, exec: &StoredExecution) -> Result<(), StorageError> {
        unique(&self.executions, "Execution", &exec.execution_id)?;
        self.executions
            .insert(exec.execution_id.clone(), exec.clone());
        Ok(())
    }

    fn update_execution(
        &mut self,
        id: &str,
        changes: &UpdateStoredExecution,
    ) -> Result<(), StorageError> {
        let exec = self
            .executions
            .get_mut(id)
            .ok_or_else(|| missing("Execution", id))?;
        if let Some(v) = &changes.parent_id {
            exec.parent_id = v.clone();
        }
        if let Some(v) = &changes.process_definition_id {
            exec.process_definition_id = v.clone();
        }
        if let Some(v) = &changes.activity_id {
            exec.activity_id = v.clone();
        }
        if let Some(v) = changes.is_active {
            exec.is_active = v;
        }
        if let Some(v) = changes.is_scope {
            exec.is_scope = v;
        }
        if let Some(v) = changes.is_concurrent {
            exec.is_concurrent = v;
        }
        if let Some(v) = changes.is_event_scope {
            exec.is_event_scope = v;
        }
        if let Some(v) = &changes.variables {
            exec.variables = v.clone();
        }
        exec.version += 1;
        Ok(())
    }

    fn delete_execution(&mut self, id: &str) -> Result<(), StorageError> {
        self.executions
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| missing("Execution", id))
    }

    fn create_task(&mut self, task: &StoredTask) -> Result<(), StorageError> {
        unique(&self.tasks, "Task", &task.task_id)?;
        self.tasks.insert(task.task_id.clone(), task.clone());
        Ok(())
    }

    fn update_task(&mut self, id: &str, changes: &UpdateStoredTask) -> Result<(), StorageError> {
        let task = self.tasks.get_mut(id).ok_or_else(|| missing("Task", id))?;
        check_version("Task", id, changes.expected_version, task.version)?;
        if let Some(v) = &changes.execution_id {
            task.execution_id = v.clone();
        }
        if let Some(v) = &changes.process_definition_id {
            task.process_definition_id = v.clone();
        }
        if let Some(v) = &changes.task_definition_key {
            task.task_definition_key = v.clone();
        }
        if let Some(v) = &changes.assignee {
            task.assignee = v.clone();
        }
        task.version += 1;
        Ok(())
    }

    fn delete_task(&mut self, id: &str) -> Result<(), StorageError> {
        self.tasks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| missing("Task", id))
    }

    fn create_job(&mut self, job: &StoredJob) -> Result<(), StorageError> {
        unique(&self.jobs, "Job", &job.job_id)?;
        self.jobs.insert(job.job_id.clone(), job.clone());
        Ok(())
    }

    fn update_job(&mut self, id: &str, changes: &UpdateStoredJob) -> Result<(), StorageError> {
        let job = self.jobs.get_mut(id).ok_or_else(|| missing("Job", id))?;
        check_version("Job", id, changes.expected_version, job.version)?;
        if let Some(v) = &changes.execution_id {
            job.execution_id = v.clone();
        }
        if let Some(v) = &changes.process_definition_id {
            job.process_definition_id = v.clone();
        }
        if let Some(v) = &changes.element_id {
            job.element_id = v.clone();
        }
        if let Some(v) = &changes.handler_config {
            job.handler_config = v.clone();
        }
        if let Some(v) = &changes.due_at {
            job.due_at = *v;
        }
        if let Some(v) = changes.retries {
            job.retries = v;
        }
        if let Some(v) = &changes.lock_owner {
            job.lock_owner = v.clone();
        }
        if let Some(v) = &changes.lock_expiry {
            job.lock_expiry = *v;
        }
        if let Some(v) = changes.dead_letter {
            job.dead_letter = v;
        }
        job.version += 1;
        Ok(())
    }

    fn delete_job(&mut self, id: &str) -> Result<(), StorageError> {
        self.jobs
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| missing("Job", id))
    }

    fn create_subscription(&mut self, sub: &StoredEventSubscription) -> Result<(), StorageError> {
        unique(&self.subscriptions, "EventSubscription", &sub.subscription_id)?;
        self.subscriptions
            .insert(sub.subscription_id.clone(), sub.clone());
        Ok(())
    }

    fn update_subscription(
        &mut self,
        id: &str,
        changes: &UpdateStoredEventSubscription,
    ) -> Result<(), StorageError> {
        let sub = self
            .subscriptions
            .get_mut(id)
            .ok_or_else(|| missing("EventSubscription", id))?;
        check_version("EventSubscription", id, changes.expected_version, sub.version)?;
        if let Some(v) = &changes.execution_id {
            sub.execution_id = v.clone();
        }
        if let Some(v) = &changes.process_definition_id {
            sub.process_definition_id = v.clone();
        }
        if let Some(v) = &changes.activity_id {
            sub.activity_id = v.clone();
        }
        if let Some(v) = &changes.event_type {
            sub.event_type = v.clone();
        }
        if let Some(v) = &changes.event_name {
            sub.event_name = v.clone();
        }
        sub.version += 1;
        Ok(())
    }

    fn delete_subscription(&mut self, id: &str) -> Result<(), StorageError> {
        self.subscriptions
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| missing("EventSubscription", id))
    }

    fn update_historic_instance(
        &mut self,
        id: &str,
        changes: &UpdateStoredHistoricProcessInstance,
    ) -> Result<(), StorageError> {
        let row = self
            .historic_instances
            .get_mut(id)
            .ok_or_else(|| missing("HistoricProcessInstance", id))?;
        check_version("HistoricProcessInstance", id, changes.expected_version, row.version)?;
        if let Some(v) = &changes.process_definition_id {
            row.process_definition_id = v.clone();
        }
        if let Some(v) = &changes.end_time {
            row.end_time = *v;
        }
        row.version += 1;
        Ok(())
    }

    fn update_historic_activity(
        &mut self,
        id: &str,
        changes: &UpdateStoredHistoricActivity,
    ) -> Result<(), StorageError> {
        let row = self
            .historic_activities
            .get_mut(id)
            .ok_or_else(|| missing("HistoricActivity", id))?;
        check_version("HistoricActivity", id, changes.expected_version, row.version)?;
        if let Some(v) = &changes.process_definition_id {
            row.process_definition_id = v.clone();
        }
        if let Some(v) = &changes.end_time {
            row.end_time = *v;
        }
        row.version += 1;
        Ok(())
    }

    fn update_historic_task(
        &mut self,
        id: &str,
        changes: &UpdateStoredHistoricTask,
    ) -> Result<(), StorageError> {
        let row = self
            .historic_tasks
            .get_mut(id)
            .ok_or_else(|| missing("HistoricTask", id))?;
        check_version("HistoricTask", id, changes.expected_version, row.version)?;
        if let Some(v) = &changes.process_definition_id {
            row.process_definition_id = v.clone();
        }
        if let Some(v) = &changes.assignee {
            row.assignee = v.clone();
        }
        if let Some(v) = &changes.end_time {
            row.end_time = *v;
        }
        row.version += 1;
        Ok(())
    }

    fn apply(&mut self, change: &EntityChange) -> Result<(), StorageError> {
        match change {
            EntityChange::CreateExecution(e) => self.create_execution(e),
            EntityChange::UpdateExecution {
                execution_id,
                changes,
            } => self.update_execution(execution_id, changes),
            EntityChange::DeleteExecution(id) => self.delete_execution(id),
            EntityChange::CreateTask(t) => self.create_task(t),
            EntityChange::UpdateTask { task_id, changes } => self.update_task(task_id, changes),
            EntityChange::DeleteTask(id) => self.delete_task(id),
            EntityChange::CreateJob(j) => self.create_job(j),
            EntityChange::UpdateJob { job_id, changes } => self.update_job(job_id, changes),
            EntityChange::DeleteJob(id) => self.delete_job(id),
            EntityChange::CreateSubscription(s) => self.create_subscription(s),
            EntityChange::UpdateSubscription {
                subscription_id,
                changes,
            } => self.update_subscription(subscription_id, changes),
            EntityChange::DeleteSubscription(id) => self.delete_subscription(id),
            EntityChange::UpdateHistoricProcessInstance {
                process_instance_id,
                changes,
            } => self.update_historic_instance(process_instance_id, changes),
            EntityChange::UpdateHistoricActivity { id, changes } => {
                self.update_historic_activity(id, changes)
            }
            EntityChange::UpdateHistoricTask { id, changes } => {
                self.update_historic_task(id, changes)
            }
        }
    }
}

#[async_trait]
impl ExecutionStorage for InMemoryPersistence {
    async fn create_execution(&self, exec: &StoredExecution) -> Result<(), StorageError> {
        self.inner.write().await.create_execution(exec)
    }

    async fn get_execution(&self, id: &str) -> Result<Option<StoredExecution>, StorageError> {
        Ok(self.inner.read().await.executions.get(id).cloned())
    }

    async fn find_executions_by_process_instance(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<StoredExecution>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .executions
            .values()
            .filter(|e| e.process_instance_id == process_instance_id)
            .cloned()
            .collect())
    }

    async fn find_child_executions(
        &self,
        parent_id: &str,
    ) -> Result<Vec<StoredExecution>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .executions
            .values()
            .filter(|e| e.parent_id.as_deref() == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn find_process_instance_ids_by_definition(
        &self,
        process_definition_id: &str,
    ) -> Result<Vec<String>, StorageError> {
        let mut ids: Vec<String> = self
            .inner
            .read()
            .await
            .executions
            .values()
            .filter(|e| e.parent_id.is_none() && e.process_definition_id == process_definition_id)
            .map(|e| e.process_instance_id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn update_execution(
        &self,
        id: &str,
        changes: &UpdateStoredExecution,
    ) -> Result<(), StorageError> {
        self.inner.write().await.update_execution(id, changes)
    }

    async fn delete_execution(&self, id: &str) -> Result<(), StorageError> {
        self.inner.write().await.delete_execution(id)
    }
}

#[async_trait]
impl TaskStorage for InMemoryPersistence {
    async fn create_task(&self, task: &StoredTask) -> Result<(), StorageError> {
        self.inner.write().await.create_task(task)
    }

    async fn get_task(&self, id: &str) -> Result<Option<StoredTask>, StorageError> {
        Ok(self.inner.read().await.tasks.get(id).cloned())
    }

    async fn find_task_by_execution(
        &self,
        execution_id: &str,
    ) -> Result<Option<StoredTask>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .tasks
            .values()
            .find(|t| t.execution_id == execution_id)
            .cloned())
    }

    async fn find_tasks_by_process_instance(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<StoredTask>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .tasks
            .values()
            .filter(|t| t.process_instance_id == process_instance_id)
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: &str, changes: &UpdateStoredTask) -> Result<(), StorageError> {
        self.inner.write().await.update_task(id, changes)
    }

    async fn delete_task(&self, id: &str) -> Result<(), StorageError> {
        self.inner.write().await.delete_task(id)
    }
}

#[async_trait]
impl JobStorage for InMemoryPersistence {
    async fn create_job(&self, job: &StoredJob) -> Result<(), StorageError> {
        self.inner.write().await.create_job(job)
    }

    async fn get_job(&self, id: &str) -> Result<Option<StoredJob>, StorageError> {
        Ok(self.inner.read().await.jobs.get(id).cloned())
    }

    async fn find_jobs_by_execution(
        &self,
        execution_id: &str,
    ) -> Result<Vec<StoredJob>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .jobs
            .values()
            .filter(|j| j.execution_id == execution_id)
            .cloned()
            .collect())
    }

    async fn find_jobs_by_process_instance(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<StoredJob>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .jobs
            .values()
            .filter(|j| j.process_instance_id == process_instance_id)
            .cloned()
            .collect())
    }

    async fn update_job(&self, id: &str, changes: &UpdateStoredJob) -> Result<(), StorageError> {
        self.inner.write().await.update_job(id, changes)
    }

    async fn delete_job(&self, id: &str) -> Result<(), StorageError> {
        self.inner.write().await.delete_job(id)
    }
}

#[async_trait]
impl EventSubscriptionStorage for InMemoryPersistence {
    async fn create_subscription(
        &self,
        subscription: &StoredEventSubscription,
    ) -> Result<(), StorageError> {
        self.inner.write().await.create_subscription(subscription)
    }

    async fn get_subscription(
        &self,
        id: &str,
    ) -> Result<Option<StoredEventSubscription>, StorageError> {
        Ok(self.inner.read().await.subscriptions.get(id).cloned())
    }

    async fn find_subscriptions_by_execution(
        &self,
        execution_id: &str,
    ) -> Result<Vec<StoredEventSubscription>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .subscriptions
            .values()
            .filter(|s| s.execution_id == execution_id)
            .cloned()
            .collect())
    }

    async fn find_subscriptions_by_process_instance(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<StoredEventSubscription>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .subscriptions
            .values()
            .filter(|s| s.process_instance_id == process_instance_id)
            .cloned()
            .collect())
    }

    async fn update_subscription(
        &self,
        id: &str,
        changes: &UpdateStoredEventSubscription,
    ) -> Result<(), StorageError> {
        self.inner.write().await.update_subscription(id, changes)
    }

    async fn delete_subscription(&self, id: &str) -> Result<(), StorageError> {
        self.inner.write().await.delete_subscription(id)
    }
}

#[async_trait]
impl HistoryStorage for InMemoryPersistence {
    async fn create_historic_process_instance(
        &self,
        instance: &StoredHistoricProcessInstance,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        unique(
            &inner.historic_instances,
            "HistoricProcessInstance",
            &instance.process_instance_id,
        )?;
        inner
            .historic_instances
            .insert(instance.process_instance_id.clone(), instance.clone());
        Ok(())
    }

    async fn get_historic_process_instance(
        &self,
        process_instance_id: &str,
    ) -> Result<Option<StoredHistoricProcessInstance>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .historic_instances
            .get(process_instance_id)
            .cloned())
    }

    async fn update_historic_process_instance(
        &self,
        process_instance_id: &str,
        changes: &UpdateStoredHistoricProcessInstance,
    ) -> Result<(), StorageError> {
        self.inner
            .write()
            .await
            .update_historic_instance(process_instance_id, changes)
    }

    async fn create_historic_activity(
        &self,
        activity: &StoredHistoricActivity,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        unique(&inner.historic_activities, "HistoricActivity", &activity.id)?;
        inner
            .historic_activities
            .insert(activity.id.clone(), activity.clone());
        Ok(())
    }

    async fn find_historic_activities_by_process_instance(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<StoredHistoricActivity>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .historic_activities
            .values()
            .filter(|a| a.process_instance_id == process_instance_id)
            .cloned()
            .collect())
    }

    async fn update_historic_activity(
        &self,
        id: &str,
        changes: &UpdateStoredHistoricActivity,
    ) -> Result<(), StorageError> {
        self.inner.write().await.update_historic_activity(id, changes)
    }

    async fn create_historic_task(&self, task: &StoredHistoricTask) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        unique(&inner.historic_tasks, "HistoricTask", &task.id)?;
        inner.historic_tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn find_historic_tasks_by_process_instance(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<StoredHistoricTask>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .historic_tasks
            .values()
            .filter(|t| t.process_instance_id == process_instance_id)
            .cloned()
            .collect())
    }

    async fn update_historic_task(
        &self,
        id: &str,
        changes: &UpdateStoredHistoricTask,
    ) -> Result<(), StorageError> {
        self.inner.write().await.update_historic_task(id, changes)
    }
}

#[async_trait]
impl BatchStorage for InMemoryPersistence {
    async fn create_batch(&self, batch: &StoredBatch) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        unique(&inner.batches, "Batch", &batch.batch_id)?;
        inner.batches.insert(batch.batch_id.clone(), batch.clone());
        Ok(())
    }

    async fn get_batch(&self, batch_id: &str) -> Result<Option<StoredBatch>, StorageError> {
        Ok(self.inner.read().await.batches.get(batch_id).cloned())
    }

    async fn find_batches_by_search_key(
        &self,
        search_key: &str,
    ) -> Result<Vec<StoredBatch>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .batches
            .values()
            .filter(|b| b.search_key == search_key)
            .cloned()
            .collect())
    }

    async fn update_batch(
        &self,
        batch_id: &str,
        changes: &UpdateStoredBatch,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let batch = inner
            .batches
            .get_mut(batch_id)
            .ok_or_else(|| missing("Batch", batch_id))?;
        if let Some(v) = &changes.status {
            batch.status = v.clone();
        }
        if let Some(v) = &changes.complete_time {
            batch.complete_time = *v;
        }
        batch.version += 1;
        Ok(())
    }

    async fn delete_batch(&self, batch_id: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        inner
            .batches
            .remove(batch_id)
            .ok_or_else(|| missing("Batch", batch_id))?;
        inner.parts.retain(|_, p| p.batch_id != batch_id);
        Ok(())
    }

    async fn create_part(&self, part: &StoredBatchPart) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        unique(&inner.parts, "BatchPart", &part.part_id)?;
        inner.parts.insert(part.part_id.clone(), part.clone());
        Ok(())
    }

    async fn get_part(&self, part_id: &str) -> Result<Option<StoredBatchPart>, StorageError> {
        Ok(self.inner.read().await.parts.get(part_id).cloned())
    }

    async fn find_parts_by_batch(
        &self,
        batch_id: &str,
    ) -> Result<Vec<StoredBatchPart>, StorageError> {
        let mut parts: Vec<StoredBatchPart> = self
            .inner
            .read()
            .await
            .parts
            .values()
            .filter(|p| p.batch_id == batch_id)
            .cloned()
            .collect();
        parts.sort_by(|a, b| a.scope_id.cmp(&b.scope_id));
        Ok(parts)
    }

    async fn find_parts_by_batch_and_status(
        &self,
        batch_id: &str,
        status: &str,
    ) -> Result<Vec<StoredBatchPart>, StorageError> {
        Ok(self
            .find_parts_by_batch(batch_id)
            .await?
            .into_iter()
            .filter(|p| p.status == status)
            .collect())
    }

    async fn find_waiting_part(&self) -> Result<Option<StoredBatchPart>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .parts
            .values()
            .find(|p| p.status == PART_STATUS_WAITING && p.claim_owner.is_none())
            .cloned())
    }

    async fn claim_part(&self, part_id: &str, owner: &str) -> Result<bool, StorageError> {
        let mut inner = self.inner.write().await;
        let part = inner
            .parts
            .get_mut(part_id)
            .ok_or_else(|| missing("BatchPart", part_id))?;
        if part.status != PART_STATUS_WAITING || part.claim_owner.is_some() {
            return Ok(false);
        }
        part.claim_owner = Some(owner.to_string());
        part.version += 1;
        Ok(true)
    }

    async fn update_part(
        &self,
        part_id: &str,
        changes: &UpdateStoredBatchPart,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let part = inner
            .parts
            .get_mut(part_id)
            .ok_or_else(|| missing("BatchPart", part_id))?;
        if let Some(v) = &changes.status {
            part.status = v.clone();
        }
        if let Some(v) = &changes.result {
            part.result = v.clone();
        }
        if let Some(v) = &changes.message {
            part.message = v.clone();
        }
        if let Some(v) = &changes.claim_owner {
            part.claim_owner = v.clone();
        }
        part.version += 1;
        Ok(())
    }
}

#[async_trait]
impl TransactionManager for InMemoryPersistence {
    async fn commit_unit(&self, unit: ChangeSet) -> Result<(), StorageError> {
        let mut guard = self.inner.write().await;
        let mut staged = guard.clone();
        for change in &unit.changes {
            staged.apply(change)?;
        }
        *guard = staged;
        Ok(())
    }
}
