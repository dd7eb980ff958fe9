//! Atomic multi-entity commits.
//!
//! A single-instance migration must land as one all-or-nothing unit: tree,
//! tasks, jobs, event subscriptions and history updates commit together or
//! not at all. The engine builds a [`ChangeSet`] without touching storage
//! and hands it to [`TransactionManager::commit_unit`]; implementations
//! validate every change before applying any.

use async_trait::async_trait;

use crate::entities::*;
use crate::error::StorageError;

/// One create/update/delete against a stored entity.
#[derive(Debug, Clone)]
pub enum EntityChange {
    CreateExecution(StoredExecution),
    UpdateExecution {
        execution_id: String,
        changes: UpdateStoredExecution,
    },
    DeleteExecution(String),

    CreateTask(StoredTask),
    UpdateTask {
        task_id: String,
        changes: UpdateStoredTask,
    },
    DeleteTask(String),

    CreateJob(StoredJob),
    UpdateJob {
        job_id: String,
        changes: UpdateStoredJob,
    },
    DeleteJob(String),

    CreateSubscription(StoredEventSubscription),
    UpdateSubscription {
        subscription_id: String,
        changes: UpdateStoredEventSubscription,
    },
    DeleteSubscription(String),

    UpdateHistoricProcessInstance {
        process_instance_id: String,
        changes: UpdateStoredHistoricProcessInstance,
    },
    UpdateHistoricActivity {
        id: String,
        changes: UpdateStoredHistoricActivity,
    },
    UpdateHistoricTask {
        id: String,
        changes: UpdateStoredHistoricTask,
    },
}

/// An ordered list of changes committed as one unit.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub changes: Vec<EntityChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: EntityChange) {
        self.changes.push(change);
    }

    pub fn extend(&mut self, other: ChangeSet) {
        self.changes.extend(other.changes);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Apply every change in the unit atomically. On any error nothing is
    /// applied and the store is left untouched.
    async fn commit_unit(&self, unit: ChangeSet) -> Result<(), StorageError>;
}
