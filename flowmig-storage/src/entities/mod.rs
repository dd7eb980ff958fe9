pub mod batch;
pub mod event_subscription;
pub mod execution;
pub mod history;
pub mod job;
pub mod task;

pub use batch::{StoredBatch, StoredBatchPart, UpdateStoredBatch, UpdateStoredBatchPart};
pub use event_subscription::{StoredEventSubscription, UpdateStoredEventSubscription};
pub use execution::{StoredExecution, UpdateStoredExecution};
pub use history::{
    StoredHistoricActivity, StoredHistoricProcessInstance, StoredHistoricTask,
    UpdateStoredHistoricActivity, UpdateStoredHistoricProcessInstance, UpdateStoredHistoricTask,
};
pub use job::{StoredJob, UpdateStoredJob};
pub use task::{StoredTask, UpdateStoredTask};
