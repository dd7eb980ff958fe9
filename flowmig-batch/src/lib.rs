//! Bulk migration on top of the single-instance engine.
//!
//! A batch is split into one part per process instance. Workers claim parts
//! with an optimistic lock and migrate each instance in isolation, so one
//! failing instance never poisons the rest. A poller stamps the batch
//! COMPLETED once every part has been worked, whatever each part's result.

pub mod error;
pub mod orchestrator;
pub mod poller;
pub mod worker;

pub use error::BatchError;
pub use orchestrator::{BatchMigrationResults, BatchOrchestrator};
pub use poller::BatchStatusPoller;
pub use worker::BatchWorker;
