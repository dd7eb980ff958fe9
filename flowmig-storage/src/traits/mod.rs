pub mod batch;
pub mod event_subscription;
pub mod execution;
pub mod history;
pub mod job;
pub mod task;

// Re-export all traits
pub use batch::BatchStorage;
pub use event_subscription::EventSubscriptionStorage;
pub use execution::ExecutionStorage;
pub use history::HistoryStorage;
pub use job::JobStorage;
pub use task::TaskStorage;
