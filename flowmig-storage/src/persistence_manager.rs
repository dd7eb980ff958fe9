// src/persistence_manager.rs
use crate::traits::*;
use crate::transaction::TransactionManager;

pub trait PersistenceManager:
    ExecutionStorage
    + TaskStorage
    + JobStorage
    + EventSubscriptionStorage
    + HistoryStorage
    + BatchStorage
    + TransactionManager
    + Send
    + Sync
{
}

// blanket impl
impl<T> PersistenceManager for T where
    T: ExecutionStorage
        + TaskStorage
        + JobStorage
        + EventSubscriptionStorage
        + HistoryStorage
        + BatchStorage
        + TransactionManager
        + Send
        + Sync
{
}
