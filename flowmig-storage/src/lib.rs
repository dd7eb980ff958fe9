pub mod entities;
pub mod error;
pub mod memory;
pub mod persistence_manager;
pub mod traits;
pub mod transaction;

pub use error::StorageError;
pub use memory::InMemoryPersistence;
pub use persistence_manager::PersistenceManager;
pub use transaction::{ChangeSet, EntityChange, TransactionManager};
