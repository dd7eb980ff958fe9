//! Process-instance migration engine.
//!
//! Given a live process instance created against definition version A, the
//! engine re-points its execution tree, tasks, jobs, event subscriptions and
//! history onto definition version B, driven by a
//! [`ProcessInstanceMigrationDocument`]. Validation is pure and collected;
//! the migration itself commits as one transactional unit per instance.

pub mod artifacts;
pub mod definitions;
pub mod document;
pub mod engine;
pub mod error;
pub mod transformer;
pub mod tree;
pub mod validation;

pub use definitions::{InMemoryDefinitionStore, ProcessDefinitionLookup};
pub use document::{ActivityMigrationMapping, ProcessInstanceMigrationDocument};
pub use engine::MigrationEngine;
pub use error::MigrationError;
pub use validation::{ResolvedMapping, ValidationResult};
