//! Typed process-definition model consumed by the migration engine.
//!
//! A `ProcessDefinition` is the parsed activity graph of one deployed BPMN
//! process version: activities keyed by id, each carrying its scope parent
//! and a closed [`ActivityKind`]. Parsing BPMN XML into this model is the
//! deployer's job; the migration engine only reads it.

pub mod activity;
pub mod definition;

pub use activity::{ActivityKind, ActivityNode, EventTrigger};
pub use definition::{ProcessDefinition, ProcessDefinitionBuilder};
