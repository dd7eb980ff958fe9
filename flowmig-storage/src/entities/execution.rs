use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One node of a live process instance's execution tree.
///
/// Exactly one execution per instance has `parent_id == None` (the root);
/// every other execution references an existing parent. An active leaf
/// (active, non-scope, no children) marks a position the process is
/// currently at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredExecution {
    pub execution_id: String,
    pub parent_id: Option<String>,
    pub process_instance_id: String,
    pub process_definition_id: String,
    /// `None` on pure scope executions that do not sit at a model node.
    pub activity_id: Option<String>,
    pub is_active: bool,
    pub is_scope: bool,
    pub is_concurrent: bool,
    pub is_event_scope: bool,
    /// Scope-local variables as a JSON object.
    pub variables: Option<Value>,
    pub version: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateStoredExecution {
    pub parent_id: Option<Option<String>>,
    pub process_definition_id: Option<String>,
    pub activity_id: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub is_scope: Option<bool>,
    pub is_concurrent: Option<bool>,
    pub is_event_scope: Option<bool>,
    pub variables: Option<Option<Value>>,
}
