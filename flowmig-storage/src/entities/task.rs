use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A user task owned 1:1 by an active execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredTask {
    pub task_id: String,
    pub execution_id: String,
    pub process_instance_id: String,
    pub process_definition_id: String,
    /// Activity id of the owning user task in its definition.
    pub task_definition_key: String,
    pub assignee: Option<String>,
    pub create_time: NaiveDateTime,
    pub version: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateStoredTask {
    pub execution_id: Option<String>,
    pub process_definition_id: Option<String>,
    pub task_definition_key: Option<String>,
    pub assignee: Option<Option<String>>,
    /// When set, the update fails unless the stored row still has this version.
    pub expected_version: Option<i64>,
}
