use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A timer or async-continuation job owned by an execution.
///
/// `lock_owner` is set while an external worker holds the job; a locked job
/// survives migration in place (pointers change, lock and retries do not).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredJob {
    pub job_id: String,
    pub execution_id: String,
    pub process_instance_id: String,
    pub process_definition_id: String,
    /// Activity id of the boundary/event/task this job implements.
    pub element_id: String,
    /// "timer" or "async".
    pub job_type: String,
    /// Handler configuration, e.g. `{"topic": "payments"}`.
    pub handler_config: Option<Value>,
    pub due_at: Option<NaiveDateTime>,
    pub retries: i64,
    pub lock_owner: Option<String>,
    pub lock_expiry: Option<NaiveDateTime>,
    pub dead_letter: bool,
    pub version: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateStoredJob {
    pub execution_id: Option<String>,
    pub process_definition_id: Option<String>,
    pub element_id: Option<String>,
    pub handler_config: Option<Option<Value>>,
    pub due_at: Option<Option<NaiveDateTime>>,
    pub retries: Option<i64>,
    pub lock_owner: Option<Option<String>>,
    pub lock_expiry: Option<Option<NaiveDateTime>>,
    pub dead_letter: Option<bool>,
    /// When set, the update fails unless the stored row still has this version.
    pub expected_version: Option<i64>,
}
