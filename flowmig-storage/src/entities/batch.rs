use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const BATCH_TYPE_PROCESS_MIGRATION: &str = "PROCESS_MIGRATION";
pub const BATCH_STATUS_IN_PROGRESS: &str = "IN_PROGRESS";
pub const BATCH_STATUS_COMPLETED: &str = "COMPLETED";

pub const PART_SCOPE_TYPE_BPMN: &str = "BPMN";
pub const PART_STATUS_WAITING: &str = "WAITING";
pub const PART_STATUS_COMPLETED: &str = "COMPLETED";
pub const PART_RESULT_WAITING: &str = "WAITING";
pub const PART_RESULT_SUCCESS: &str = "SUCCESS";
pub const PART_RESULT_FAIL: &str = "FAIL";

/// One bulk migration request.
///
/// `search_key` holds the source definition id, `search_key2` the target
/// definition id. `configuration` carries the serialized migration
/// document, so workers can re-load it from the batch row alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredBatch {
    pub batch_id: String,
    pub batch_type: String,
    pub search_key: String,
    pub search_key2: String,
    pub configuration: String,
    pub status: String,
    pub create_time: NaiveDateTime,
    pub complete_time: Option<NaiveDateTime>,
    pub version: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateStoredBatch {
    pub status: Option<String>,
    pub complete_time: Option<Option<NaiveDateTime>>,
}

/// One process instance's unit of work within a batch.
///
/// A batch is COMPLETED once every part is COMPLETED, regardless of each
/// part's result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredBatchPart {
    pub part_id: String,
    pub batch_id: String,
    /// Process instance id.
    pub scope_id: String,
    pub scope_type: String,
    pub status: String,
    pub result: String,
    pub message: Option<String>,
    /// Worker currently holding the part, if any.
    pub claim_owner: Option<String>,
    pub version: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateStoredBatchPart {
    pub status: Option<String>,
    pub result: Option<String>,
    pub message: Option<Option<String>>,
    pub claim_owner: Option<Option<String>>,
}
