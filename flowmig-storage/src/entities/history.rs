//! Historic rows. Migration never duplicates these; it re-points their
//! `process_definition_id` so historic queries stay consistent. Rows for
//! activities absent from the target keep their original activity ids.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredHistoricProcessInstance {
    pub process_instance_id: String,
    pub process_definition_id: String,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub version: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateStoredHistoricProcessInstance {
    pub process_definition_id: Option<String>,
    pub end_time: Option<Option<NaiveDateTime>>,
    /// When set, the update fails unless the stored row still has this version.
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredHistoricActivity {
    pub id: String,
    pub process_instance_id: String,
    pub process_definition_id: String,
    pub activity_id: String,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub version: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateStoredHistoricActivity {
    pub process_definition_id: Option<String>,
    pub end_time: Option<Option<NaiveDateTime>>,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredHistoricTask {
    pub id: String,
    pub process_instance_id: String,
    pub process_definition_id: String,
    pub task_definition_key: String,
    pub assignee: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub version: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateStoredHistoricTask {
    pub process_definition_id: Option<String>,
    pub assignee: Option<Option<String>>,
    pub end_time: Option<Option<NaiveDateTime>>,
    pub expected_version: Option<i64>,
}
