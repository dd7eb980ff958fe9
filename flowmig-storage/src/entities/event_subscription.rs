use serde::{Deserialize, Serialize};

/// A waiting state for an event-based catch construct (event-sub-process
/// start, intermediate catch event).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredEventSubscription {
    pub subscription_id: String,
    pub execution_id: String,
    pub process_instance_id: String,
    pub process_definition_id: String,
    pub activity_id: String,
    /// "signal", "message" or "timer-start".
    pub event_type: String,
    pub event_name: String,
    pub version: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateStoredEventSubscription {
    pub execution_id: Option<String>,
    pub process_definition_id: Option<String>,
    pub activity_id: Option<String>,
    pub event_type: Option<String>,
    pub event_name: Option<String>,
    /// When set, the update fails unless the stored row still has this version.
    pub expected_version: Option<i64>,
}
