//! The immutable, serializable migration request.
//!
//! Wire shape (§ external interfaces): the target is referenced either by
//! `toProcessDefinitionId` or by `toProcessDefinitionKey` +
//! `toProcessDefinitionVersion` (+ optional `toProcessDefinitionTenantId`);
//! `activityMappings` carries the explicit mappings. Documents round-trip
//! through `as_json_string`/`from_json` to an equal value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ActivityMigrationMapping {
    /// Single-source form; exactly one of this and `from_activity_ids` is
    /// set on a well-formed mapping.
    #[serde(
        rename = "fromActivityId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub from_activity_id: Option<String>,

    /// Many-source form, used to collapse parallel branches onto one target.
    #[serde(
        rename = "fromActivityIds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub from_activity_ids: Option<Vec<String>>,

    #[serde(rename = "toActivityId")]
    pub to_activity_id: String,

    #[serde(
        rename = "newAssignee",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub new_assignee: Option<String>,

    /// Local variables set on the scope execution created for the target.
    #[serde(
        rename = "localVariables",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub local_variables: Option<Map<String, Value>>,
}

impl ActivityMigrationMapping {
    pub fn new(from_activity_id: impl Into<String>, to_activity_id: impl Into<String>) -> Self {
        Self {
            from_activity_id: Some(from_activity_id.into()),
            to_activity_id: to_activity_id.into(),
            ..Default::default()
        }
    }

    pub fn from_many(from_activity_ids: Vec<String>, to_activity_id: impl Into<String>) -> Self {
        Self {
            from_activity_ids: Some(from_activity_ids),
            to_activity_id: to_activity_id.into(),
            ..Default::default()
        }
    }

    pub fn with_new_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.new_assignee = Some(assignee.into());
        self
    }

    pub fn with_local_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.local_variables
            .get_or_insert_with(Map::new)
            .insert(name.into(), value);
        self
    }

    /// All source activity ids, regardless of which form the mapping uses.
    pub fn from_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        if let Some(single) = &self.from_activity_id {
            ids.push(single.as_str());
        }
        if let Some(many) = &self.from_activity_ids {
            ids.extend(many.iter().map(String::as_str));
        }
        ids
    }

    pub fn covers(&self, activity_id: &str) -> bool {
        self.from_ids().contains(&activity_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProcessInstanceMigrationDocument {
    #[serde(
        rename = "toProcessDefinitionId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub to_process_definition_id: Option<String>,

    #[serde(
        rename = "toProcessDefinitionKey",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub to_process_definition_key: Option<String>,

    #[serde(
        rename = "toProcessDefinitionVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub to_process_definition_version: Option<i32>,

    #[serde(
        rename = "toProcessDefinitionTenantId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub to_process_definition_tenant_id: Option<String>,

    #[serde(rename = "activityMappings", default)]
    pub activity_mappings: Vec<ActivityMigrationMapping>,
}

impl ProcessInstanceMigrationDocument {
    pub fn migrate_to_process_definition(definition_id: impl Into<String>) -> Self {
        Self {
            to_process_definition_id: Some(definition_id.into()),
            ..Default::default()
        }
    }

    pub fn migrate_to(key: impl Into<String>, version: i32) -> Self {
        Self {
            to_process_definition_key: Some(key.into()),
            to_process_definition_version: Some(version),
            ..Default::default()
        }
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.to_process_definition_tenant_id = Some(tenant_id.into());
        self
    }

    pub fn add_activity_migration_mapping(mut self, mapping: ActivityMigrationMapping) -> Self {
        self.activity_mappings.push(mapping);
        self
    }

    /// Explicit mapping covering the given source activity id, if any.
    pub fn mapping_for(&self, activity_id: &str) -> Option<&ActivityMigrationMapping> {
        self.activity_mappings.iter().find(|m| m.covers(activity_id))
    }

    pub fn as_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_round_trips() {
        let doc = ProcessInstanceMigrationDocument::migrate_to_process_definition("def:2")
            .add_activity_migration_mapping(
                ActivityMigrationMapping::new("a", "b")
                    .with_new_assignee("kermit")
                    .with_local_variable("priority", json!(7)),
            )
            .add_activity_migration_mapping(ActivityMigrationMapping::from_many(
                vec!["p1".into(), "p2".into()],
                "merged",
            ));

        let json = doc.as_json_string().unwrap();
        let back = ProcessInstanceMigrationDocument::from_json(&json).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn key_version_reference_round_trips() {
        let doc = ProcessInstanceMigrationDocument::migrate_to("order", 3).with_tenant("acme");
        let back =
            ProcessInstanceMigrationDocument::from_json(&doc.as_json_string().unwrap()).unwrap();
        assert_eq!(back.to_process_definition_key.as_deref(), Some("order"));
        assert_eq!(back.to_process_definition_version, Some(3));
        assert_eq!(back.to_process_definition_tenant_id.as_deref(), Some("acme"));
        assert!(back.to_process_definition_id.is_none());
        assert_eq!(doc, back);
    }

    #[test]
    fn serialized_shape_uses_wire_names() {
        let doc = ProcessInstanceMigrationDocument::migrate_to_process_definition("def:2")
            .add_activity_migration_mapping(ActivityMigrationMapping::new("a", "b"));
        let value: Value = serde_json::from_str(&doc.as_json_string().unwrap()).unwrap();

        assert_eq!(value["toProcessDefinitionId"], json!("def:2"));
        assert_eq!(value["activityMappings"][0]["fromActivityId"], json!("a"));
        assert_eq!(value["activityMappings"][0]["toActivityId"], json!("b"));
        // absent optionals are omitted, not null
        assert!(value["activityMappings"][0].get("newAssignee").is_none());
        assert!(value.get("toProcessDefinitionKey").is_none());
    }

    #[test]
    fn many_from_serializes_as_array() {
        let doc = ProcessInstanceMigrationDocument::migrate_to_process_definition("def:2")
            .add_activity_migration_mapping(ActivityMigrationMapping::from_many(
                vec!["p1".into(), "p2".into()],
                "merged",
            ));
        let value: Value = serde_json::from_str(&doc.as_json_string().unwrap()).unwrap();
        assert_eq!(
            value["activityMappings"][0]["fromActivityIds"],
            json!(["p1", "p2"])
        );
        assert!(value["activityMappings"][0].get("fromActivityId").is_none());
    }
}
