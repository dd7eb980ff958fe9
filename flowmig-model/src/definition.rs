//! `ProcessDefinition` plus the graph queries the migration engine needs:
//! scope chains, attached boundary events, contained event-sub-process
//! starts. All lookups are by `activity_id`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::activity::{ActivityKind, ActivityNode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDefinition {
    pub id: String,
    pub key: String,
    pub version: i32,
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// All activities keyed by activity id.
    pub activities: HashMap<String, ActivityNode>,
}

impl ProcessDefinition {
    pub fn activity(&self, activity_id: &str) -> Option<&ActivityNode> {
        self.activities.get(activity_id)
    }

    pub fn has_activity(&self, activity_id: &str) -> bool {
        self.activities.contains_key(activity_id)
    }

    /// Whether the given activity id names a scope (sub-process or event
    /// sub-process) in this definition.
    pub fn is_scope(&self, activity_id: &str) -> bool {
        self.activity(activity_id)
            .map(|a| a.kind.is_scope())
            .unwrap_or(false)
    }

    /// Ancestor scope ids of an activity, outermost first. The process root
    /// itself is implicit and not part of the chain.
    pub fn scope_chain(&self, activity_id: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut cursor = self
            .activity(activity_id)
            .and_then(|a| a.parent_id.as_deref());
        while let Some(parent) = cursor {
            chain.push(parent.to_string());
            cursor = self.activity(parent).and_then(|a| a.parent_id.as_deref());
        }
        chain.reverse();
        chain
    }

    /// Boundary events attached to the given activity.
    pub fn boundary_events_on(&self, activity_id: &str) -> Vec<&ActivityNode> {
        self.activities
            .values()
            .filter(|a| {
                matches!(&a.kind, ActivityKind::BoundaryEvent { attached_to, .. }
                    if attached_to == activity_id)
            })
            .collect()
    }

    /// Triggered start events of event sub-processes directly contained in
    /// the given scope.
    pub fn event_subprocess_starts_in(&self, scope_id: &str) -> Vec<&ActivityNode> {
        self.activities
            .values()
            .filter(|a| {
                a.parent_id.as_deref() == Some(scope_id)
                    && matches!(&a.kind, ActivityKind::StartEvent { trigger: Some(_) })
            })
            .collect()
    }

    /// Activities whose enclosing scope is `scope_id`.
    pub fn direct_children_of(&self, scope_id: &str) -> Vec<&ActivityNode> {
        self.activities
            .values()
            .filter(|a| a.parent_id.as_deref() == Some(scope_id))
            .collect()
    }

    /// Nearest ancestor (or self) that is a multi-instance activity.
    pub fn multi_instance_parent(&self, activity_id: &str) -> Option<&ActivityNode> {
        let mut cursor = self.activity(activity_id);
        while let Some(node) = cursor {
            if node.multi_instance {
                return Some(node);
            }
            cursor = node.parent_id.as_deref().and_then(|p| self.activity(p));
        }
        None
    }
}

/// Fluent assembly of a definition, used heavily in tests.
pub struct ProcessDefinitionBuilder {
    definition: ProcessDefinition,
}

impl ProcessDefinitionBuilder {
    pub fn new(id: impl Into<String>, key: impl Into<String>, version: i32) -> Self {
        Self {
            definition: ProcessDefinition {
                id: id.into(),
                key: key.into(),
                version,
                tenant_id: None,
                activities: HashMap::new(),
            },
        }
    }

    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.definition.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn activity(mut self, node: ActivityNode) -> Self {
        self.definition
            .activities
            .insert(node.activity_id.clone(), node);
        self
    }

    pub fn build(self) -> ProcessDefinition {
        self.definition
    }
}
