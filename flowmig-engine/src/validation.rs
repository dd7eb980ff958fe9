//! Mapping resolution and pre-flight validation.
//!
//! Pure over (active leaves, source model, target model, document): no
//! persistent state is touched, so repeated calls are idempotent and safe
//! before committing to a migration. All structural problems are collected
//! into one [`ValidationResult`] rather than failing fast; `migrate`
//! refuses to run unless `valid` is true.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use flowmig_model::ProcessDefinition;

use crate::document::{ActivityMigrationMapping, ProcessInstanceMigrationDocument};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub has_errors: bool,
    pub messages: Vec<String>,
}

impl ValidationResult {
    pub fn from_messages(messages: Vec<String>) -> Self {
        Self {
            valid: messages.is_empty(),
            has_errors: !messages.is_empty(),
            messages,
        }
    }
}

/// A fully resolved from→to pair the transformer can execute.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMapping {
    /// Source activity ids; more than one collapses parallel branches.
    pub from_activity_ids: Vec<String>,
    pub to_activity_id: String,
    pub new_assignee: Option<String>,
    pub local_variables: Option<Map<String, Value>>,
}

impl ResolvedMapping {
    fn auto(activity_id: &str) -> Self {
        Self {
            from_activity_ids: vec![activity_id.to_string()],
            to_activity_id: activity_id.to_string(),
            new_assignee: None,
            local_variables: None,
        }
    }

    fn explicit(from_ids: Vec<String>, mapping: &ActivityMigrationMapping) -> Self {
        Self {
            from_activity_ids: from_ids,
            to_activity_id: mapping.to_activity_id.clone(),
            new_assignee: mapping.new_assignee.clone(),
            local_variables: mapping.local_variables.clone(),
        }
    }
}

struct Collector {
    messages: Vec<String>,
}

impl Collector {
    fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    fn add(&mut self, message: String) {
        if !self.messages.contains(&message) {
            self.messages.push(message);
        }
    }
}

/// Complete a possibly partial mapping via activity-id auto-matching and
/// check its structural soundness against both models.
///
/// `active_leaf_activity_ids` are the activity ids the instance is currently
/// waiting at. The returned mappings are only meaningful when the result is
/// valid.
pub fn resolve_mappings(
    active_leaf_activity_ids: &[String],
    source: &ProcessDefinition,
    target: &ProcessDefinition,
    document: &ProcessInstanceMigrationDocument,
) -> (Vec<ResolvedMapping>, ValidationResult) {
    let mut collector = Collector::new();
    let mut resolved = Vec::new();

    check_explicit_mappings(
        active_leaf_activity_ids,
        source,
        target,
        document,
        &mut collector,
    );

    let mut used_mappings: Vec<usize> = Vec::new();
    for leaf in active_leaf_activity_ids {
        // An activity covered by more than one explicit mapping is ambiguous.
        let covering: Vec<usize> = document
            .activity_mappings
            .iter()
            .enumerate()
            .filter(|(_, m)| m.covers(leaf))
            .map(|(i, _)| i)
            .collect();
        if covering.len() > 1 {
            collector.add(format!(
                "Invalid mapping: activity definition Id:'{}' is mapped more than once",
                leaf
            ));
            continue;
        }

        if let Some(&index) = covering.first() {
            if !used_mappings.contains(&index) {
                used_mappings.push(index);
                let mapping = &document.activity_mappings[index];
                resolved.push(ResolvedMapping::explicit(
                    mapping.from_ids().iter().map(|s| s.to_string()).collect(),
                    mapping,
                ));
            }
            continue;
        }

        // Auto-map on identical activity id.
        if target.has_activity(leaf) {
            resolved.push(ResolvedMapping::auto(leaf));
            continue;
        }

        // A multi-instance parent with an explicit mapping covers its
        // children.
        if let Some(mi_parent) = source.multi_instance_parent(leaf) {
            if let Some(mapping) = document.mapping_for(&mi_parent.activity_id) {
                resolved.push(ResolvedMapping::explicit(
                    vec![leaf.clone()],
                    mapping,
                ));
                continue;
            }
        }

        collector.add(format!(
            "Migration Activity mapping missing for activity definition Id:'{}' or its MI Parent",
            leaf
        ));
    }

    check_scope_tearing(&resolved, source, target, &mut collector);

    let result = ValidationResult::from_messages(collector.messages);
    (resolved, result)
}

fn check_explicit_mappings(
    active_leaf_activity_ids: &[String],
    source: &ProcessDefinition,
    target: &ProcessDefinition,
    document: &ProcessInstanceMigrationDocument,
    collector: &mut Collector,
) {
    for mapping in &document.activity_mappings {
        let from_ids = mapping.from_ids();
        if from_ids.is_empty() {
            collector.add(format!(
                "Invalid mapping: no source activity given for target Id:'{}'",
                mapping.to_activity_id
            ));
            continue;
        }

        for from in &from_ids {
            if !source.has_activity(from) {
                collector.add(format!(
                    "Invalid mapping: source activity definition Id:'{}' does not exist in the source process definition",
                    from
                ));
            }
        }

        match target.activity(&mapping.to_activity_id) {
            None => {
                collector.add(format!(
                    "Invalid mapping: target activity definition Id:'{}' does not exist in the target process definition",
                    mapping.to_activity_id
                ));
                continue;
            }
            Some(node) if !node.kind.is_wait_position() => {
                collector.add(format!(
                    "Invalid mapping: target activity definition Id:'{}' is not a supported migration target",
                    mapping.to_activity_id
                ));
            }
            Some(_) => {}
        }

        // Parallel-merge form: all listed sources must be concurrently
        // active siblings under one scope.
        if from_ids.len() > 1 {
            for from in &from_ids {
                if !active_leaf_activity_ids.iter().any(|a| a == from) {
                    collector.add(format!(
                        "Invalid mapping: source activity definition Id:'{}' is not active",
                        from
                    ));
                }
            }
            let scopes: Vec<Option<&str>> = from_ids
                .iter()
                .filter_map(|f| source.activity(f))
                .map(|n| n.parent_id.as_deref())
                .collect();
            if scopes.len() == from_ids.len() && scopes.windows(2).any(|w| w[0] != w[1]) {
                collector.add(format!(
                    "Invalid mapping: source activity definition Ids {:?} are not concurrent within one scope",
                    from_ids
                ));
            }
        }
    }
}

/// No partial scope tearing: when a target sits inside an event sub-process,
/// every mapping whose source shares the same source scope must land inside
/// that same event sub-process.
fn check_scope_tearing(
    resolved: &[ResolvedMapping],
    source: &ProcessDefinition,
    target: &ProcessDefinition,
    collector: &mut Collector,
) {
    for (i, a) in resolved.iter().enumerate() {
        for b in resolved.iter().skip(i + 1) {
            let scope_a = source_scope_of(source, a);
            let scope_b = source_scope_of(source, b);
            if scope_a != scope_b {
                continue;
            }
            let events_a = event_scopes_of(target, &a.to_activity_id);
            let events_b = event_scopes_of(target, &b.to_activity_id);
            for event_scope in &events_a {
                if !events_b.contains(event_scope) {
                    collector.add(format!(
                        "Invalid mapping: activities of scope '{}' are split across event sub-process '{}'",
                        scope_a.unwrap_or("<process>"),
                        event_scope
                    ));
                }
            }
            for event_scope in &events_b {
                if !events_a.contains(event_scope) {
                    collector.add(format!(
                        "Invalid mapping: activities of scope '{}' are split across event sub-process '{}'",
                        scope_a.unwrap_or("<process>"),
                        event_scope
                    ));
                }
            }
        }
    }
}

fn source_scope_of<'a>(
    source: &'a ProcessDefinition,
    mapping: &ResolvedMapping,
) -> Option<&'a str> {
    mapping
        .from_activity_ids
        .first()
        .and_then(|f| source.activity(f))
        .and_then(|n| n.parent_id.as_deref())
        .and_then(|p| source.activity(p))
        .map(|n| n.activity_id.as_str())
}

fn event_scopes_of(target: &ProcessDefinition, activity_id: &str) -> Vec<String> {
    target
        .scope_chain(activity_id)
        .into_iter()
        .filter(|scope| {
            target
                .activity(scope)
                .map(|n| n.kind.is_event_scope())
                .unwrap_or(false)
        })
        .collect()
}
