//! Structural diffing of the execution tree.
//!
//! The transformer owns a working copy of the tree and never touches
//! storage: it emits a [`MigrationPlan`] whose `ChangeSet` is committed in
//! one unit by the engine. Any internal inconsistency aborts the plan;
//! a tree is never partially rewired.

use std::collections::HashSet;

use log::debug;
use serde_json::Value;
use uuid::Uuid;

use flowmig_model::ProcessDefinition;
use flowmig_storage::entities::execution::{StoredExecution, UpdateStoredExecution};
use flowmig_storage::{ChangeSet, EntityChange};

use crate::error::MigrationError;
use crate::tree::ExecutionTree;
use crate::validation::ResolvedMapping;

#[derive(Debug, Clone)]
pub struct EnteredScope {
    pub execution_id: String,
    pub activity_id: String,
}

#[derive(Debug, Clone)]
pub enum MoveKind {
    /// Leaf relocated in place; owning artifacts keep their identity.
    Direct { execution_id: String },
    /// Leaf re-created under a different scope parent; owning artifacts are
    /// cancelled and re-created.
    Rebuilt {
        old_execution_id: String,
        new_execution_id: String,
    },
}

/// What happened to one resolved mapping, as input for the artifact
/// migrator.
#[derive(Debug, Clone)]
pub struct StructuralMove {
    pub kind: MoveKind,
    pub from_activity_id: String,
    pub to_activity_id: String,
    pub new_assignee: Option<String>,
    /// Collapsed parallel siblings.
    pub cancelled_execution_ids: Vec<String>,
    /// Scopes removed bottom-up after the leaf left them.
    pub exited_scope_execution_ids: Vec<String>,
    /// Scopes created top-down on the way to the target.
    pub entered_scopes: Vec<EnteredScope>,
}

#[derive(Debug)]
pub struct MigrationPlan {
    pub target_definition_id: String,
    pub changes: ChangeSet,
    pub moves: Vec<StructuralMove>,
}

pub struct TreeTransformer<'a> {
    tree: ExecutionTree,
    target: &'a ProcessDefinition,
    changes: ChangeSet,
    moves: Vec<StructuralMove>,
}

impl<'a> TreeTransformer<'a> {
    /// Compute the minimal structural diff moving `tree` onto the target
    /// definition under the given resolved mappings.
    pub fn transform(
        tree: ExecutionTree,
        target: &'a ProcessDefinition,
        mappings: &[ResolvedMapping],
    ) -> Result<MigrationPlan, MigrationError> {
        let mut transformer = Self {
            tree,
            target,
            changes: ChangeSet::new(),
            moves: Vec::new(),
        };
        for mapping in mappings {
            transformer.apply_mapping(mapping)?;
        }
        transformer.repoint_surviving_executions();
        Ok(MigrationPlan {
            target_definition_id: target.id.clone(),
            changes: transformer.changes,
            moves: transformer.moves,
        })
    }

    fn apply_mapping(&mut self, mapping: &ResolvedMapping) -> Result<(), MigrationError> {
        let survivor_from = mapping.from_activity_ids.first().ok_or_else(|| {
            MigrationError::Transformation("resolved mapping without source".into())
        })?;
        let survivor_id = self.active_leaf_id(survivor_from)?;

        // Collapse parallel branches: all but the first listed source are
        // cancelled with their artifacts.
        let mut cancelled = Vec::new();
        let mut exited = Vec::new();
        for from in mapping.from_activity_ids.iter().skip(1) {
            let loser_id = self.active_leaf_id(from)?;
            let loser = self.tree.remove(&loser_id)?;
            self.changes
                .push(EntityChange::DeleteExecution(loser_id.clone()));
            cancelled.push(loser_id);
            exited.extend(self.remove_empty_ancestors(loser.parent_id.as_deref()));
        }
        self.clear_last_concurrent_flag(&survivor_id);

        // Diff the survivor's scope chain against the target's.
        let old_chain = self.scope_chain_of(&survivor_id);
        let new_chain = self.target.scope_chain(&mapping.to_activity_id);
        let prefix = old_chain
            .iter()
            .zip(new_chain.iter())
            .take_while(|((_, old_activity), new_activity)| old_activity == *new_activity)
            .count();

        let mut parent_exec_id = if prefix > 0 {
            old_chain[prefix - 1].0.clone()
        } else {
            self.tree.root_id().to_string()
        };

        let mut entered = Vec::new();
        for scope_activity in &new_chain[prefix..] {
            parent_exec_id = self.find_or_create_scope(&parent_exec_id, scope_activity, &mut entered)?;
        }
        if let Some(vars) = &mapping.local_variables {
            if let Some(deepest) = entered.last() {
                self.set_variables(&deepest.execution_id, vars.clone().into_iter().collect())?;
            }
        }

        let structural = !entered.is_empty() || prefix < old_chain.len();
        let kind = if structural {
            debug!(
                "[Transformer] structural move {} -> {} (entered {}, exited below prefix {})",
                survivor_from,
                mapping.to_activity_id,
                entered.len(),
                old_chain.len() - prefix
            );
            let old = self.tree.remove(&survivor_id)?;
            self.changes
                .push(EntityChange::DeleteExecution(survivor_id.clone()));

            let new_execution = StoredExecution {
                execution_id: Uuid::new_v4().to_string(),
                parent_id: Some(parent_exec_id),
                process_instance_id: old.process_instance_id.clone(),
                process_definition_id: self.target.id.clone(),
                activity_id: Some(mapping.to_activity_id.clone()),
                is_active: true,
                is_scope: false,
                is_concurrent: false,
                is_event_scope: false,
                variables: old.variables.clone(),
                version: 0,
            };
            let new_id = new_execution.execution_id.clone();
            self.tree.insert(new_execution.clone())?;
            self.changes.push(EntityChange::CreateExecution(new_execution));

            exited.extend(self.remove_empty_ancestors(old.parent_id.as_deref()));
            MoveKind::Rebuilt {
                old_execution_id: survivor_id,
                new_execution_id: new_id,
            }
        } else {
            debug!(
                "[Transformer] direct move {} -> {}",
                survivor_from, mapping.to_activity_id
            );
            let exec = self
                .tree
                .get_mut(&survivor_id)
                .ok_or_else(|| transformation(format!("lost execution '{}'", survivor_id)))?;
            exec.activity_id = Some(mapping.to_activity_id.clone());
            exec.process_definition_id = self.target.id.clone();
            self.changes.push(EntityChange::UpdateExecution {
                execution_id: survivor_id.clone(),
                changes: UpdateStoredExecution {
                    activity_id: Some(Some(mapping.to_activity_id.clone())),
                    process_definition_id: Some(self.target.id.clone()),
                    ..Default::default()
                },
            });
            MoveKind::Direct {
                execution_id: survivor_id,
            }
        };

        self.moves.push(StructuralMove {
            kind,
            from_activity_id: survivor_from.clone(),
            to_activity_id: mapping.to_activity_id.clone(),
            new_assignee: mapping.new_assignee.clone(),
            cancelled_execution_ids: cancelled,
            exited_scope_execution_ids: exited,
            entered_scopes: entered,
        });
        Ok(())
    }

    fn active_leaf_id(&self, activity_id: &str) -> Result<String, MigrationError> {
        self.tree
            .find_active_leaf_by_activity(activity_id)
            .map(|e| e.execution_id.clone())
            .ok_or_else(|| {
                transformation(format!(
                    "no active execution at activity '{}'",
                    activity_id
                ))
            })
    }

    /// Ancestor scope executions of a leaf (root excluded), outermost first,
    /// as (execution id, scope activity id).
    fn scope_chain_of(&self, execution_id: &str) -> Vec<(String, String)> {
        let mut chain: Vec<(String, String)> = self
            .tree
            .ancestors_of(execution_id)
            .into_iter()
            .filter(|id| id != self.tree.root_id())
            .filter_map(|id| {
                let exec = self.tree.get(&id)?;
                let activity = exec.activity_id.clone()?;
                Some((id, activity))
            })
            .collect();
        chain.reverse();
        chain
    }

    /// Walk upward removing scopes emptied by a leaf departure, bottom-up,
    /// stopping at the root or the first non-empty scope.
    fn remove_empty_ancestors(&mut self, start: Option<&str>) -> Vec<String> {
        let mut removed = Vec::new();
        let mut cursor = start.map(String::from);
        while let Some(id) = cursor {
            if id == self.tree.root_id() || !self.tree.children_of(&id).is_empty() {
                break;
            }
            // remove() cannot fail here: the scope exists and is childless.
            let Ok(exec) = self.tree.remove(&id) else { break };
            self.changes.push(EntityChange::DeleteExecution(id.clone()));
            removed.push(id);
            cursor = exec.parent_id;
        }
        removed
    }

    /// After a collapse, a survivor left as the only child of its parent is
    /// no longer concurrent.
    fn clear_last_concurrent_flag(&mut self, survivor_id: &str) {
        let Some(survivor) = self.tree.get(survivor_id) else {
            return;
        };
        if !survivor.is_concurrent {
            return;
        }
        let Some(parent) = survivor.parent_id.clone() else {
            return;
        };
        if self.tree.children_of(&parent).len() != 1 {
            return;
        }
        if let Some(exec) = self.tree.get_mut(survivor_id) {
            exec.is_concurrent = false;
        }
        self.changes.push(EntityChange::UpdateExecution {
            execution_id: survivor_id.to_string(),
            changes: UpdateStoredExecution {
                is_concurrent: Some(false),
                ..Default::default()
            },
        });
    }

    /// Reuse an existing child scope execution or create one, returning its
    /// execution id.
    fn find_or_create_scope(
        &mut self,
        parent_exec_id: &str,
        scope_activity_id: &str,
        entered: &mut Vec<EnteredScope>,
    ) -> Result<String, MigrationError> {
        if let Some(existing) = self
            .tree
            .children_of(parent_exec_id)
            .iter()
            .find(|child| {
                self.tree
                    .get(child)
                    .map(|e| e.is_scope && e.activity_id.as_deref() == Some(scope_activity_id))
                    .unwrap_or(false)
            })
            .cloned()
        {
            return Ok(existing);
        }

        let node = self.target.activity(scope_activity_id).ok_or_else(|| {
            transformation(format!(
                "target scope '{}' missing from target definition",
                scope_activity_id
            ))
        })?;
        let parent = self.tree.get(parent_exec_id).ok_or_else(|| {
            transformation(format!("unknown scope parent '{}'", parent_exec_id))
        })?;
        let scope_execution = StoredExecution {
            execution_id: Uuid::new_v4().to_string(),
            parent_id: Some(parent_exec_id.to_string()),
            process_instance_id: parent.process_instance_id.clone(),
            process_definition_id: self.target.id.clone(),
            activity_id: Some(scope_activity_id.to_string()),
            is_active: true,
            is_scope: true,
            is_concurrent: false,
            is_event_scope: node.kind.is_event_scope(),
            variables: None,
            version: 0,
        };
        let id = scope_execution.execution_id.clone();
        self.tree.insert(scope_execution.clone())?;
        self.changes
            .push(EntityChange::CreateExecution(scope_execution));
        entered.push(EnteredScope {
            execution_id: id.clone(),
            activity_id: scope_activity_id.to_string(),
        });
        Ok(id)
    }

    fn set_variables(
        &mut self,
        execution_id: &str,
        vars: serde_json::Map<String, Value>,
    ) -> Result<(), MigrationError> {
        let exec = self
            .tree
            .get_mut(execution_id)
            .ok_or_else(|| transformation(format!("unknown execution '{}'", execution_id)))?;
        exec.variables = Some(Value::Object(vars.clone()));
        // The execution was created within this plan; rewrite its pending
        // create instead of stacking an update on top.
        for change in self.changes.changes.iter_mut().rev() {
            if let EntityChange::CreateExecution(e) = change {
                if e.execution_id == execution_id {
                    e.variables = Some(Value::Object(vars));
                    return Ok(());
                }
            }
        }
        self.changes.push(EntityChange::UpdateExecution {
            execution_id: execution_id.to_string(),
            changes: UpdateStoredExecution {
                variables: Some(Some(Value::Object(vars))),
                ..Default::default()
            },
        });
        Ok(())
    }

    /// Every surviving execution is attributed to the target definition,
    /// including unchanged surrounding scopes, so definition-scoped queries
    /// stay correct.
    fn repoint_surviving_executions(&mut self) {
        let stale: Vec<String> = self
            .tree
            .all()
            .filter(|e| e.process_definition_id != self.target.id)
            .map(|e| e.execution_id.clone())
            .collect();
        let mut seen = HashSet::new();
        for id in stale {
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(exec) = self.tree.get_mut(&id) {
                exec.process_definition_id = self.target.id.clone();
            }
            self.changes.push(EntityChange::UpdateExecution {
                execution_id: id,
                changes: UpdateStoredExecution {
                    process_definition_id: Some(self.target.id.clone()),
                    ..Default::default()
                },
            });
        }
    }
}

fn transformation(message: String) -> MigrationError {
    MigrationError::Transformation(message)
}
