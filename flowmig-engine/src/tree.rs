//! Arena view of one process instance's execution tree.
//!
//! Executions are kept in an id-keyed map with a parent/child index, so
//! cancellation and re-parenting are pointer-table updates. The tree is
//! rebuilt from storage per command; it is a working copy, never the
//! persistent truth.

use std::collections::HashMap;

use flowmig_storage::entities::execution::StoredExecution;

use crate::error::MigrationError;

#[derive(Debug)]
pub struct ExecutionTree {
    executions: HashMap<String, StoredExecution>,
    children: HashMap<String, Vec<String>>,
    root_id: String,
}

impl ExecutionTree {
    /// Build from the instance's stored executions, checking the structural
    /// invariants: exactly one root, every parent known, no cycles.
    pub fn build(executions: Vec<StoredExecution>) -> Result<Self, MigrationError> {
        let mut roots = executions
            .iter()
            .filter(|e| e.parent_id.is_none())
            .map(|e| e.execution_id.clone());
        let root_id = roots
            .next()
            .ok_or_else(|| MigrationError::Transformation("execution tree has no root".into()))?;
        if roots.next().is_some() {
            return Err(MigrationError::Transformation(
                "execution tree has more than one root".into(),
            ));
        }

        let mut tree = Self {
            executions: HashMap::new(),
            children: HashMap::new(),
            root_id,
        };
        for exec in executions {
            if let Some(parent) = &exec.parent_id {
                tree.children
                    .entry(parent.clone())
                    .or_default()
                    .push(exec.execution_id.clone());
            }
            tree.executions.insert(exec.execution_id.clone(), exec);
        }

        for parent in tree.children.keys() {
            if !tree.executions.contains_key(parent) {
                return Err(MigrationError::Transformation(format!(
                    "execution references unknown parent '{}'",
                    parent
                )));
            }
        }
        // Walking to the root from every node also rules out cycles.
        for id in tree.executions.keys() {
            let mut cursor = id.as_str();
            let mut hops = 0usize;
            while let Some(parent) = tree.executions[cursor].parent_id.as_deref() {
                cursor = parent;
                hops += 1;
                if hops > tree.executions.len() {
                    return Err(MigrationError::Transformation(
                        "cycle in execution tree".into(),
                    ));
                }
            }
            if cursor != tree.root_id {
                return Err(MigrationError::Transformation(format!(
                    "execution '{}' is not attached to the root",
                    id
                )));
            }
        }
        Ok(tree)
    }

    pub fn root(&self) -> &StoredExecution {
        &self.executions[&self.root_id]
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn get(&self, execution_id: &str) -> Option<&StoredExecution> {
        self.executions.get(execution_id)
    }

    pub fn get_mut(&mut self, execution_id: &str) -> Option<&mut StoredExecution> {
        self.executions.get_mut(execution_id)
    }

    pub fn contains(&self, execution_id: &str) -> bool {
        self.executions.contains_key(execution_id)
    }

    pub fn children_of(&self, execution_id: &str) -> &[String] {
        self.children
            .get(execution_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Parent chain, nearest ancestor first, root last.
    pub fn ancestors_of(&self, execution_id: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut cursor = self
            .executions
            .get(execution_id)
            .and_then(|e| e.parent_id.as_deref());
        while let Some(parent) = cursor {
            chain.push(parent.to_string());
            cursor = self
                .executions
                .get(parent)
                .and_then(|e| e.parent_id.as_deref());
        }
        chain
    }

    /// Active leaves: the positions the process is currently at.
    pub fn active_leaves(&self) -> Vec<&StoredExecution> {
        self.executions
            .values()
            .filter(|e| {
                e.is_active && e.activity_id.is_some() && self.children_of(&e.execution_id).is_empty()
            })
            .collect()
    }

    pub fn find_active_leaf_by_activity(&self, activity_id: &str) -> Option<&StoredExecution> {
        self.active_leaves()
            .into_iter()
            .find(|e| e.activity_id.as_deref() == Some(activity_id))
    }

    pub fn all(&self) -> impl Iterator<Item = &StoredExecution> {
        self.executions.values()
    }

    pub fn len(&self) -> usize {
        self.executions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }

    /// Insert a new execution under its recorded parent.
    pub fn insert(&mut self, exec: StoredExecution) -> Result<(), MigrationError> {
        if self.executions.contains_key(&exec.execution_id) {
            return Err(MigrationError::Transformation(format!(
                "duplicate execution id '{}'",
                exec.execution_id
            )));
        }
        match &exec.parent_id {
            Some(parent) if !self.executions.contains_key(parent) => {
                return Err(MigrationError::Transformation(format!(
                    "insert under unknown parent '{}'",
                    parent
                )));
            }
            None => {
                return Err(MigrationError::Transformation(
                    "cannot insert a second root execution".into(),
                ));
            }
            _ => {}
        }
        if let Some(parent) = &exec.parent_id {
            self.children
                .entry(parent.clone())
                .or_default()
                .push(exec.execution_id.clone());
        }
        self.executions.insert(exec.execution_id.clone(), exec);
        Ok(())
    }

    /// Remove a childless execution.
    pub fn remove(&mut self, execution_id: &str) -> Result<StoredExecution, MigrationError> {
        if !self.children_of(execution_id).is_empty() {
            return Err(MigrationError::Transformation(format!(
                "cannot remove execution '{}' while it has children",
                execution_id
            )));
        }
        let exec = self.executions.remove(execution_id).ok_or_else(|| {
            MigrationError::Transformation(format!("unknown execution '{}'", execution_id))
        })?;
        if let Some(parent) = &exec.parent_id {
            if let Some(siblings) = self.children.get_mut(parent) {
                siblings.retain(|c| c != execution_id);
            }
        }
        self.children.remove(execution_id);
        Ok(exec)
    }
}
