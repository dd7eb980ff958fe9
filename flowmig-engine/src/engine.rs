//! The migration facade: validate, plan, commit, notify.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};

use flowmig_hook::{MigrationEvent, MigrationEventDispatcher};
use flowmig_model::ProcessDefinition;
use flowmig_storage::PersistenceManager;

use crate::artifacts::{ArtifactMigrator, InstanceArtifacts};
use crate::definitions::ProcessDefinitionLookup;
use crate::document::ProcessInstanceMigrationDocument;
use crate::error::MigrationError;
use crate::transformer::TreeTransformer;
use crate::tree::ExecutionTree;
use crate::validation::{resolve_mappings, ResolvedMapping, ValidationResult};

pub struct MigrationEngine {
    persistence: Arc<dyn PersistenceManager>,
    definitions: Arc<dyn ProcessDefinitionLookup>,
    event_dispatcher: Arc<MigrationEventDispatcher>,
}

struct LoadedInstance {
    tree: ExecutionTree,
    source: ProcessDefinition,
    target: ProcessDefinition,
}

impl MigrationEngine {
    pub fn new(
        persistence: Arc<dyn PersistenceManager>,
        definitions: Arc<dyn ProcessDefinitionLookup>,
        event_dispatcher: Arc<MigrationEventDispatcher>,
    ) -> Self {
        Self {
            persistence,
            definitions,
            event_dispatcher,
        }
    }

    /// Pre-flight check only; touches nothing. Safe to repeat, and the
    /// result for an unchanged instance and document is stable.
    pub async fn validate_migration(
        &self,
        process_instance_id: &str,
        document: &ProcessInstanceMigrationDocument,
    ) -> Result<ValidationResult, MigrationError> {
        let loaded = self.load(process_instance_id, document).await?;
        let (_, result) = self.resolve(&loaded, document);
        self.event_dispatcher
            .dispatch(MigrationEvent::ValidationCompleted {
                process_instance_id: process_instance_id.to_string(),
                valid: result.valid,
                message_count: result.messages.len(),
            })
            .await;
        Ok(result)
    }

    /// Migrate one instance onto the document's target definition. Validates
    /// first; on any validation error the instance is left untouched and the
    /// messages are returned. The committed change is all-or-nothing.
    pub async fn migrate(
        &self,
        process_instance_id: &str,
        document: &ProcessInstanceMigrationDocument,
    ) -> Result<(), MigrationError> {
        match self.try_migrate(process_instance_id, document).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.event_dispatcher
                    .dispatch(MigrationEvent::InstanceMigrationFailed {
                        process_instance_id: process_instance_id.to_string(),
                        error: err.part_message(),
                    })
                    .await;
                Err(err)
            }
        }
    }

    async fn try_migrate(
        &self,
        process_instance_id: &str,
        document: &ProcessInstanceMigrationDocument,
    ) -> Result<(), MigrationError> {
        let loaded = self.load(process_instance_id, document).await?;
        let (mappings, result) = self.resolve(&loaded, document);
        if !result.valid {
            return Err(MigrationError::Validation(result.messages));
        }

        let artifacts = self.load_artifacts(process_instance_id).await?;
        let mut plan = TreeTransformer::transform(loaded.tree, &loaded.target, &mappings)?;
        ArtifactMigrator::new(&loaded.target, &artifacts, Utc::now().naive_utc())
            .migrate(&mut plan, &artifacts)?;

        debug!(
            "[MigrationEngine] committing {} changes for instance {}",
            plan.changes.len(),
            process_instance_id
        );
        self.persistence.commit_unit(plan.changes).await?;

        info!(
            "[MigrationEngine] instance {} migrated to {}",
            process_instance_id, loaded.target.id
        );
        self.event_dispatcher
            .dispatch(MigrationEvent::InstanceMigrated {
                process_instance_id: process_instance_id.to_string(),
                target_definition_id: loaded.target.id.clone(),
            })
            .await;
        Ok(())
    }

    fn resolve(
        &self,
        loaded: &LoadedInstance,
        document: &ProcessInstanceMigrationDocument,
    ) -> (Vec<ResolvedMapping>, ValidationResult) {
        let active: Vec<String> = loaded
            .tree
            .active_leaves()
            .into_iter()
            .filter_map(|e| e.activity_id.clone())
            .collect();
        resolve_mappings(&active, &loaded.source, &loaded.target, document)
    }

    async fn load(
        &self,
        process_instance_id: &str,
        document: &ProcessInstanceMigrationDocument,
    ) -> Result<LoadedInstance, MigrationError> {
        let executions = self
            .persistence
            .find_executions_by_process_instance(process_instance_id)
            .await?;
        if executions.is_empty() {
            return Err(MigrationError::UnknownProcessInstance(
                process_instance_id.to_string(),
            ));
        }
        let tree = ExecutionTree::build(executions)?;

        let source_definition_id = tree.root().process_definition_id.clone();
        let source = self
            .definitions
            .definition_by_id(&source_definition_id)
            .await?
            .ok_or_else(|| MigrationError::UnknownProcessDefinition(source_definition_id))?;
        let target = self.resolve_target(document).await?;
        Ok(LoadedInstance {
            tree,
            source,
            target,
        })
    }

    async fn resolve_target(
        &self,
        document: &ProcessInstanceMigrationDocument,
    ) -> Result<ProcessDefinition, MigrationError> {
        if let Some(id) = &document.to_process_definition_id {
            return self
                .definitions
                .definition_by_id(id)
                .await?
                .ok_or_else(|| MigrationError::UnknownProcessDefinition(id.clone()));
        }
        match (
            &document.to_process_definition_key,
            document.to_process_definition_version,
        ) {
            (Some(key), Some(version)) => self
                .definitions
                .find_by_key_and_version(
                    key,
                    version,
                    document.to_process_definition_tenant_id.as_deref(),
                )
                .await?
                .ok_or_else(|| {
                    MigrationError::UnknownProcessDefinition(format!("{}:{}", key, version))
                }),
            _ => Err(MigrationError::UnknownProcessDefinition(
                "migration document names no target definition".to_string(),
            )),
        }
    }

    async fn load_artifacts(
        &self,
        process_instance_id: &str,
    ) -> Result<InstanceArtifacts, MigrationError> {
        Ok(InstanceArtifacts {
            tasks: self
                .persistence
                .find_tasks_by_process_instance(process_instance_id)
                .await?,
            jobs: self
                .persistence
                .find_jobs_by_process_instance(process_instance_id)
                .await?,
            subscriptions: self
                .persistence
                .find_subscriptions_by_process_instance(process_instance_id)
                .await?,
            historic_instance: self
                .persistence
                .get_historic_process_instance(process_instance_id)
                .await?,
            historic_activities: self
                .persistence
                .find_historic_activities_by_process_instance(process_instance_id)
                .await?,
            historic_tasks: self
                .persistence
                .find_historic_tasks_by_process_instance(process_instance_id)
                .await?,
        })
    }
}
