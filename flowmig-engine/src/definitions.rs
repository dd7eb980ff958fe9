//! Process-model lookup collaborator. Deployment and BPMN parsing live
//! outside this engine; it only resolves definitions by id or by
//! key + version (+ tenant).

use std::collections::HashMap;

use async_trait::async_trait;
use flowmig_model::ProcessDefinition;
use flowmig_storage::StorageError;
use tokio::sync::RwLock;

#[async_trait]
pub trait ProcessDefinitionLookup: Send + Sync {
    async fn definition_by_id(&self, id: &str)
        -> Result<Option<ProcessDefinition>, StorageError>;

    async fn find_by_key_and_version(
        &self,
        key: &str,
        version: i32,
        tenant_id: Option<&str>,
    ) -> Result<Option<ProcessDefinition>, StorageError>;
}

pub struct InMemoryDefinitionStore {
    definitions: RwLock<HashMap<String, ProcessDefinition>>,
}

impl InMemoryDefinitionStore {
    pub fn new() -> Self {
        Self {
            definitions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn add(&self, definition: ProcessDefinition) {
        self.definitions
            .write()
            .await
            .insert(definition.id.clone(), definition);
    }
}

impl Default for InMemoryDefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessDefinitionLookup for InMemoryDefinitionStore {
    async fn definition_by_id(
        &self,
        id: &str,
    ) -> Result<Option<ProcessDefinition>, StorageError> {
        Ok(self.definitions.read().await.get(id).cloned())
    }

    async fn find_by_key_and_version(
        &self,
        key: &str,
        version: i32,
        tenant_id: Option<&str>,
    ) -> Result<Option<ProcessDefinition>, StorageError> {
        Ok(self
            .definitions
            .read()
            .await
            .values()
            .find(|d| {
                d.key == key && d.version == version && d.tenant_id.as_deref() == tenant_id
            })
            .cloned())
    }
}
