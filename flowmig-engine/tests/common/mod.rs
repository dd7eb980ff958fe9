//! Shared fixtures: in-memory stores, canned definitions, instance seeding.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use flowmig_engine::{InMemoryDefinitionStore, MigrationEngine};
use flowmig_hook::MigrationEventDispatcher;
use flowmig_model::{ActivityKind, ActivityNode, EventTrigger, ProcessDefinition, ProcessDefinitionBuilder};
use flowmig_storage::entities::event_subscription::StoredEventSubscription;
use flowmig_storage::entities::execution::StoredExecution;
use flowmig_storage::entities::history::{
    StoredHistoricActivity, StoredHistoricProcessInstance, StoredHistoricTask,
};
use flowmig_storage::entities::job::StoredJob;
use flowmig_storage::entities::task::StoredTask;
use flowmig_storage::traits::*;
use flowmig_storage::{InMemoryPersistence, PersistenceManager};

pub struct TestEnv {
    pub persistence: Arc<InMemoryPersistence>,
    pub definitions: Arc<InMemoryDefinitionStore>,
    pub engine: MigrationEngine,
}

pub fn test_env() -> TestEnv {
    let persistence = Arc::new(InMemoryPersistence::new());
    let definitions = Arc::new(InMemoryDefinitionStore::new());
    let engine = MigrationEngine::new(
        persistence.clone() as Arc<dyn PersistenceManager>,
        definitions.clone(),
        Arc::new(MigrationEventDispatcher::noop()),
    );
    TestEnv {
        persistence,
        definitions,
        engine,
    }
}

/// One user task, top level.
pub fn one_task_def(id: &str, version: i32) -> ProcessDefinition {
    ProcessDefinitionBuilder::new(id, "order", version)
        .activity(ActivityNode::new("userTask1Id", ActivityKind::UserTask))
        .build()
}

/// Two user tasks, top level.
pub fn two_task_def(id: &str, version: i32) -> ProcessDefinition {
    ProcessDefinitionBuilder::new(id, "order", version)
        .activity(ActivityNode::new("userTask1Id", ActivityKind::UserTask))
        .activity(ActivityNode::new("userTask2Id", ActivityKind::UserTask))
        .build()
}

/// A user task carrying one timer boundary event.
pub fn boundary_timer_def(
    id: &str,
    version: i32,
    boundary_id: &str,
    duration_secs: i64,
) -> ProcessDefinition {
    ProcessDefinitionBuilder::new(id, "order", version)
        .activity(ActivityNode::new("userTask1Id", ActivityKind::UserTask))
        .activity(ActivityNode::new(
            boundary_id,
            ActivityKind::BoundaryEvent {
                attached_to: "userTask1Id".to_string(),
                trigger: EventTrigger::Timer { duration_secs },
                cancel_activity: true,
            },
        ))
        .build()
}

/// A user task nested inside an embedded sub-process.
pub fn subprocess_def(id: &str, version: i32) -> ProcessDefinition {
    ProcessDefinitionBuilder::new(id, "order", version)
        .activity(ActivityNode::new("sub1", ActivityKind::SubProcess))
        .activity(ActivityNode::new("innerTask1Id", ActivityKind::UserTask).in_scope("sub1"))
        .build()
}

pub fn execution(
    execution_id: &str,
    parent_id: Option<&str>,
    instance_id: &str,
    definition_id: &str,
    activity_id: Option<&str>,
) -> StoredExecution {
    StoredExecution {
        execution_id: execution_id.to_string(),
        parent_id: parent_id.map(String::from),
        process_instance_id: instance_id.to_string(),
        process_definition_id: definition_id.to_string(),
        activity_id: activity_id.map(String::from),
        is_active: true,
        is_scope: activity_id.is_none(),
        is_concurrent: false,
        is_event_scope: false,
        variables: None,
        version: 0,
    }
}

pub fn task(
    execution_id: &str,
    instance_id: &str,
    definition_id: &str,
    key: &str,
    assignee: Option<&str>,
) -> StoredTask {
    StoredTask {
        task_id: Uuid::new_v4().to_string(),
        execution_id: execution_id.to_string(),
        process_instance_id: instance_id.to_string(),
        process_definition_id: definition_id.to_string(),
        task_definition_key: key.to_string(),
        assignee: assignee.map(String::from),
        create_time: Utc::now().naive_utc(),
        version: 0,
    }
}

pub fn timer_job(
    execution_id: &str,
    instance_id: &str,
    definition_id: &str,
    element_id: &str,
    lock_owner: Option<&str>,
) -> StoredJob {
    StoredJob {
        job_id: Uuid::new_v4().to_string(),
        execution_id: execution_id.to_string(),
        process_instance_id: instance_id.to_string(),
        process_definition_id: definition_id.to_string(),
        element_id: element_id.to_string(),
        job_type: "timer".to_string(),
        handler_config: None,
        due_at: Some(Utc::now().naive_utc()),
        retries: 3,
        lock_owner: lock_owner.map(String::from),
        lock_expiry: None,
        dead_letter: false,
        version: 0,
    }
}

pub fn message_subscription(
    execution_id: &str,
    instance_id: &str,
    definition_id: &str,
    activity_id: &str,
    name: &str,
) -> StoredEventSubscription {
    StoredEventSubscription {
        subscription_id: Uuid::new_v4().to_string(),
        execution_id: execution_id.to_string(),
        process_instance_id: instance_id.to_string(),
        process_definition_id: definition_id.to_string(),
        activity_id: activity_id.to_string(),
        event_type: "message".to_string(),
        event_name: name.to_string(),
        version: 0,
    }
}

pub fn historic_instance(instance_id: &str, definition_id: &str) -> StoredHistoricProcessInstance {
    StoredHistoricProcessInstance {
        process_instance_id: instance_id.to_string(),
        process_definition_id: definition_id.to_string(),
        start_time: Utc::now().naive_utc(),
        end_time: None,
        version: 0,
    }
}

pub fn historic_activity(
    instance_id: &str,
    definition_id: &str,
    activity_id: &str,
) -> StoredHistoricActivity {
    StoredHistoricActivity {
        id: Uuid::new_v4().to_string(),
        process_instance_id: instance_id.to_string(),
        process_definition_id: definition_id.to_string(),
        activity_id: activity_id.to_string(),
        start_time: Utc::now().naive_utc(),
        end_time: Some(Utc::now().naive_utc()),
        version: 0,
    }
}

pub fn historic_task(
    instance_id: &str,
    definition_id: &str,
    key: &str,
) -> StoredHistoricTask {
    StoredHistoricTask {
        id: Uuid::new_v4().to_string(),
        process_instance_id: instance_id.to_string(),
        process_definition_id: definition_id.to_string(),
        task_definition_key: key.to_string(),
        assignee: None,
        start_time: Utc::now().naive_utc(),
        end_time: None,
        version: 0,
    }
}

/// Root execution plus one active leaf waiting at `activity_id`, with a
/// user task on the leaf. Returns (root id, leaf id, task id).
pub async fn seed_single_task_instance(
    env: &TestEnv,
    instance_id: &str,
    definition_id: &str,
    activity_id: &str,
    assignee: Option<&str>,
) -> (String, String, String) {
    let root_id = format!("{}-root", instance_id);
    let leaf_id = format!("{}-leaf", instance_id);
    env.persistence
        .create_execution(&execution(&root_id, None, instance_id, definition_id, None))
        .await
        .unwrap();
    env.persistence
        .create_execution(&execution(
            &leaf_id,
            Some(&root_id),
            instance_id,
            definition_id,
            Some(activity_id),
        ))
        .await
        .unwrap();
    let stored_task = task(&leaf_id, instance_id, definition_id, activity_id, assignee);
    let task_id = stored_task.task_id.clone();
    env.persistence.create_task(&stored_task).await.unwrap();
    (root_id, leaf_id, task_id)
}
