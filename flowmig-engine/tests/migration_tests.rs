mod common;

use common::*;

use flowmig_engine::{ActivityMigrationMapping, ProcessInstanceMigrationDocument};
use flowmig_model::{ActivityKind, ActivityNode, EventTrigger, ProcessDefinitionBuilder};
use flowmig_storage::traits::*;
use serde_json::json;

#[tokio::test]
async fn auto_migration_repoints_execution_and_task_in_place() {
    let env = test_env();
    env.definitions.add(one_task_def("order:1", 1)).await;
    env.definitions.add(one_task_def("order:2", 2)).await;
    let (root_id, leaf_id, task_id) =
        seed_single_task_instance(&env, "pi-1", "order:1", "userTask1Id", Some("kermit")).await;

    let document = ProcessInstanceMigrationDocument::migrate_to_process_definition("order:2");
    env.engine.migrate("pi-1", &document).await.unwrap();

    // Same executions, same task, new definition pointer.
    let root = env.persistence.get_execution(&root_id).await.unwrap().unwrap();
    assert_eq!(root.process_definition_id, "order:2");
    let leaf = env.persistence.get_execution(&leaf_id).await.unwrap().unwrap();
    assert_eq!(leaf.process_definition_id, "order:2");
    assert_eq!(leaf.activity_id.as_deref(), Some("userTask1Id"));

    let task = env.persistence.get_task(&task_id).await.unwrap().unwrap();
    assert_eq!(task.process_definition_id, "order:2");
    assert_eq!(task.task_definition_key, "userTask1Id");
    assert_eq!(task.assignee.as_deref(), Some("kermit"));
}

#[tokio::test]
async fn explicit_mapping_moves_task_and_reassigns() {
    let env = test_env();
    env.definitions.add(one_task_def("order:1", 1)).await;
    env.definitions.add(two_task_def("order:2", 2)).await;
    let (_, leaf_id, task_id) =
        seed_single_task_instance(&env, "pi-1", "order:1", "userTask1Id", Some("kermit")).await;

    let document = ProcessInstanceMigrationDocument::migrate_to_process_definition("order:2")
        .add_activity_migration_mapping(
            ActivityMigrationMapping::new("userTask1Id", "userTask2Id")
                .with_new_assignee("gonzo"),
        );
    env.engine.migrate("pi-1", &document).await.unwrap();

    let leaf = env.persistence.get_execution(&leaf_id).await.unwrap().unwrap();
    assert_eq!(leaf.activity_id.as_deref(), Some("userTask2Id"));

    let task = env.persistence.get_task(&task_id).await.unwrap().unwrap();
    assert_eq!(task.task_definition_key, "userTask2Id");
    assert_eq!(task.assignee.as_deref(), Some("gonzo"));
}

#[tokio::test]
async fn parallel_branches_collapse_to_one_survivor() {
    let env = test_env();
    env.definitions.add(two_task_def("order:1", 1)).await;
    env.definitions.add(one_task_def("order:2", 2)).await;

    env.persistence
        .create_execution(&execution("pi-1-root", None, "pi-1", "order:1", None))
        .await
        .unwrap();
    let mut branch_a = execution("pi-1-a", Some("pi-1-root"), "pi-1", "order:1", Some("userTask1Id"));
    branch_a.is_concurrent = true;
    let mut branch_b = execution("pi-1-b", Some("pi-1-root"), "pi-1", "order:1", Some("userTask2Id"));
    branch_b.is_concurrent = true;
    env.persistence.create_execution(&branch_a).await.unwrap();
    env.persistence.create_execution(&branch_b).await.unwrap();
    env.persistence
        .create_task(&task("pi-1-a", "pi-1", "order:1", "userTask1Id", None))
        .await
        .unwrap();
    env.persistence
        .create_task(&task("pi-1-b", "pi-1", "order:1", "userTask2Id", None))
        .await
        .unwrap();

    let document = ProcessInstanceMigrationDocument::migrate_to_process_definition("order:2")
        .add_activity_migration_mapping(ActivityMigrationMapping::from_many(
            vec!["userTask1Id".to_string(), "userTask2Id".to_string()],
            "userTask1Id",
        ));
    env.engine.migrate("pi-1", &document).await.unwrap();

    let executions = env
        .persistence
        .find_executions_by_process_instance("pi-1")
        .await
        .unwrap();
    assert_eq!(executions.len(), 2);
    assert!(env.persistence.get_execution("pi-1-b").await.unwrap().is_none());

    let survivor = env.persistence.get_execution("pi-1-a").await.unwrap().unwrap();
    assert!(!survivor.is_concurrent);
    assert_eq!(survivor.activity_id.as_deref(), Some("userTask1Id"));

    let tasks = env
        .persistence
        .find_tasks_by_process_instance("pi-1")
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task_definition_key, "userTask1Id");
    assert_eq!(tasks[0].process_definition_id, "order:2");
}

#[tokio::test]
async fn unlocked_boundary_timer_is_recreated_from_target_model() {
    let env = test_env();
    env.definitions
        .add(boundary_timer_def("order:1", 1, "timerBoundary1", 60))
        .await;
    env.definitions
        .add(boundary_timer_def("order:2", 2, "timerBoundary2", 120))
        .await;
    let (_, leaf_id, _) =
        seed_single_task_instance(&env, "pi-1", "order:1", "userTask1Id", None).await;
    let old_job = timer_job(&leaf_id, "pi-1", "order:1", "timerBoundary1", None);
    let old_job_id = old_job.job_id.clone();
    env.persistence.create_job(&old_job).await.unwrap();

    let document = ProcessInstanceMigrationDocument::migrate_to_process_definition("order:2");
    env.engine.migrate("pi-1", &document).await.unwrap();

    assert!(env.persistence.get_job(&old_job_id).await.unwrap().is_none());
    let jobs = env
        .persistence
        .find_jobs_by_process_instance("pi-1")
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_ne!(job.job_id, old_job_id);
    assert_eq!(job.element_id, "timerBoundary2");
    assert_eq!(job.process_definition_id, "order:2");
    assert!(job.due_at.is_some());
    assert!(job.lock_owner.is_none());
}

#[tokio::test]
async fn locked_timer_job_keeps_identity_and_lock() {
    let env = test_env();
    env.definitions
        .add(boundary_timer_def("order:1", 1, "timerBoundary1", 60))
        .await;
    env.definitions
        .add(boundary_timer_def("order:2", 2, "timerBoundary2", 120))
        .await;
    let (_, leaf_id, _) =
        seed_single_task_instance(&env, "pi-1", "order:1", "userTask1Id", None).await;
    let locked = timer_job(&leaf_id, "pi-1", "order:1", "timerBoundary1", Some("worker-7"));
    let locked_id = locked.job_id.clone();
    let original_due = locked.due_at;
    env.persistence.create_job(&locked).await.unwrap();

    let document = ProcessInstanceMigrationDocument::migrate_to_process_definition("order:2");
    env.engine.migrate("pi-1", &document).await.unwrap();

    let job = env.persistence.get_job(&locked_id).await.unwrap().unwrap();
    assert_eq!(job.lock_owner.as_deref(), Some("worker-7"));
    assert_eq!(job.element_id, "timerBoundary2");
    assert_eq!(job.process_definition_id, "order:2");
    assert_eq!(job.due_at, original_due);
}

#[tokio::test]
async fn entering_a_scope_creates_it_with_local_variables() {
    let env = test_env();
    env.definitions.add(one_task_def("order:1", 1)).await;
    env.definitions.add(subprocess_def("order:2", 2)).await;
    let (root_id, leaf_id, _) =
        seed_single_task_instance(&env, "pi-1", "order:1", "userTask1Id", Some("gonzo")).await;

    let document = ProcessInstanceMigrationDocument::migrate_to_process_definition("order:2")
        .add_activity_migration_mapping(
            ActivityMigrationMapping::new("userTask1Id", "innerTask1Id")
                .with_local_variable("priority", json!(5)),
        );
    env.engine.migrate("pi-1", &document).await.unwrap();

    let executions = env
        .persistence
        .find_executions_by_process_instance("pi-1")
        .await
        .unwrap();
    assert_eq!(executions.len(), 3);

    let scope = executions
        .iter()
        .find(|e| e.activity_id.as_deref() == Some("sub1"))
        .expect("scope execution for sub1");
    assert!(scope.is_scope);
    assert_eq!(scope.parent_id.as_deref(), Some(root_id.as_str()));
    assert_eq!(scope.variables, Some(json!({ "priority": 5 })));

    let leaf = executions
        .iter()
        .find(|e| e.activity_id.as_deref() == Some("innerTask1Id"))
        .expect("leaf execution at innerTask1Id");
    assert_ne!(leaf.execution_id, leaf_id);
    assert_eq!(leaf.parent_id.as_deref(), Some(scope.execution_id.as_str()));

    // Task re-created under the new leaf, assignee carried over.
    let tasks = env
        .persistence
        .find_tasks_by_process_instance("pi-1")
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].execution_id, leaf.execution_id);
    assert_eq!(tasks[0].task_definition_key, "innerTask1Id");
    assert_eq!(tasks[0].assignee.as_deref(), Some("gonzo"));
}

#[tokio::test]
async fn leaving_a_scope_removes_it_and_cancels_its_subscriptions() {
    let env = test_env();
    env.definitions.add(subprocess_def("order:1", 1)).await;
    env.definitions.add(one_task_def("order:2", 2)).await;

    env.persistence
        .create_execution(&execution("pi-1-root", None, "pi-1", "order:1", None))
        .await
        .unwrap();
    let mut scope = execution("pi-1-sub", Some("pi-1-root"), "pi-1", "order:1", Some("sub1"));
    scope.is_scope = true;
    env.persistence.create_execution(&scope).await.unwrap();
    env.persistence
        .create_execution(&execution(
            "pi-1-leaf",
            Some("pi-1-sub"),
            "pi-1",
            "order:1",
            Some("innerTask1Id"),
        ))
        .await
        .unwrap();
    env.persistence
        .create_task(&task("pi-1-leaf", "pi-1", "order:1", "innerTask1Id", Some("kermit")))
        .await
        .unwrap();
    let sub = message_subscription("pi-1-sub", "pi-1", "order:1", "escalationStart", "escalate");
    env.persistence.create_subscription(&sub).await.unwrap();

    let document = ProcessInstanceMigrationDocument::migrate_to_process_definition("order:2")
        .add_activity_migration_mapping(ActivityMigrationMapping::new(
            "innerTask1Id",
            "userTask1Id",
        ));
    env.engine.migrate("pi-1", &document).await.unwrap();

    let executions = env
        .persistence
        .find_executions_by_process_instance("pi-1")
        .await
        .unwrap();
    assert_eq!(executions.len(), 2);
    assert!(env.persistence.get_execution("pi-1-sub").await.unwrap().is_none());

    let leaf = executions
        .iter()
        .find(|e| e.activity_id.as_deref() == Some("userTask1Id"))
        .expect("leaf at userTask1Id");
    assert_eq!(leaf.parent_id.as_deref(), Some("pi-1-root"));

    let subscriptions = env
        .persistence
        .find_subscriptions_by_process_instance("pi-1")
        .await
        .unwrap();
    assert!(subscriptions.is_empty());

    let tasks = env
        .persistence
        .find_tasks_by_process_instance("pi-1")
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task_definition_key, "userTask1Id");
    assert_eq!(tasks[0].assignee.as_deref(), Some("kermit"));
}

#[tokio::test]
async fn history_is_repointed_without_duplication() {
    let env = test_env();
    env.definitions.add(one_task_def("order:1", 1)).await;
    env.definitions.add(one_task_def("order:2", 2)).await;
    seed_single_task_instance(&env, "pi-1", "order:1", "userTask1Id", None).await;

    env.persistence
        .create_historic_process_instance(&historic_instance("pi-1", "order:1"))
        .await
        .unwrap();
    let completed = historic_activity("pi-1", "order:1", "startEvent1Id");
    let running = historic_activity("pi-1", "order:1", "userTask1Id");
    env.persistence.create_historic_activity(&completed).await.unwrap();
    env.persistence.create_historic_activity(&running).await.unwrap();
    let hist_task = historic_task("pi-1", "order:1", "userTask1Id");
    env.persistence.create_historic_task(&hist_task).await.unwrap();

    let document = ProcessInstanceMigrationDocument::migrate_to_process_definition("order:2");
    env.engine.migrate("pi-1", &document).await.unwrap();

    let instance = env
        .persistence
        .get_historic_process_instance("pi-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(instance.process_definition_id, "order:2");

    let activities = env
        .persistence
        .find_historic_activities_by_process_instance("pi-1")
        .await
        .unwrap();
    assert_eq!(activities.len(), 2);
    assert!(activities.iter().all(|a| a.process_definition_id == "order:2"));
    // Activity ids recorded before the migration stay as they were.
    assert!(activities.iter().any(|a| a.activity_id == "startEvent1Id"));

    let historic_tasks = env
        .persistence
        .find_historic_tasks_by_process_instance("pi-1")
        .await
        .unwrap();
    assert_eq!(historic_tasks.len(), 1);
    assert_eq!(historic_tasks[0].id, hist_task.id);
    assert_eq!(historic_tasks[0].process_definition_id, "order:2");
}

#[tokio::test]
async fn locked_timer_job_survives_a_structural_move() {
    let env = test_env();
    env.definitions
        .add(boundary_timer_def("order:1", 1, "timerBoundary1", 60))
        .await;
    let target = ProcessDefinitionBuilder::new("order:2", "order", 2)
        .activity(ActivityNode::new("sub1", ActivityKind::SubProcess))
        .activity(ActivityNode::new("innerTask1Id", ActivityKind::UserTask).in_scope("sub1"))
        .activity(
            ActivityNode::new(
                "timerBoundary2",
                ActivityKind::BoundaryEvent {
                    attached_to: "innerTask1Id".to_string(),
                    trigger: EventTrigger::Timer { duration_secs: 120 },
                    cancel_activity: true,
                },
            )
            .in_scope("sub1"),
        )
        .build();
    env.definitions.add(target).await;
    let (_, leaf_id, _) =
        seed_single_task_instance(&env, "pi-1", "order:1", "userTask1Id", None).await;
    let locked = timer_job(&leaf_id, "pi-1", "order:1", "timerBoundary1", Some("worker-7"));
    let locked_id = locked.job_id.clone();
    let original_due = locked.due_at;
    env.persistence.create_job(&locked).await.unwrap();

    let document = ProcessInstanceMigrationDocument::migrate_to_process_definition("order:2")
        .add_activity_migration_mapping(ActivityMigrationMapping::new(
            "userTask1Id",
            "innerTask1Id",
        ));
    env.engine.migrate("pi-1", &document).await.unwrap();

    // The rebuilt leaf took over the acquired job; no replacement was made.
    let jobs = env
        .persistence
        .find_jobs_by_process_instance("pi-1")
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.job_id, locked_id);
    assert_eq!(job.lock_owner.as_deref(), Some("worker-7"));
    assert_eq!(job.process_definition_id, "order:2");
    assert_eq!(job.element_id, "timerBoundary2");
    assert_eq!(job.due_at, original_due);

    let leaf = env
        .persistence
        .find_executions_by_process_instance("pi-1")
        .await
        .unwrap()
        .into_iter()
        .find(|e| e.activity_id.as_deref() == Some("innerTask1Id"))
        .expect("leaf at innerTask1Id");
    assert_eq!(job.execution_id, leaf.execution_id);
}

#[tokio::test]
async fn locked_timer_job_outlives_a_dropped_boundary() {
    let env = test_env();
    env.definitions
        .add(boundary_timer_def("order:1", 1, "timerBoundary1", 60))
        .await;
    env.definitions.add(one_task_def("order:2", 2)).await;
    let (_, leaf_id, _) =
        seed_single_task_instance(&env, "pi-1", "order:1", "userTask1Id", None).await;
    let locked = timer_job(&leaf_id, "pi-1", "order:1", "timerBoundary1", Some("worker-7"));
    let locked_id = locked.job_id.clone();
    env.persistence.create_job(&locked).await.unwrap();

    let document = ProcessInstanceMigrationDocument::migrate_to_process_definition("order:2");
    env.engine.migrate("pi-1", &document).await.unwrap();

    // The target has no timer boundary, but the job is acquired: it stays,
    // pointing at the target definition under its old element id.
    let job = env.persistence.get_job(&locked_id).await.unwrap().unwrap();
    assert_eq!(job.lock_owner.as_deref(), Some("worker-7"));
    assert_eq!(job.process_definition_id, "order:2");
    assert_eq!(job.element_id, "timerBoundary1");
    let jobs = env
        .persistence
        .find_jobs_by_process_instance("pi-1")
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
}

#[tokio::test]
async fn entering_a_scope_arms_its_event_machinery() {
    let env = test_env();
    env.definitions.add(one_task_def("order:1", 1)).await;
    let target = ProcessDefinitionBuilder::new("order:2", "order", 2)
        .activity(ActivityNode::new("sub1", ActivityKind::SubProcess))
        .activity(ActivityNode::new("innerTask1Id", ActivityKind::UserTask).in_scope("sub1"))
        .activity(
            ActivityNode::new(
                "escalationStart",
                ActivityKind::StartEvent {
                    trigger: Some(EventTrigger::Message {
                        name: "escalate".to_string(),
                    }),
                },
            )
            .in_scope("sub1"),
        )
        .activity(ActivityNode::new(
            "subTimeout",
            ActivityKind::BoundaryEvent {
                attached_to: "sub1".to_string(),
                trigger: EventTrigger::Timer { duration_secs: 300 },
                cancel_activity: true,
            },
        ))
        .build();
    env.definitions.add(target).await;
    seed_single_task_instance(&env, "pi-1", "order:1", "userTask1Id", None).await;

    let document = ProcessInstanceMigrationDocument::migrate_to_process_definition("order:2")
        .add_activity_migration_mapping(ActivityMigrationMapping::new(
            "userTask1Id",
            "innerTask1Id",
        ));
    env.engine.migrate("pi-1", &document).await.unwrap();

    let scope = env
        .persistence
        .find_executions_by_process_instance("pi-1")
        .await
        .unwrap()
        .into_iter()
        .find(|e| e.activity_id.as_deref() == Some("sub1"))
        .expect("scope execution for sub1");

    // The entered scope waits for its event-sub-process start message.
    let subscriptions = env
        .persistence
        .find_subscriptions_by_process_instance("pi-1")
        .await
        .unwrap();
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].activity_id, "escalationStart");
    assert_eq!(subscriptions[0].event_type, "message");
    assert_eq!(subscriptions[0].event_name, "escalate");
    assert_eq!(subscriptions[0].execution_id, scope.execution_id);
    assert_eq!(subscriptions[0].process_definition_id, "order:2");

    // And its boundary timer is scheduled.
    let jobs = env
        .persistence
        .find_jobs_by_process_instance("pi-1")
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].job_type, "timer");
    assert_eq!(jobs[0].element_id, "subTimeout");
    assert_eq!(jobs[0].execution_id, scope.execution_id);
    assert!(jobs[0].due_at.is_some());
}
