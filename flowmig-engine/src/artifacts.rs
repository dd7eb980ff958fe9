//! Re-points or re-creates tasks, jobs, event subscriptions and history
//! records as a consequence of the transformer's structural moves. Appends
//! to the plan's `ChangeSet`; nothing is committed here.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use serde_json::json;
use uuid::Uuid;

use flowmig_model::{ActivityKind, EventTrigger, ProcessDefinition};
use flowmig_storage::entities::event_subscription::{
    StoredEventSubscription, UpdateStoredEventSubscription,
};
use flowmig_storage::entities::history::{
    StoredHistoricActivity, StoredHistoricProcessInstance, StoredHistoricTask,
    UpdateStoredHistoricActivity, UpdateStoredHistoricProcessInstance, UpdateStoredHistoricTask,
};
use flowmig_storage::entities::job::{StoredJob, UpdateStoredJob};
use flowmig_storage::entities::task::{StoredTask, UpdateStoredTask};
use flowmig_storage::EntityChange;

use crate::error::MigrationError;
use crate::transformer::{MigrationPlan, MoveKind, StructuralMove};

/// Runtime artifacts of one process instance, loaded before planning.
#[derive(Debug, Default)]
pub struct InstanceArtifacts {
    pub tasks: Vec<StoredTask>,
    pub jobs: Vec<StoredJob>,
    pub subscriptions: Vec<StoredEventSubscription>,
    pub historic_instance: Option<StoredHistoricProcessInstance>,
    pub historic_activities: Vec<StoredHistoricActivity>,
    pub historic_tasks: Vec<StoredHistoricTask>,
}

pub struct ArtifactMigrator<'a> {
    target: &'a ProcessDefinition,
    now: NaiveDateTime,
    tasks_by_execution: HashMap<String, StoredTask>,
    jobs_by_execution: HashMap<String, Vec<StoredJob>>,
    subscriptions_by_execution: HashMap<String, Vec<StoredEventSubscription>>,
}

impl<'a> ArtifactMigrator<'a> {
    pub fn new(target: &'a ProcessDefinition, artifacts: &InstanceArtifacts, now: NaiveDateTime) -> Self {
        let mut tasks_by_execution = HashMap::new();
        for task in &artifacts.tasks {
            tasks_by_execution.insert(task.execution_id.clone(), task.clone());
        }
        let mut jobs_by_execution: HashMap<String, Vec<StoredJob>> = HashMap::new();
        for job in &artifacts.jobs {
            jobs_by_execution
                .entry(job.execution_id.clone())
                .or_default()
                .push(job.clone());
        }
        let mut subscriptions_by_execution: HashMap<String, Vec<StoredEventSubscription>> =
            HashMap::new();
        for sub in &artifacts.subscriptions {
            subscriptions_by_execution
                .entry(sub.execution_id.clone())
                .or_default()
                .push(sub.clone());
        }
        Self {
            target,
            now,
            tasks_by_execution,
            jobs_by_execution,
            subscriptions_by_execution,
        }
    }

    /// Extend the plan with every artifact consequence of its moves, then
    /// re-point the instance's history rows.
    pub fn migrate(
        mut self,
        plan: &mut MigrationPlan,
        artifacts: &InstanceArtifacts,
    ) -> Result<(), MigrationError> {
        let moves = plan.moves.clone();
        for structural_move in &moves {
            self.cancel_owned_artifacts(plan, structural_move);
            match &structural_move.kind {
                MoveKind::Direct { execution_id } => {
                    self.migrate_direct(plan, structural_move, execution_id)?;
                }
                MoveKind::Rebuilt {
                    old_execution_id,
                    new_execution_id,
                } => {
                    self.migrate_rebuilt(plan, structural_move, old_execution_id, new_execution_id)?;
                }
            }
            self.populate_entered_scopes(plan, structural_move);
        }
        self.repoint_history(plan, artifacts);
        Ok(())
    }

    /// Artifacts of collapsed siblings and exited scopes are cancelled.
    fn cancel_owned_artifacts(&mut self, plan: &mut MigrationPlan, structural_move: &StructuralMove) {
        let removed = structural_move
            .cancelled_execution_ids
            .iter()
            .chain(structural_move.exited_scope_execution_ids.iter());
        for execution_id in removed {
            if let Some(task) = self.tasks_by_execution.remove(execution_id) {
                plan.changes.push(EntityChange::DeleteTask(task.task_id));
            }
            for job in self.jobs_by_execution.remove(execution_id).unwrap_or_default() {
                plan.changes.push(EntityChange::DeleteJob(job.job_id));
            }
            for sub in self
                .subscriptions_by_execution
                .remove(execution_id)
                .unwrap_or_default()
            {
                plan.changes
                    .push(EntityChange::DeleteSubscription(sub.subscription_id));
            }
        }
    }

    fn migrate_direct(
        &mut self,
        plan: &mut MigrationPlan,
        structural_move: &StructuralMove,
        execution_id: &str,
    ) -> Result<(), MigrationError> {
        let to = &structural_move.to_activity_id;
        let target_kind = self.target_kind(to)?;

        if let Some(task) = self.tasks_by_execution.remove(execution_id) {
            plan.changes.push(EntityChange::UpdateTask {
                task_id: task.task_id.clone(),
                changes: UpdateStoredTask {
                    process_definition_id: Some(self.target.id.clone()),
                    task_definition_key: Some(to.clone()),
                    assignee: structural_move.new_assignee.clone().map(Some),
                    expected_version: Some(task.version),
                    ..Default::default()
                },
            });
        }

        for job in self.jobs_by_execution.remove(execution_id).unwrap_or_default() {
            self.migrate_job_in_place(plan, &job, to, &target_kind);
        }

        for sub in self
            .subscriptions_by_execution
            .remove(execution_id)
            .unwrap_or_default()
        {
            self.migrate_subscription_in_place(plan, &sub, execution_id, to, &target_kind);
        }
        Ok(())
    }

    fn migrate_rebuilt(
        &mut self,
        plan: &mut MigrationPlan,
        structural_move: &StructuralMove,
        old_execution_id: &str,
        new_execution_id: &str,
    ) -> Result<(), MigrationError> {
        let to = &structural_move.to_activity_id;
        let target_kind = self.target_kind(to)?;
        // The rebuilt leaf was created within this plan; its pending create
        // carries the instance id.
        let process_instance_id = self.instance_id_from_plan(plan, new_execution_id);

        // A structural move re-creates the task; identity is not preserved.
        let carried_assignee = self
            .tasks_by_execution
            .remove(old_execution_id)
            .map(|task| {
                plan.changes
                    .push(EntityChange::DeleteTask(task.task_id.clone()));
                task.assignee
            })
            .unwrap_or(None);

        // An acquired job is never preempted, even across a structural move:
        // it follows the instance onto the rebuilt leaf with its lock, due
        // date and retries intact. Only unlocked jobs are rebuilt from the
        // target model.
        let mut carried_elements = Vec::new();
        for job in self
            .jobs_by_execution
            .remove(old_execution_id)
            .unwrap_or_default()
        {
            if job.lock_owner.is_some() {
                let element_id = self.repointed_element_id(&job, to, &target_kind);
                plan.changes.push(EntityChange::UpdateJob {
                    job_id: job.job_id.clone(),
                    changes: UpdateStoredJob {
                        execution_id: Some(new_execution_id.to_string()),
                        process_definition_id: Some(self.target.id.clone()),
                        element_id: Some(element_id.clone()),
                        expected_version: Some(job.version),
                        ..Default::default()
                    },
                });
                carried_elements.push(element_id);
            } else {
                plan.changes.push(EntityChange::DeleteJob(job.job_id));
            }
        }
        for sub in self
            .subscriptions_by_execution
            .remove(old_execution_id)
            .unwrap_or_default()
        {
            plan.changes
                .push(EntityChange::DeleteSubscription(sub.subscription_id));
        }

        let instance_id = process_instance_id.ok_or_else(|| {
            MigrationError::Transformation(format!(
                "no pending create for rebuilt execution '{}'",
                new_execution_id
            ))
        })?;

        if matches!(target_kind, ActivityKind::UserTask) {
            plan.changes.push(EntityChange::CreateTask(StoredTask {
                task_id: Uuid::new_v4().to_string(),
                execution_id: new_execution_id.to_string(),
                process_instance_id: instance_id.clone(),
                process_definition_id: self.target.id.clone(),
                task_definition_key: to.clone(),
                assignee: structural_move.new_assignee.clone().or(carried_assignee),
                create_time: self.now,
                version: 0,
            }));
        }

        self.create_leaf_artifacts(
            plan,
            new_execution_id,
            &instance_id,
            to,
            &target_kind,
            &carried_elements,
        );
        Ok(())
    }

    /// Jobs/subscriptions the target model attaches to a freshly placed
    /// leaf: boundary timers, async continuations, catch-event waits.
    /// Elements already served by a carried-over locked job are skipped.
    fn create_leaf_artifacts(
        &self,
        plan: &mut MigrationPlan,
        execution_id: &str,
        process_instance_id: &str,
        activity_id: &str,
        kind: &ActivityKind,
        carried_elements: &[String],
    ) {
        for boundary in self.target.boundary_events_on(activity_id) {
            if carried_elements.iter().any(|e| e == &boundary.activity_id) {
                continue;
            }
            if let ActivityKind::BoundaryEvent {
                trigger: EventTrigger::Timer { duration_secs },
                ..
            } = &boundary.kind
            {
                plan.changes.push(EntityChange::CreateJob(self.timer_job(
                    execution_id,
                    process_instance_id,
                    &boundary.activity_id,
                    *duration_secs,
                )));
            }
        }
        if carried_elements.iter().any(|e| e == activity_id) {
            return;
        }
        match kind {
            ActivityKind::ServiceTask { topic } => {
                plan.changes.push(EntityChange::CreateJob(StoredJob {
                    job_id: Uuid::new_v4().to_string(),
                    execution_id: execution_id.to_string(),
                    process_instance_id: process_instance_id.to_string(),
                    process_definition_id: self.target.id.clone(),
                    element_id: activity_id.to_string(),
                    job_type: "async".to_string(),
                    handler_config: Some(json!({ "topic": topic })),
                    due_at: None,
                    retries: 3,
                    lock_owner: None,
                    lock_expiry: None,
                    dead_letter: false,
                    version: 0,
                }));
            }
            ActivityKind::IntermediateCatchEvent { trigger } => match trigger {
                EventTrigger::Timer { duration_secs } => {
                    plan.changes.push(EntityChange::CreateJob(self.timer_job(
                        execution_id,
                        process_instance_id,
                        activity_id,
                        *duration_secs,
                    )));
                }
                EventTrigger::Signal { .. } | EventTrigger::Message { .. } => {
                    plan.changes
                        .push(EntityChange::CreateSubscription(self.subscription(
                            execution_id,
                            process_instance_id,
                            activity_id,
                            trigger,
                        )));
                }
            },
            _ => {}
        }
    }

    /// On a direct move existing jobs keep their identity where possible:
    /// an acquired (locked) job is never preempted, so only its definition
    /// pointers change; an unlocked timer is cancelled and re-created with
    /// a due date recomputed from the target model.
    fn migrate_job_in_place(
        &self,
        plan: &mut MigrationPlan,
        job: &StoredJob,
        to_activity_id: &str,
        target_kind: &ActivityKind,
    ) {
        if job.job_type == "timer" {
            let target_boundary = self
                .target
                .boundary_events_on(to_activity_id)
                .into_iter()
                .find(|b| {
                    matches!(
                        b.kind,
                        ActivityKind::BoundaryEvent {
                            trigger: EventTrigger::Timer { .. },
                            ..
                        }
                    )
                })
                .cloned();
            match target_boundary {
                Some(boundary) if job.lock_owner.is_some() => {
                    plan.changes.push(EntityChange::UpdateJob {
                        job_id: job.job_id.clone(),
                        changes: UpdateStoredJob {
                            process_definition_id: Some(self.target.id.clone()),
                            element_id: Some(boundary.activity_id),
                            expected_version: Some(job.version),
                            ..Default::default()
                        },
                    });
                }
                Some(boundary) => {
                    plan.changes.push(EntityChange::DeleteJob(job.job_id.clone()));
                    if let ActivityKind::BoundaryEvent {
                        trigger: EventTrigger::Timer { duration_secs },
                        ..
                    } = boundary.kind
                    {
                        plan.changes.push(EntityChange::CreateJob(self.timer_job(
                            &job.execution_id,
                            &job.process_instance_id,
                            &boundary.activity_id,
                            duration_secs,
                        )));
                    }
                }
                // No timer boundary on the target: an unlocked timer is
                // obsolete, an acquired one still may not be preempted and
                // only gets its definition pointer moved.
                None if job.lock_owner.is_some() => {
                    plan.changes.push(EntityChange::UpdateJob {
                        job_id: job.job_id.clone(),
                        changes: UpdateStoredJob {
                            process_definition_id: Some(self.target.id.clone()),
                            expected_version: Some(job.version),
                            ..Default::default()
                        },
                    });
                }
                None => {
                    plan.changes.push(EntityChange::DeleteJob(job.job_id.clone()));
                }
            }
            return;
        }

        match target_kind {
            ActivityKind::ServiceTask { topic } => {
                plan.changes.push(EntityChange::UpdateJob {
                    job_id: job.job_id.clone(),
                    changes: UpdateStoredJob {
                        process_definition_id: Some(self.target.id.clone()),
                        element_id: Some(to_activity_id.to_string()),
                        handler_config: Some(Some(json!({ "topic": topic }))),
                        expected_version: Some(job.version),
                        ..Default::default()
                    },
                });
            }
            _ if job.lock_owner.is_some() => {
                plan.changes.push(EntityChange::UpdateJob {
                    job_id: job.job_id.clone(),
                    changes: UpdateStoredJob {
                        process_definition_id: Some(self.target.id.clone()),
                        expected_version: Some(job.version),
                        ..Default::default()
                    },
                });
            }
            _ => {
                plan.changes.push(EntityChange::DeleteJob(job.job_id.clone()));
            }
        }
    }

    /// Element a carried-over locked job points at after the move: a timer
    /// follows the target's timer boundary when there is one, an async job
    /// follows a service-task target; otherwise the old element id stays.
    fn repointed_element_id(
        &self,
        job: &StoredJob,
        to_activity_id: &str,
        target_kind: &ActivityKind,
    ) -> String {
        if job.job_type == "timer" {
            return self
                .target
                .boundary_events_on(to_activity_id)
                .into_iter()
                .find(|b| {
                    matches!(
                        b.kind,
                        ActivityKind::BoundaryEvent {
                            trigger: EventTrigger::Timer { .. },
                            ..
                        }
                    )
                })
                .map(|b| b.activity_id.clone())
                .unwrap_or_else(|| job.element_id.clone());
        }
        if matches!(target_kind, ActivityKind::ServiceTask { .. }) {
            to_activity_id.to_string()
        } else {
            job.element_id.clone()
        }
    }

    /// A subscription survives a direct move only when trigger type and
    /// name are unchanged; any trigger change is cancel-old/create-new.
    fn migrate_subscription_in_place(
        &self,
        plan: &mut MigrationPlan,
        sub: &StoredEventSubscription,
        execution_id: &str,
        to_activity_id: &str,
        target_kind: &ActivityKind,
    ) {
        let trigger = match target_kind {
            ActivityKind::IntermediateCatchEvent { trigger } => trigger.clone(),
            _ => {
                plan.changes
                    .push(EntityChange::DeleteSubscription(sub.subscription_id.clone()));
                return;
            }
        };
        match &trigger {
            EventTrigger::Timer { duration_secs } => {
                // The catch construct became a timer: the subscription goes
                // away and a timer job takes over.
                plan.changes
                    .push(EntityChange::DeleteSubscription(sub.subscription_id.clone()));
                plan.changes.push(EntityChange::CreateJob(self.timer_job(
                    execution_id,
                    &sub.process_instance_id,
                    to_activity_id,
                    *duration_secs,
                )));
            }
            EventTrigger::Signal { name } | EventTrigger::Message { name } => {
                if sub.event_type == trigger.event_type() && sub.event_name == *name {
                    plan.changes.push(EntityChange::UpdateSubscription {
                        subscription_id: sub.subscription_id.clone(),
                        changes: UpdateStoredEventSubscription {
                            process_definition_id: Some(self.target.id.clone()),
                            activity_id: Some(to_activity_id.to_string()),
                            expected_version: Some(sub.version),
                            ..Default::default()
                        },
                    });
                } else {
                    plan.changes
                        .push(EntityChange::DeleteSubscription(sub.subscription_id.clone()));
                    plan.changes
                        .push(EntityChange::CreateSubscription(self.subscription(
                            execution_id,
                            &sub.process_instance_id,
                            to_activity_id,
                            &trigger,
                        )));
                }
            }
        }
    }

    /// Scopes newly entered wake up their event machinery: subscriptions
    /// for signal/message event-sub-process starts, timer jobs for timer
    /// starts and boundary timers on the scope itself.
    fn populate_entered_scopes(&self, plan: &mut MigrationPlan, structural_move: &StructuralMove) {
        for entered in &structural_move.entered_scopes {
            let Some(instance_id) = self.instance_id_from_plan(plan, &entered.execution_id) else {
                continue;
            };
            for start in self.target.event_subprocess_starts_in(&entered.activity_id) {
                match &start.kind {
                    ActivityKind::StartEvent {
                        trigger: Some(EventTrigger::Timer { duration_secs }),
                    } => {
                        plan.changes.push(EntityChange::CreateJob(self.timer_job(
                            &entered.execution_id,
                            &instance_id,
                            &start.activity_id,
                            *duration_secs,
                        )));
                    }
                    ActivityKind::StartEvent {
                        trigger: Some(trigger),
                    } => {
                        plan.changes
                            .push(EntityChange::CreateSubscription(self.subscription(
                                &entered.execution_id,
                                &instance_id,
                                &start.activity_id,
                                trigger,
                            )));
                    }
                    _ => {}
                }
            }
            for boundary in self.target.boundary_events_on(&entered.activity_id) {
                if let ActivityKind::BoundaryEvent {
                    trigger: EventTrigger::Timer { duration_secs },
                    ..
                } = &boundary.kind
                {
                    plan.changes.push(EntityChange::CreateJob(self.timer_job(
                        &entered.execution_id,
                        &instance_id,
                        &boundary.activity_id,
                        *duration_secs,
                    )));
                }
            }
        }
    }

    /// Historic rows are never duplicated; their definition pointer moves
    /// to the target. Rows for activities absent from the target keep
    /// their original activity ids.
    fn repoint_history(&self, plan: &mut MigrationPlan, artifacts: &InstanceArtifacts) {
        if let Some(instance) = &artifacts.historic_instance {
            if instance.process_definition_id != self.target.id {
                plan.changes.push(EntityChange::UpdateHistoricProcessInstance {
                    process_instance_id: instance.process_instance_id.clone(),
                    changes: UpdateStoredHistoricProcessInstance {
                        process_definition_id: Some(self.target.id.clone()),
                        expected_version: Some(instance.version),
                        ..Default::default()
                    },
                });
            }
        }
        for activity in &artifacts.historic_activities {
            if activity.process_definition_id != self.target.id {
                plan.changes.push(EntityChange::UpdateHistoricActivity {
                    id: activity.id.clone(),
                    changes: UpdateStoredHistoricActivity {
                        process_definition_id: Some(self.target.id.clone()),
                        expected_version: Some(activity.version),
                        ..Default::default()
                    },
                });
            }
        }
        for task in &artifacts.historic_tasks {
            if task.process_definition_id != self.target.id {
                plan.changes.push(EntityChange::UpdateHistoricTask {
                    id: task.id.clone(),
                    changes: UpdateStoredHistoricTask {
                        process_definition_id: Some(self.target.id.clone()),
                        expected_version: Some(task.version),
                        ..Default::default()
                    },
                });
            }
        }
    }

    fn target_kind(&self, activity_id: &str) -> Result<ActivityKind, MigrationError> {
        self.target
            .activity(activity_id)
            .map(|n| n.kind.clone())
            .ok_or_else(|| {
                MigrationError::Transformation(format!(
                    "target activity '{}' missing from target definition",
                    activity_id
                ))
            })
    }

    fn timer_job(
        &self,
        execution_id: &str,
        process_instance_id: &str,
        element_id: &str,
        duration_secs: i64,
    ) -> StoredJob {
        StoredJob {
            job_id: Uuid::new_v4().to_string(),
            execution_id: execution_id.to_string(),
            process_instance_id: process_instance_id.to_string(),
            process_definition_id: self.target.id.clone(),
            element_id: element_id.to_string(),
            job_type: "timer".to_string(),
            handler_config: None,
            due_at: Some(self.now + Duration::seconds(duration_secs)),
            retries: 3,
            lock_owner: None,
            lock_expiry: None,
            dead_letter: false,
            version: 0,
        }
    }

    fn subscription(
        &self,
        execution_id: &str,
        process_instance_id: &str,
        activity_id: &str,
        trigger: &EventTrigger,
    ) -> StoredEventSubscription {
        StoredEventSubscription {
            subscription_id: Uuid::new_v4().to_string(),
            execution_id: execution_id.to_string(),
            process_instance_id: process_instance_id.to_string(),
            process_definition_id: self.target.id.clone(),
            activity_id: activity_id.to_string(),
            event_type: trigger.event_type().to_string(),
            event_name: trigger.event_name().unwrap_or_default().to_string(),
            version: 0,
        }
    }

    fn instance_id_from_plan(&self, plan: &MigrationPlan, execution_id: &str) -> Option<String> {
        plan.changes.changes.iter().find_map(|change| match change {
            EntityChange::CreateExecution(e) if e.execution_id == execution_id => {
                Some(e.process_instance_id.clone())
            }
            _ => None,
        })
    }
}
