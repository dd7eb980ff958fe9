use serde::{Deserialize, Serialize};

/// What makes an event-based construct fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventTrigger {
    Timer { duration_secs: i64 },
    Signal { name: String },
    Message { name: String },
}

impl EventTrigger {
    /// Event name for subscription records; timers have none.
    pub fn event_name(&self) -> Option<&str> {
        match self {
            EventTrigger::Timer { .. } => None,
            EventTrigger::Signal { name } | EventTrigger::Message { name } => Some(name),
        }
    }

    /// Subscription `event_type` string as persisted.
    pub fn event_type(&self) -> &'static str {
        match self {
            EventTrigger::Timer { .. } => "timer-start",
            EventTrigger::Signal { .. } => "signal",
            EventTrigger::Message { .. } => "message",
        }
    }
}

/// Closed set of activity-node kinds the migration engine dispatches over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActivityKind {
    UserTask,
    /// External-worker task; `topic` feeds the async job's handler config.
    ServiceTask { topic: String },
    ParallelGateway,
    SubProcess,
    EventSubProcess { interrupting: bool },
    /// `trigger` is `Some` for event-sub-process starts, `None` for the
    /// plain process start event.
    StartEvent { trigger: Option<EventTrigger> },
    IntermediateCatchEvent { trigger: EventTrigger },
    BoundaryEvent {
        attached_to: String,
        trigger: EventTrigger,
        cancel_activity: bool,
    },
}

impl ActivityKind {
    pub fn is_scope(&self) -> bool {
        matches!(
            self,
            ActivityKind::SubProcess | ActivityKind::EventSubProcess { .. }
        )
    }

    pub fn is_event_scope(&self) -> bool {
        matches!(self, ActivityKind::EventSubProcess { .. })
    }

    /// Whether an active leaf execution may sit at this node, i.e. whether
    /// it is a legal migration target.
    pub fn is_wait_position(&self) -> bool {
        matches!(
            self,
            ActivityKind::UserTask
                | ActivityKind::ServiceTask { .. }
                | ActivityKind::IntermediateCatchEvent { .. }
        )
    }
}

/// One node of the parsed activity graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityNode {
    pub activity_id: String,

    /// Enclosing scope activity id; `None` for top-level activities.
    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub multi_instance: bool,

    pub kind: ActivityKind,
}

impl ActivityNode {
    pub fn new(activity_id: impl Into<String>, kind: ActivityKind) -> Self {
        Self {
            activity_id: activity_id.into(),
            parent_id: None,
            multi_instance: false,
            kind,
        }
    }

    pub fn in_scope(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn multi_instance(mut self) -> Self {
        self.multi_instance = true;
        self
    }
}
