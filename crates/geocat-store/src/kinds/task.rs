//! Task runs, keyed by a caller-supplied identifier

use super::opt_key;
use crate::codec::RecordCodec;
use crate::entity::EntityStore;
use crate::index::{IndexKey, IndexSpec};
use crate::record::Record;
use chrono::{DateTime, Utc};
use geocat_common::{Kind, TaskId, TaskParameterId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a task run
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Running,
    Paused,
    Succeed,
    Warning,
    Failed,
    Cancelled,
}

impl TaskState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Succeed => "SUCCEED",
            Self::Warning => "WARNING",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether the run can no longer change state
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Succeed | Self::Warning | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub identifier: TaskId,
    pub state: TaskState,
    pub parameter: Option<TaskParameterId>,
    pub owner: Option<UserId>,
    pub message: Option<String>,
    /// Completion in percent
    pub progress: f64,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub task_output: Option<String>,
}

impl Task {
    pub const BY_STATE: &'static str = "state";
    pub const BY_PARAMETER: &'static str = "parameter";
    pub const BY_OWNER: &'static str = "owner";

    pub fn new(identifier: TaskId) -> Self {
        Self {
            identifier,
            state: TaskState::Pending,
            parameter: None,
            owner: None,
            message: None,
            progress: 0.0,
            start: Utc::now(),
            end: None,
            task_output: None,
        }
    }

    /// Move to `state`, stamping the end time on finished states
    pub fn transition(&mut self, state: TaskState) {
        self.state = state;
        if state.is_finished() && self.end.is_none() {
            self.end = Some(Utc::now());
        }
    }
}

impl Record for Task {
    type Key = TaskId;
    const KIND: Kind = Kind::Tasks;

    fn key(&self) -> TaskId {
        self.identifier.clone()
    }

    fn set_key(&mut self, key: TaskId) {
        self.identifier = key;
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::multi(Self::BY_STATE, |t: &Self| vec![IndexKey::from(t.state.as_str())]),
            IndexSpec::multi(Self::BY_PARAMETER, |t: &Self| opt_key(t.parameter.as_ref())),
            IndexSpec::multi(Self::BY_OWNER, |t: &Self| opt_key(t.owner.as_ref())),
        ]
    }
}

impl<C: RecordCodec> EntityStore<Task, C> {
    pub fn find_by_state(&self, state: TaskState) -> Vec<Task> {
        self.find_many(Task::BY_STATE, &state.as_str().into())
    }

    /// Runs of one task parameter, ordered by identifier
    pub fn find_by_parameter(&self, parameter: TaskParameterId) -> Vec<Task> {
        self.find_many(Task::BY_PARAMETER, &IndexKey::of(&parameter))
    }

    pub fn find_by_owner(&self, owner: UserId) -> Vec<Task> {
        self.find_many(Task::BY_OWNER, &IndexKey::of(&owner))
    }

    /// Runs not yet finished
    pub fn find_active(&self) -> Vec<Task> {
        self.filter(|t| !t.state.is_finished())
    }
}
