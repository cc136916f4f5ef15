//! Core Task type: a description/expected-output pair bound to one agent.
//!
//! # Invariants
//! - `description` and `expected_output` are non-empty
//! - `output.is_some()` iff `status == Completed`

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::output::TaskOutput;
use crate::agents::{Agent, AgentId};

/// Unique identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a task in its lifecycle.
///
/// ```text
/// Pending -> Running -> Completed
///                   \-> Failed
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed { reason: String },
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    description: String,
    expected_output: String,
    /// Agent this task is assigned to
    agent: AgentId,
    status: TaskStatus,
    output: Option<TaskOutput>,
}

impl Task {
    /// Create a pending task assigned to `agent`.
    ///
    /// # Errors
    /// Returns `Err` if the description or expected output is blank.
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: &Agent,
    ) -> Result<Self, TaskError> {
        let description = description.into();
        let expected_output = expected_output.into();
        if description.trim().is_empty() {
            return Err(TaskError::EmptyDescription);
        }
        if expected_output.trim().is_empty() {
            return Err(TaskError::EmptyExpectedOutput);
        }

        Ok(Self {
            id: TaskId::new(),
            description,
            expected_output,
            agent: agent.id(),
            status: TaskStatus::Pending,
            output: None,
        })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn status(&self) -> &TaskStatus {
        &self.status
    }

    pub fn output(&self) -> Option<&TaskOutput> {
        self.output.as_ref()
    }

    /// Pending -> Running.
    pub fn start(&mut self) -> Result<(), TaskError> {
        match &self.status {
            TaskStatus::Pending => {
                self.status = TaskStatus::Running;
                Ok(())
            }
            other => Err(TaskError::InvalidTransition {
                from: format!("{:?}", other),
                to: "Running".to_string(),
            }),
        }
    }

    /// Running -> Completed, recording the output.
    pub fn complete(&mut self, output: TaskOutput) -> Result<(), TaskError> {
        match &self.status {
            TaskStatus::Running => {
                self.status = TaskStatus::Completed;
                self.output = Some(output);
                Ok(())
            }
            other => Err(TaskError::InvalidTransition {
                from: format!("{:?}", other),
                to: "Completed".to_string(),
            }),
        }
    }

    /// Running -> Failed.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), TaskError> {
        match &self.status {
            TaskStatus::Running => {
                self.status = TaskStatus::Failed {
                    reason: reason.into(),
                };
                Ok(())
            }
            other => Err(TaskError::InvalidTransition {
                from: format!("{:?}", other),
                to: "Failed".to_string(),
            }),
        }
    }

    /// Back to Pending with no output, so a crew can be kicked off again.
    pub fn reset(&mut self) {
        self.status = TaskStatus::Pending;
        self.output = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("Task description cannot be empty")]
    EmptyDescription,

    #[error("Task expected output cannot be empty")]
    EmptyExpectedOutput,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}
