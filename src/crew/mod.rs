//! Crew - an ordered set of agents and tasks executed one after another.
//!
//! # Invariants
//! - A crew has at least one agent and at least one task
//! - Every task references exactly one agent of the same crew
//!
//! # Execution
//! Tasks run strictly in the order supplied. Each task sees the raw outputs of
//! all earlier tasks as context. The first failure aborts the run; there is no
//! partial recovery.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::agents::{Agent, AgentError, AgentExecutor};
use crate::llm::LlmClient;
use crate::task::{Task, TaskError, TaskOutput, TokenUsageSummary};
use crate::tools::ToolRegistry;

/// Separator between earlier task outputs in a task's context.
pub const CONTEXT_SEPARATOR: &str = "\n\n----------\n\n";

/// How tasks are scheduled. Only sequential execution exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    #[default]
    Sequential,
}

#[derive(Debug, Error)]
pub enum CrewError {
    #[error("A crew needs at least one agent and one task")]
    EmptyCrew,

    #[error("Task '{task}' is assigned to an agent that is not part of the crew")]
    UnknownAgent { task: String },

    #[error("Task '{task}' failed for agent {agent}")]
    TaskFailed {
        task: String,
        agent: String,
        #[source]
        source: AgentError,
    },

    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Result of a full crew run.
#[derive(Debug, Clone, Serialize)]
pub struct CrewOutput {
    /// Raw output of the last task
    pub raw: String,
    /// One entry per task, in execution order
    pub tasks_output: Vec<TaskOutput>,
    pub token_usage: TokenUsageSummary,
}

impl std::fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

pub struct Crew {
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    process: Process,
    verbose: bool,
}

impl Crew {
    /// # Errors
    /// `EmptyCrew` without agents or tasks, `UnknownAgent` if a task is bound
    /// to an agent outside `agents`.
    pub fn new(agents: Vec<Agent>, tasks: Vec<Task>) -> Result<Self, CrewError> {
        if agents.is_empty() || tasks.is_empty() {
            return Err(CrewError::EmptyCrew);
        }
        if let Some(orphan) = tasks
            .iter()
            .find(|t| !agents.iter().any(|a| a.id() == t.agent()))
        {
            return Err(CrewError::UnknownAgent {
                task: orphan.description().to_string(),
            });
        }

        Ok(Self {
            agents,
            tasks,
            process: Process::Sequential,
            verbose: false,
        })
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn process(&self) -> Process {
        self.process
    }

    /// Run every task in order and return the last task's output as the result.
    pub async fn kickoff(
        &mut self,
        llm: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
    ) -> Result<CrewOutput, CrewError> {
        let executor = AgentExecutor::new(llm, tools);
        let verbose = self.verbose;
        let Crew { agents, tasks, .. } = self;

        if verbose {
            let roster: Vec<_> = agents.iter().map(Agent::summary).collect();
            tracing::info!(
                agents = %serde_json::to_string(&roster).unwrap_or_default(),
                tasks = tasks.len(),
                "Crew kickoff"
            );
        }

        let total = tasks.len();
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(total);
        for (index, task) in tasks.iter_mut().enumerate() {
            task.reset();
            let agent = agents
                .iter()
                .find(|a| a.id() == task.agent())
                .ok_or_else(|| CrewError::UnknownAgent {
                    task: task.description().to_string(),
                })?;

            let context = (!outputs.is_empty()).then(|| {
                outputs
                    .iter()
                    .map(|o| o.raw.as_str())
                    .collect::<Vec<_>>()
                    .join(CONTEXT_SEPARATOR)
            });

            if verbose {
                tracing::info!(
                    task = index + 1,
                    of = total,
                    agent = agent.role(),
                    "Starting task"
                );
            }

            task.start()?;
            match executor.execute_task(agent, task, context.as_deref()).await {
                Ok(output) => {
                    task.complete(output.clone())?;
                    if verbose {
                        tracing::info!(task = index + 1, agent = agent.role(), "Task completed");
                    }
                    outputs.push(output);
                }
                Err(source) => {
                    task.fail(source.to_string())?;
                    return Err(CrewError::TaskFailed {
                        task: task.description().to_string(),
                        agent: agent.role().to_string(),
                        source,
                    });
                }
            }
        }

        let token_usage = outputs
            .iter()
            .fold(TokenUsageSummary::default(), |acc, o| acc.add(&o.usage));
        let raw = outputs.last().map(|o| o.raw.clone()).unwrap_or_default();

        Ok(CrewOutput {
            raw,
            tasks_output: outputs,
            token_usage,
        })
    }
}
