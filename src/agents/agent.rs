//! The agent record: a role, a goal and a backstory bound to LLM settings.

use serde::Serialize;

use super::types::AgentId;
use crate::llm::LlmSettings;

/// Default cap on LLM round-trips per task.
pub const DEFAULT_MAX_ITER: usize = 20;

#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    role: String,
    goal: String,
    backstory: String,
    llm: LlmSettings,
    /// Names of registry tools this agent may call
    tools: Vec<String>,
    verbose: bool,
    max_iter: usize,
}

impl Agent {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
        llm: LlmSettings,
    ) -> Self {
        Self {
            id: AgentId::new(),
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            llm,
            tools: Vec::new(),
            verbose: false,
            max_iter: DEFAULT_MAX_ITER,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Allow the agent to call the named tool. Duplicates are ignored.
    pub fn with_tool(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.tools.contains(&name) {
            self.tools.push(name);
        }
        self
    }

    /// At least one iteration is always allowed.
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn llm(&self) -> &LlmSettings {
        &self.llm
    }

    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    pub fn can_use(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iter
    }

    pub fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        );
        if !self.tools.is_empty() {
            prompt.push_str(
                "\n\nYou can call the tools you have been given whenever they help. \
                 Once you have what you need, reply with your final answer only.",
            );
        }
        prompt
    }

    /// Serializable view for logs and summaries.
    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            id: self.id.to_string(),
            role: self.role.clone(),
            model: self.llm.model.to_string(),
            tools: self.tools.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentSummary {
    pub id: String,
    pub role: String,
    pub model: String,
    pub tools: Vec<String>,
}
