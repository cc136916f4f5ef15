//! Task results and token accounting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::TokenUsage;

/// Aggregate token usage across LLM calls.
///
/// # Invariants
/// - `total_tokens == prompt_tokens + completion_tokens`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsageSummary {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    /// Number of completion requests that reported usage
    pub successful_requests: u64,
}

impl TokenUsageSummary {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
            successful_requests: 0,
        }
    }

    /// Component-wise sum.
    pub fn add(&self, other: &TokenUsageSummary) -> TokenUsageSummary {
        let mut sum = TokenUsageSummary::new(
            self.prompt_tokens.saturating_add(other.prompt_tokens),
            self.completion_tokens
                .saturating_add(other.completion_tokens),
        );
        sum.successful_requests = self
            .successful_requests
            .saturating_add(other.successful_requests);
        sum
    }

    /// Fold in the usage of one completion.
    pub fn record(&mut self, usage: &TokenUsage) {
        let mut one = TokenUsageSummary::new(usage.prompt_tokens, usage.completion_tokens);
        one.successful_requests = 1;
        *self = self.add(&one);
    }
}

/// Output of one completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub description: String,
    pub expected_output: String,
    /// Final answer text
    pub raw: String,
    /// Role of the agent that produced it
    pub agent: String,
    pub usage: TokenUsageSummary,
    pub completed_at: DateTime<Utc>,
}

impl TaskOutput {
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        raw: impl Into<String>,
        agent: impl Into<String>,
        usage: TokenUsageSummary,
    ) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            raw: raw.into(),
            agent: agent.into(),
            usage,
            completed_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for TaskOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
