//! LLM client module.
//!
//! A trait-based abstraction over chat-completion providers, with an
//! OpenAI-compatible HTTP client as the implementation. The sampling
//! parameters travel with every request in [`LlmSettings`].

mod error;
#[cfg(test)]
pub mod mock;
mod openai;

pub use error::{classify_http_status, LlmError, LlmErrorKind, RetryConfig};
pub use openai::{OpenAiClient, DEFAULT_OPENAI_BASE_URL};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role in a chat conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Assistant turn that requested tool calls; must precede the tool results.
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Arguments as a JSON string. May be empty for no-argument functions.
    #[serde(default)]
    pub arguments: String,
}

/// Tool definition offered to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Response from a chat completion.
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
    pub model: Option<String>,
}

impl ChatResponse {
    /// Tool calls, if the model asked for any.
    pub fn requested_tools(&self) -> Option<&[ToolCall]> {
        self.tool_calls
            .as_deref()
            .filter(|calls| !calls.is_empty())
    }
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelRefError {
    #[error("model reference is empty")]
    Empty,
    #[error("model reference '{0}' must look like provider/model_name")]
    Malformed(String),
}

/// A `provider/model_name` reference such as `openai/gpt-4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    pub provider: String,
    pub name: String,
}

impl ModelRef {
    /// Split at the first `/`. A bare name is taken to be an OpenAI model.
    pub fn parse(s: &str) -> Result<Self, ModelRefError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ModelRefError::Empty);
        }
        match s.split_once('/') {
            Some((provider, name)) if !provider.is_empty() && !name.is_empty() => Ok(Self {
                provider: provider.to_lowercase(),
                name: name.to_string(),
            }),
            Some(_) => Err(ModelRefError::Malformed(s.to_string())),
            None => Ok(Self {
                provider: "openai".to_string(),
                name: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.name)
    }
}

/// Fixed invocation parameters sent with every completion.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub model: ModelRef,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u64>,
    pub top_p: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
    pub stop: Vec<String>,
    pub seed: Option<u64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: ModelRef {
                provider: "openai".to_string(),
                name: "gpt-4".to_string(),
            },
            temperature: Some(0.8),
            max_tokens: Some(150),
            top_p: Some(0.9),
            frequency_penalty: Some(0.1),
            presence_penalty: Some(0.1),
            stop: vec!["END".to_string()],
            seed: Some(42),
        }
    }
}

impl LlmSettings {
    pub fn with_model(mut self, model: ModelRef) -> Self {
        self.model = model;
        self
    }
}

/// Trait for LLM clients.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one chat-completion request.
    ///
    /// `tools` is `None` when the caller offers no tools; the request then
    /// carries no `tools` or `tool_choice` fields.
    async fn chat_completion(
        &self,
        settings: &LlmSettings,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> anyhow::Result<ChatResponse>;
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),
}

/// Pick the client wrapper for the settings' provider.
pub fn build_client(
    settings: &LlmSettings,
    api_key: &str,
    base_url: Option<String>,
) -> Result<Arc<dyn LlmClient>, ProviderError> {
    match settings.model.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiClient::new(api_key.to_string(), base_url))),
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}
