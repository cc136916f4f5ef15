//! Scripted LLM client for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatMessage, ChatResponse, FunctionCall, LlmClient, LlmSettings, TokenUsage, ToolCall, ToolDefinition};

/// One recorded call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tool_names: Vec<String>,
}

/// Replies with queued responses in order and records every request.
/// An exhausted queue is an error.
#[derive(Default)]
pub struct MockLlm {
    replies: Mutex<VecDeque<anyhow::Result<ChatResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(ChatResponse {
            content: Some(text.to_string()),
            usage: Some(TokenUsage::new(10, 5)),
            finish_reason: Some("stop".to_string()),
            ..Default::default()
        }))
    }

    pub fn tool_call(self, id: &str, name: &str, arguments: &str) -> Self {
        self.push(Ok(ChatResponse {
            tool_calls: Some(vec![ToolCall {
                id: id.to_string(),
                call_type: "function".to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            }]),
            usage: Some(TokenUsage::new(8, 2)),
            finish_reason: Some("tool_calls".to_string()),
            ..Default::default()
        }))
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Err(anyhow::anyhow!(message.to_string())))
    }

    fn push(self, reply: anyhow::Result<ChatResponse>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn chat_completion(
        &self,
        settings: &LlmSettings,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> anyhow::Result<ChatResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: settings.model.to_string(),
            messages: messages.to_vec(),
            tool_names: tools
                .unwrap_or_default()
                .iter()
                .map(|t| t.function.name.clone())
                .collect(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("mock has no reply queued")))
    }
}
