//! Agent executor - the loop that turns one task into one final answer.

use std::sync::Arc;

use crate::agents::{Agent, AgentError};
use crate::llm::{ChatMessage, LlmClient, ToolCall};
use crate::task::{Task, TaskOutput, TokenUsageSummary};
use crate::tools::ToolRegistry;

/// Runs a single agent against a single task.
///
/// # Algorithm
/// 1. Build the system prompt from the agent and the user prompt from the task
/// 2. Call the LLM, offering only the agent's own tools
/// 3. If the LLM requests tool calls: execute them, feed the results back
/// 4. Repeat until the LLM answers without tool calls or `max_iter` is reached
pub struct AgentExecutor {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
}

impl AgentExecutor {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>) -> Self {
        Self { llm, tools }
    }

    /// The user prompt for `task`, with earlier task outputs as context.
    pub fn build_task_prompt(task: &Task, context: Option<&str>) -> String {
        let mut prompt = format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
             Return the actual complete content as the final answer, not a summary of it.",
            task.description(),
            task.expected_output()
        );
        if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            prompt.push_str(context);
        }
        prompt.push_str("\n\nBegin.");
        prompt
    }

    async fn execute_tool_call(&self, agent: &Agent, tool_call: &ToolCall) -> String {
        let name = tool_call.function.name.as_str();
        if !agent.can_use(name) {
            return format!("Error: tool '{}' is not available to {}", name, agent.role());
        }

        let args = if tool_call.function.arguments.trim().is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            match serde_json::from_str(&tool_call.function.arguments) {
                Ok(args) => args,
                Err(e) => return format!("Error: invalid arguments for {}: {}", name, e),
            }
        };

        match self.tools.execute(name, args).await {
            Ok(output) => output,
            Err(e) => format!("Error: {}", e),
        }
    }

    pub async fn execute_task(
        &self,
        agent: &Agent,
        task: &Task,
        context: Option<&str>,
    ) -> Result<TaskOutput, AgentError> {
        let mut usage = TokenUsageSummary::default();
        let mut messages = vec![
            ChatMessage::system(agent.system_prompt()),
            ChatMessage::user(Self::build_task_prompt(task, context)),
        ];

        let schemas = self.tools.schemas_for(agent.tools());
        let offered = if schemas.is_empty() {
            None
        } else {
            Some(schemas.as_slice())
        };

        if agent.is_verbose() {
            tracing::info!(agent = agent.role(), task = %task.id(), "Working on: {}", task.description());
        }

        for iteration in 0..agent.max_iterations() {
            tracing::debug!(agent = agent.role(), iteration = iteration + 1, "Agent iteration");

            let response = self
                .llm
                .chat_completion(agent.llm(), &messages, offered)
                .await
                .map_err(|e| AgentError::LlmError(format!("{:#}", e)))?;

            if let Some(u) = &response.usage {
                usage.record(u);
            }

            if let Some(tool_calls) = response.requested_tools() {
                let tool_calls = tool_calls.to_vec();
                messages.push(ChatMessage::assistant_tool_calls(
                    response.content.clone(),
                    tool_calls.clone(),
                ));

                for tool_call in &tool_calls {
                    if agent.is_verbose() {
                        tracing::info!(
                            agent = agent.role(),
                            tool = %tool_call.function.name,
                            "Using tool with input: {}",
                            tool_call.function.arguments
                        );
                    }
                    let result = self.execute_tool_call(agent, tool_call).await;
                    messages.push(ChatMessage::tool_result(tool_call.id.clone(), result));
                }
                continue;
            }

            let answer = response
                .content
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .ok_or_else(|| AgentError::EmptyResponse(agent.role().to_string()))?;

            if agent.is_verbose() {
                tracing::info!(agent = agent.role(), "Final answer:\n{}", answer);
            }

            return Ok(TaskOutput::new(
                task.description(),
                task.expected_output(),
                answer,
                agent.role(),
                usage,
            ));
        }

        Err(AgentError::MaxIterations(agent.max_iterations()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockLlm;
    use crate::llm::{LlmSettings, Role};
    use crate::tools::Tool;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Lookup;

    #[async_trait]
    impl Tool for Lookup {
        fn name(&self) -> &str {
            "lookup"
        }

        fn description(&self) -> &str {
            "Look a term up"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {"term": {"type": "string"}}, "required": ["term"]})
        }

        async fn execute(&self, args: Value) -> anyhow::Result<String> {
            let term = args["term"]
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("Missing 'term' argument"))?;
            Ok(format!("definition of {}", term))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::empty();
        registry.register(Arc::new(Lookup));
        Arc::new(registry)
    }

    fn researcher() -> Agent {
        Agent::new("Researcher", "Find facts", "Thorough", LlmSettings::default())
    }

    fn task(agent: &Agent) -> Task {
        Task::new("Research LLMs", "A summary", agent).unwrap()
    }

    #[test]
    fn task_prompt_includes_context_only_when_present() {
        let agent = researcher();
        let task = task(&agent);

        let bare = AgentExecutor::build_task_prompt(&task, None);
        assert!(bare.starts_with("Current Task: Research LLMs"));
        assert!(bare.contains("expected criteria for your final answer: A summary"));
        assert!(!bare.contains("context"));

        let with_ctx = AgentExecutor::build_task_prompt(&task, Some("earlier findings"));
        assert!(with_ctx.contains("This is the context you're working with:\nearlier findings"));
        assert_eq!(AgentExecutor::build_task_prompt(&task, Some("  ")), bare);
    }

    #[tokio::test]
    async fn plain_answer_completes_task() {
        let llm = Arc::new(MockLlm::new().reply("  LLMs are large.  "));
        let executor = AgentExecutor::new(llm.clone(), registry());
        let agent = researcher();

        let output = executor.execute_task(&agent, &task(&agent), None).await.unwrap();
        assert_eq!(output.raw, "LLMs are large.");
        assert_eq!(output.agent, "Researcher");
        assert_eq!(output.usage.total_tokens, 15);

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "openai/gpt-4");
        assert_eq!(calls[0].messages[0].role, Role::System);
        assert!(calls[0].tool_names.is_empty(), "agent without tools must not be offered any");
    }

    #[tokio::test]
    async fn tool_calls_are_dispatched_and_fed_back() {
        let llm = Arc::new(
            MockLlm::new()
                .tool_call("call_1", "lookup", r#"{"term":"transformer"}"#)
                .reply("Transformers use attention."),
        );
        let executor = AgentExecutor::new(llm.clone(), registry());
        let agent = researcher().with_tool("lookup");

        let output = executor.execute_task(&agent, &task(&agent), None).await.unwrap();
        assert_eq!(output.raw, "Transformers use attention.");
        assert_eq!(output.usage.successful_requests, 2);

        let calls = llm.calls();
        assert_eq!(calls[0].tool_names, vec!["lookup".to_string()]);
        let second = &calls[1].messages;
        assert_eq!(second.len(), 4);
        assert_eq!(second[2].role, Role::Assistant);
        assert_eq!(second[3].role, Role::Tool);
        assert_eq!(second[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(second[3].content.as_deref(), Some("definition of transformer"));
    }

    #[tokio::test]
    async fn tool_failures_become_error_messages() {
        let llm = Arc::new(
            MockLlm::new()
                .tool_call("call_1", "lookup", "{}")
                .tool_call("call_2", "lookup", "not json")
                .tool_call("call_3", "other", "{}")
                .reply("done"),
        );
        let executor = AgentExecutor::new(llm.clone(), registry());
        let agent = researcher().with_tool("lookup");

        executor.execute_task(&agent, &task(&agent), None).await.unwrap();

        let last = llm.calls().pop().unwrap().messages;
        let tool_outputs: Vec<&str> = last
            .iter()
            .filter(|m| m.role == Role::Tool)
            .filter_map(|m| m.content.as_deref())
            .collect();
        assert_eq!(tool_outputs[0], "Error: Missing 'term' argument");
        assert!(tool_outputs[1].starts_with("Error: invalid arguments for lookup"));
        assert_eq!(tool_outputs[2], "Error: tool 'other' is not available to Researcher");
    }

    #[tokio::test]
    async fn llm_failure_is_reported() {
        let llm = Arc::new(MockLlm::new().fail("Client error (HTTP 401): bad key"));
        let executor = AgentExecutor::new(llm, registry());
        let agent = researcher();

        let err = executor.execute_task(&agent, &task(&agent), None).await.unwrap_err();
        assert_eq!(
            err,
            AgentError::LlmError("Client error (HTTP 401): bad key".to_string())
        );
    }

    #[tokio::test]
    async fn empty_answer_is_an_error() {
        let llm = Arc::new(MockLlm::new().reply("   "));
        let executor = AgentExecutor::new(llm, registry());
        let agent = researcher();

        let err = executor.execute_task(&agent, &task(&agent), None).await.unwrap_err();
        assert_eq!(err, AgentError::EmptyResponse("Researcher".to_string()));
    }

    #[tokio::test]
    async fn endless_tool_use_hits_iteration_cap() {
        let llm = Arc::new(
            MockLlm::new()
                .tool_call("a", "lookup", r#"{"term":"x"}"#)
                .tool_call("b", "lookup", r#"{"term":"y"}"#),
        );
        let executor = AgentExecutor::new(llm.clone(), registry());
        let agent = researcher().with_tool("lookup").max_iter(2);

        let err = executor.execute_task(&agent, &task(&agent), None).await.unwrap_err();
        assert_eq!(err, AgentError::MaxIterations(2));
        assert_eq!(llm.calls().len(), 2);
    }
}
