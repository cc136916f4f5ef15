//! Top-level run: configuration in, crew result out.

use std::sync::Arc;

use thiserror::Error;

use crate::blueprint::{self, BlueprintError};
use crate::config::{self, Config, ConfigError, EnvSnapshot, RunOptions};
use crate::crew::{CrewError, CrewOutput};
use crate::llm::{self, LlmClient, ProviderError};
use crate::tools::{SerperDevTool, ToolRegistry};

pub const RESULT_BANNER: &str = "\n==== CREW RESULT ====\n";

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Failed to set up web search: {0}")]
    SearchTool(String),

    #[error(transparent)]
    Blueprint(#[from] BlueprintError),

    #[error(transparent)]
    Crew(#[from] CrewError),
}

/// Load and validate the environment, then export the derived variables.
///
/// Call before any runtime threads exist: it writes the process environment.
pub fn prepare(options: &RunOptions) -> Result<Config, RunError> {
    let config = config::load_environment(options)?;
    config.apply_derived_env();
    Ok(config)
}

/// [`prepare`] over an explicit snapshot.
pub fn prepare_from(env: &EnvSnapshot, options: &RunOptions) -> Result<Config, RunError> {
    let config = Config::from_snapshot(env, options)?;
    config.apply_derived_env();
    Ok(config)
}

/// Catch-all variant of [`prepare`]: a failure is logged and becomes `None`.
pub fn prepare_guarded(options: &RunOptions) -> Option<Config> {
    guard("Environment setup", prepare(options))
}

pub fn prepare_guarded_from(env: &EnvSnapshot, options: &RunOptions) -> Option<Config> {
    guard("Environment setup", prepare_from(env, options))
}

/// Build the client for `config` and run the crew.
pub async fn run(config: &Config) -> Result<CrewOutput, RunError> {
    let settings = blueprint::create_llm_settings(config);
    let llm = llm::build_client(
        &settings,
        &config.openai_api_key,
        Some(config.openai_api_base.clone()),
    )?;
    run_with(config, llm).await
}

/// Run the crew against an already built client.
pub async fn run_with(config: &Config, llm: Arc<dyn LlmClient>) -> Result<CrewOutput, RunError> {
    let mut tools = ToolRegistry::empty();
    if config.with_search {
        let key = config
            .serper_api_key
            .clone()
            .ok_or_else(|| RunError::SearchTool("SERPER_API_KEY is not set".to_string()))?;
        let serper = SerperDevTool::new(key).map_err(|e| RunError::SearchTool(format!("{:#}", e)))?;
        tools.register(Arc::new(serper));
    }

    let settings = blueprint::create_llm_settings(config);
    let agents: Vec<_> = blueprint::create_agents(&settings, config.with_search)
        .into_iter()
        .map(|agent| agent.verbose(config.verbose))
        .collect();
    let tasks = blueprint::create_tasks(&agents)?;
    let mut crew = blueprint::create_crew(agents, tasks)?.verbose(config.verbose);

    tracing::info!(
        model = %settings.model,
        search = config.with_search,
        tasks = crew.tasks().len(),
        "Starting crew"
    );
    let output = crew.kickoff(llm, Arc::new(tools)).await?;
    tracing::info!(
        total_tokens = output.token_usage.total_tokens,
        requests = output.token_usage.successful_requests,
        "Crew finished"
    );
    Ok(output)
}

/// Catch-all variant of [`run`]: any failure is logged and becomes `None`.
pub async fn run_guarded(config: &Config) -> Option<CrewOutput> {
    guard("Crew run", run(config).await)
}

pub async fn run_guarded_with(config: &Config, llm: Arc<dyn LlmClient>) -> Option<CrewOutput> {
    guard("Crew run", run_with(config, llm).await)
}

fn guard<T>(stage: &str, result: Result<T, RunError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            let e = anyhow::Error::new(e);
            tracing::error!(error = %format!("{:#}", e), "{} failed", stage);
            tracing::debug!("Error details: {:?}", e);
            None
        }
    }
}

/// The text printed to stdout after a successful run.
pub fn render_result(output: &CrewOutput) -> String {
    format!("{}\n{}", RESULT_BANNER, output.raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockLlm;
    use crate::task::TokenUsageSummary;

    fn config(model: &str, with_search: bool, quiet: bool) -> Config {
        let env = EnvSnapshot::from_lookup(|name| match name {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "LANGCHAIN_API_KEY" => Some("ls-test".to_string()),
            "SERPER_API_KEY" => Some("serper-test".to_string()),
            _ => None,
        });
        let options = RunOptions {
            with_search,
            model: Some(model.to_string()),
            quiet,
            env_file: None,
        };
        Config::from_snapshot(&env, &options).unwrap()
    }

    fn scripted() -> Arc<MockLlm> {
        Arc::new(
            MockLlm::new()
                .reply("LLM research notes")
                .reply("Business report")
                .reply("Blog post about LLMs"),
        )
    }

    #[tokio::test]
    async fn run_returns_last_task_output() {
        let llm = scripted();
        let output = run_with(&config("openai/gpt-4", false, true), llm.clone())
            .await
            .unwrap();

        assert_eq!(output.raw, "Blog post about LLMs");
        assert_eq!(output.tasks_output.len(), 3);
        assert_eq!(output.tasks_output[1].agent, "Researcher");
        assert_eq!(output.tasks_output[2].agent, "Technical Writer");

        let calls = llm.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|c| c.model == "openai/gpt-4"));
        assert!(calls.iter().all(|c| c.tool_names.is_empty()));
    }

    #[tokio::test]
    async fn search_offers_serper_to_researcher() {
        let llm = scripted();
        run_with(&config("openai/gpt-4", true, true), llm.clone())
            .await
            .unwrap();

        let calls = llm.calls();
        assert_eq!(calls[0].tool_names, vec!["serper_search".to_string()]);
        assert_eq!(calls[1].tool_names, vec!["serper_search".to_string()]);
        assert!(calls[2].tool_names.is_empty());
    }

    #[tokio::test]
    async fn guarded_run_returns_none_on_llm_failure() {
        let llm = Arc::new(
            MockLlm::new()
                .reply("notes")
                .fail("Client error (HTTP 401): invalid api key"),
        );
        let result = run_guarded_with(&config("openai/gpt-4", false, true), llm.clone()).await;
        assert!(result.is_none());
        assert_eq!(llm.calls().len(), 2);
    }

    #[tokio::test]
    async fn guarded_run_returns_none_for_unknown_provider() {
        let result = run_guarded(&config("mistral/large", false, true)).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn unguarded_run_propagates_errors() {
        let err = run(&config("mistral/large", false, true)).await.unwrap_err();
        assert_eq!(err.to_string(), "unknown LLM provider: mistral");

        let llm = Arc::new(MockLlm::new().fail("Server error (HTTP 503): overloaded"));
        let err = run_with(&config("openai/gpt-4", false, true), llm).await.unwrap_err();
        assert!(matches!(err, RunError::Crew(CrewError::TaskFailed { .. })));
        let chain = format!("{:#}", anyhow::Error::new(err));
        assert!(chain.contains("overloaded"), "chain was: {}", chain);
    }

    #[test]
    fn guarded_setup_returns_none_for_missing_variable() {
        let env = EnvSnapshot::from_lookup(|name| match name {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            _ => None,
        });
        assert!(prepare_guarded_from(&env, &RunOptions::default()).is_none());

        match prepare_from(&env, &RunOptions::default()) {
            Err(RunError::Config(ConfigError::MissingEnvVars(missing))) => {
                assert_eq!(missing, vec!["LANGCHAIN_API_KEY".to_string()])
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn result_is_rendered_under_banner() {
        let output = CrewOutput {
            raw: "Final post".to_string(),
            tasks_output: vec![],
            token_usage: TokenUsageSummary::default(),
        };
        assert_eq!(render_result(&output), "\n==== CREW RESULT ====\n\nFinal post");
    }
}
