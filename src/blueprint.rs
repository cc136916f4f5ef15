//! The scripted crew: two agents and three tasks.

use thiserror::Error;

use crate::agents::Agent;
use crate::config::Config;
use crate::crew::{Crew, CrewError};
use crate::llm::LlmSettings;
use crate::task::{Task, TaskError};
use crate::tools::SERPER_TOOL_NAME;

pub const RESEARCHER_ROLE: &str = "Researcher";
pub const WRITER_ROLE: &str = "Technical Writer";

#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("Expected agents [{}], got [{}]", .expected.join(", "), .found.join(", "))]
    UnexpectedAgents {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Fixed sampling parameters with the configured model.
pub fn create_llm_settings(config: &Config) -> LlmSettings {
    LlmSettings::default().with_model(config.model.clone())
}

/// The researcher and the writer, in that order.
pub fn create_agents(llm: &LlmSettings, with_search: bool) -> Vec<Agent> {
    let mut researcher = Agent::new(
        RESEARCHER_ROLE,
        "Discover and analyze cutting-edge developments in AI technology",
        "You are an expert technology researcher with deep knowledge of artificial intelligence trends",
        llm.clone(),
    )
    .verbose(true);
    if with_search {
        researcher = researcher.with_tool(SERPER_TOOL_NAME);
    }

    let writer = Agent::new(
        WRITER_ROLE,
        "Create clear and engaging content explaining complex AI concepts",
        "You are a skilled technical writer who specializes in making complex topics accessible",
        llm.clone(),
    )
    .verbose(true);

    vec![researcher, writer]
}

/// Research, analysis and writing tasks bound to `agents`.
///
/// # Errors
/// `UnexpectedAgents` unless `agents` is exactly `[researcher, writer]` as
/// returned by [`create_agents`].
pub fn create_tasks(agents: &[Agent]) -> Result<Vec<Task>, BlueprintError> {
    let (researcher, writer) = match agents {
        [researcher, writer] if researcher.role() == RESEARCHER_ROLE && writer.role() == WRITER_ROLE => {
            (researcher, writer)
        }
        _ => {
            return Err(BlueprintError::UnexpectedAgents {
                expected: vec![RESEARCHER_ROLE.to_string(), WRITER_ROLE.to_string()],
                found: agents.iter().map(|a| a.role().to_string()).collect(),
            })
        }
    };

    Ok(vec![
        Task::new(
            "Research the latest developments in large language models",
            "A comprehensive summary of recent advances in LLMs with key insights",
            researcher,
        )?,
        Task::new(
            "Analyze potential business applications of recent AI advancements",
            "A detailed report on how new AI technologies can be applied in various industries",
            researcher,
        )?,
        Task::new(
            "Write a blog post explaining how large language models work to a general audience",
            "A well-structured, engaging blog post of 500 words that explains LLMs in simple terms",
            writer,
        )?,
    ])
}

pub fn create_crew(agents: Vec<Agent>, tasks: Vec<Task>) -> Result<Crew, CrewError> {
    Ok(Crew::new(agents, tasks)?.verbose(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvSnapshot, RunOptions};
    use crate::llm::ModelRef;

    fn config(model: &str) -> Config {
        let env = EnvSnapshot::from_lookup(|name| match name {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "LANGCHAIN_API_KEY" => Some("ls-test".to_string()),
            "CREW_MODEL" => Some(model.to_string()),
            _ => None,
        });
        Config::from_snapshot(&env, &RunOptions::default()).unwrap()
    }

    #[test]
    fn llm_settings_take_configured_model() {
        let settings = create_llm_settings(&config("openai/gpt-4o"));
        assert_eq!(settings.model, ModelRef::parse("openai/gpt-4o").unwrap());
        assert_eq!(settings.temperature, Some(0.8));
        assert_eq!(settings.seed, Some(42));
    }

    #[test]
    fn agents_are_researcher_then_writer() {
        let agents = create_agents(&LlmSettings::default(), false);
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].role(), "Researcher");
        assert_eq!(agents[1].role(), "Technical Writer");
        assert!(agents.iter().all(Agent::is_verbose));
        assert!(agents.iter().all(|a| a.tools().is_empty()));
        assert!(agents[1].backstory().contains("making complex topics accessible"));
    }

    #[test]
    fn search_attaches_tool_to_researcher_only() {
        let agents = create_agents(&LlmSettings::default(), true);
        assert_eq!(agents[0].tools(), &["serper_search".to_string()]);
        assert!(agents[1].tools().is_empty());
    }

    #[test]
    fn tasks_reference_provided_agents() {
        let agents = create_agents(&LlmSettings::default(), false);
        let tasks = create_tasks(&agents).unwrap();

        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].agent(), agents[0].id());
        assert_eq!(tasks[1].agent(), agents[0].id());
        assert_eq!(tasks[2].agent(), agents[1].id());
        assert!(tasks
            .iter()
            .all(|t| agents.iter().any(|a| a.id() == t.agent())));
        assert!(tasks[2].expected_output().contains("500 words"));
    }

    #[test]
    fn tasks_need_the_scripted_agents() {
        let agents = create_agents(&LlmSettings::default(), false);

        let err = create_tasks(&agents[..1]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected agents [Researcher, Technical Writer], got [Researcher]"
        );

        let swapped = vec![agents[1].clone(), agents[0].clone()];
        assert!(matches!(
            create_tasks(&swapped),
            Err(BlueprintError::UnexpectedAgents { .. })
        ));
    }

    #[test]
    fn crew_is_built_from_blueprint() {
        let agents = create_agents(&LlmSettings::default(), false);
        let tasks = create_tasks(&agents).unwrap();
        let crew = create_crew(agents, tasks).unwrap();
        assert_eq!(crew.agents().len(), 2);
        assert_eq!(crew.tasks().len(), 3);
    }
}
