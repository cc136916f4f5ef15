//! Configuration management for crewline.
//!
//! Configuration is read from environment variables, optionally seeded from a
//! `.env` file:
//! - `OPENAI_API_KEY` - Required. Key for the OpenAI-compatible endpoint.
//! - `LANGCHAIN_API_KEY` - Required. Exported for LangSmith-aware tooling.
//! - `SERPER_API_KEY` - Required when web search is enabled, otherwise optional.
//! - `OPENAI_API_BASE` - Optional. Defaults to `https://api.openai.com/v1`.
//! - `CREW_MODEL` - Optional. `provider/model_name`, defaults to `openai/gpt-4`.
//!
//! `LANGCHAIN_TRACING_V2=true` is always exported by [`Config::apply_derived_env`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::llm::{ModelRef, DEFAULT_OPENAI_BASE_URL};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const LANGCHAIN_API_KEY: &str = "LANGCHAIN_API_KEY";
pub const SERPER_API_KEY: &str = "SERPER_API_KEY";
pub const OPENAI_API_BASE: &str = "OPENAI_API_BASE";
pub const CREW_MODEL: &str = "CREW_MODEL";
pub const LANGCHAIN_TRACING_V2: &str = "LANGCHAIN_TRACING_V2";

pub const DEFAULT_MODEL: &str = "openai/gpt-4";

/// Every variable the snapshot captures.
const KNOWN_VARS: [&str; 5] = [
    OPENAI_API_KEY,
    LANGCHAIN_API_KEY,
    SERPER_API_KEY,
    OPENAI_API_BASE,
    CREW_MODEL,
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingEnvVars(Vec<String>),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Cannot read env file {0:?}: {1}")]
    EnvFile(PathBuf, String),
}

/// The configuration-relevant slice of an environment.
///
/// Blank values are dropped on capture, so a variable set to `""` reads as
/// missing.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = KNOWN_VARS
            .iter()
            .filter_map(|name| lookup(name).map(|v| (name.to_string(), v)))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();
        Self { vars }
    }

    pub fn from_process() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Values from a `.env` file alone.
    pub fn parse_dotenv_file(path: &Path) -> Result<Self, ConfigError> {
        let env_file_err = |e: dotenvy::Error| ConfigError::EnvFile(path.to_path_buf(), e.to_string());

        let mut file_vars = HashMap::new();
        for item in dotenvy::from_path_iter(path).map_err(env_file_err)? {
            let (key, value) = item.map_err(env_file_err)?;
            file_vars.insert(key, value);
        }
        Ok(Self::from_lookup(|name| file_vars.get(name).cloned()))
    }

    /// File values with the process environment layered on top.
    pub fn from_dotenv_file(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::parse_dotenv_file(path)?.overlay(Self::from_process()))
    }

    /// Values in `other` win.
    pub fn overlay(mut self, other: EnvSnapshot) -> Self {
        self.vars.extend(other.vars);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Choices made on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Attach the web-search tool to the researcher.
    pub with_search: bool,
    /// Overrides `CREW_MODEL`.
    pub model: Option<String>,
    pub quiet: bool,
    /// `.env` file to read beneath the process environment. Skipped when absent.
    pub env_file: Option<PathBuf>,
}

/// Validated configuration.
#[derive(Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub langchain_api_key: String,
    pub serper_api_key: Option<String>,
    pub openai_api_base: String,
    pub model: ModelRef,
    pub with_search: bool,
    pub verbose: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("openai_api_key", &"<redacted>")
            .field("langchain_api_key", &"<redacted>")
            .field("serper_api_key", &self.serper_api_key.as_ref().map(|_| "<redacted>"))
            .field("openai_api_base", &self.openai_api_base)
            .field("model", &self.model.to_string())
            .field("with_search", &self.with_search)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl Config {
    /// Validate a snapshot.
    ///
    /// # Errors
    /// `MissingEnvVars` lists every missing required variable, in declaration
    /// order. `InvalidValue` for a model reference that does not parse.
    pub fn from_snapshot(env: &EnvSnapshot, options: &RunOptions) -> Result<Self, ConfigError> {
        let mut required = vec![OPENAI_API_KEY, LANGCHAIN_API_KEY];
        if options.with_search {
            required.push(SERPER_API_KEY);
        }
        let missing: Vec<String> = required
            .into_iter()
            .filter(|name| env.get(name).is_none())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingEnvVars(missing));
        }

        let (model_source, model) = match options.model.as_deref() {
            Some(model) => ("--model", model),
            None => (CREW_MODEL, env.get(CREW_MODEL).unwrap_or(DEFAULT_MODEL)),
        };
        let model = ModelRef::parse(model)
            .map_err(|e| ConfigError::InvalidValue(model_source.to_string(), e.to_string()))?;

        let openai_api_base = env
            .get(OPENAI_API_BASE)
            .unwrap_or(DEFAULT_OPENAI_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        if !openai_api_base.starts_with("http://") && !openai_api_base.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                OPENAI_API_BASE.to_string(),
                "expected an http(s) URL".to_string(),
            ));
        }

        Ok(Self {
            openai_api_key: env.get(OPENAI_API_KEY).unwrap_or_default().to_string(),
            langchain_api_key: env.get(LANGCHAIN_API_KEY).unwrap_or_default().to_string(),
            serper_api_key: env.get(SERPER_API_KEY).map(str::to_string),
            openai_api_base,
            model,
            with_search: options.with_search,
            verbose: !options.quiet,
        })
    }

    /// Export the validated keys and `LANGCHAIN_TRACING_V2=true` to the
    /// process environment.
    pub fn apply_derived_env(&self) {
        std::env::set_var(LANGCHAIN_TRACING_V2, "true");
        std::env::set_var(OPENAI_API_KEY, &self.openai_api_key);
        std::env::set_var(LANGCHAIN_API_KEY, &self.langchain_api_key);
        if let Some(key) = &self.serper_api_key {
            std::env::set_var(SERPER_API_KEY, key);
        }
    }
}

/// Read and validate the process environment, seeded from `options.env_file`.
pub fn load_environment(options: &RunOptions) -> Result<Config, ConfigError> {
    let env = match options.env_file.as_deref() {
        Some(path) if path.is_file() => {
            tracing::debug!(path = %path.display(), "Reading env file");
            EnvSnapshot::from_dotenv_file(path)?
        }
        Some(path) => {
            tracing::debug!(path = %path.display(), "No env file, using process environment");
            EnvSnapshot::from_process()
        }
        None => EnvSnapshot::from_process(),
    };
    Config::from_snapshot(&env, options)
}
