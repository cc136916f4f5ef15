//! # crewline
//!
//! A small sequential agent crew: a researcher and a technical writer work
//! through three scripted tasks against an OpenAI-compatible chat endpoint.
//!
//! ## Architecture
//!
//! ```text
//!   Cli ──► Config ──► blueprint (agents + tasks)
//!                            │
//!                            ▼
//!                     ┌─────────────┐
//!                     │    Crew     │  tasks in order, earlier outputs as context
//!                     └──────┬──────┘
//!                            ▼
//!                     ┌─────────────┐      ┌──────────────┐
//!                     │AgentExecutor│ ───► │ ToolRegistry │ (Serper search)
//!                     └──────┬──────┘      └──────────────┘
//!                            ▼
//!                       LlmClient (OpenAI, retry)
//! ```
//!
//! ## Modules
//! - `config`: environment validation and `.env` loading
//! - `llm`: chat-completion client, fixed sampling parameters, retry policy
//! - `tools`: tool trait, registry and the Serper web search
//! - `agents`: agent records and the tool-calling loop
//! - `task`: task records, status and outputs
//! - `crew`: sequential orchestration
//! - `blueprint`: the scripted agents and tasks
//! - `runner`: top-level run, catch-all variant and result rendering

pub mod agents;
pub mod blueprint;
pub mod cli;
pub mod config;
pub mod crew;
pub mod llm;
pub mod runner;
pub mod task;
pub mod tools;

pub use config::Config;
pub use crew::{Crew, CrewOutput};
