//! Agents module - agent records and the task execution loop.
//!
//! # Types
//! - **Agent**: role, goal and backstory bound to LLM settings and a tool list
//! - **AgentExecutor**: runs one agent on one task, dispatching tool calls
//!
//! Agents hold no conversation state between tasks; whatever a later task
//! needs from an earlier one is passed in as context by the crew.

mod agent;
mod executor;
mod types;

pub use agent::{Agent, AgentSummary, DEFAULT_MAX_ITER};
pub use executor::AgentExecutor;
pub use types::{AgentError, AgentId};
