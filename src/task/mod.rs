//! Task module - task records, their lifecycle and their outputs.
//!
//! A task is plain configuration until a crew runs it; the only mutable
//! state is its status and, once completed, its output.

pub mod task;
mod output;

pub use output::{TaskOutput, TokenUsageSummary};
pub use task::{Task, TaskError, TaskId, TaskStatus};
