//! Savings Advisor Pipeline
//!
//! A three-stage personal-finance agent:
//! - reads a monthly bank statement and works out the month's savings
//! - splits savings into asset classes with the "100 - age" rule
//! - recommends one stock for the equity share and asks the operator to confirm
//!
//! Each stage may fail on its own; failures become rule-based fallbacks or
//! sentinel outcomes so a run always reaches its terminal state.
//!
//! FLOW:
//! STATEMENT → ANALYZE ⇄ PDF TOOL → ALLOCATE → PICK → CONFIRM → REPORT

pub mod agent;
pub mod audit;
pub mod config;
pub mod console;
pub mod currency;
pub mod error;
pub mod gemini;
pub mod llm;
pub mod memory;
pub mod models;
pub mod nodes;
pub mod prompts;
pub mod retry;
pub mod state;
pub mod telemetry;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{AdvisorError, Result};

// Re-export common types
pub use models::*;
pub use agent::Orchestrator;
pub use state::{StateUpdate, WorkflowState};
