//! Pipeline stages
//!
//! Each node reads the current [`WorkflowState`](crate::state::WorkflowState)
//! and returns a [`StateUpdate`](crate::state::StateUpdate). Nodes never
//! return errors: failures inside a stage become fallbacks or sentinels.

pub mod instrument_picker;
pub mod portfolio_allocator;
pub mod transaction_analyzer;

use crate::console::{Confirmation, Console};
use crate::llm::ChatModel;
use crate::models::{ToolCall, ToolOutput};
use crate::prompts::PromptLoader;
use crate::retry::{retry, RetryPolicy};
use crate::tools::ToolRegistry;
use crate::Result;
use std::sync::Arc;

/// Thresholds the stages apply
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Equity budgets below this skip stock picking
    pub min_equity: f64,
    /// Tool results shorter than this are not treated as search context
    pub min_search_context_chars: usize,
    pub max_search_context_chars: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            min_equity: 5000.0,
            min_search_context_chars: 100,
            max_search_context_chars: 12_000,
        }
    }
}

/// Collaborators handed to every node
pub struct NodeContext {
    pub llm: Arc<dyn ChatModel>,
    pub tools: ToolRegistry,
    pub prompts: PromptLoader,
    pub console: Console,
    pub confirmation: Arc<dyn Confirmation>,
    pub retry: RetryPolicy,
    pub settings: PipelineSettings,
}

impl NodeContext {
    /// Execute a tool call under the retry policy.
    pub async fn execute_tool(&self, call: &ToolCall) -> Result<ToolOutput> {
        retry(&self.retry, &call.name, || self.tools.execute_call(call)).await
    }
}
