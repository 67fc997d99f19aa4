//! Tool trait and registry
//!
//! Tools are the callables the model may ask for. The registry is a fixed
//! name → tool mapping built once per run.

pub mod pdf_reader;
pub mod portfolio_builder;
pub mod web_search;

pub use pdf_reader::PdfReaderTool;
pub use portfolio_builder::PortfolioBuilderTool;
pub use web_search::WebSearchTool;

use crate::error::AdvisorError;
use crate::models::{ToolCall, ToolInput, ToolOutput, ToolSpec};
use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub const PDF_READER_TOOL: &str = "pdf_reader_tool";
pub const PORTFOLIO_BUILDER_TOOL: &str = "portfolio_builder_tool";
pub const WEB_SEARCH_TOOL: &str = "web_search_tool";

#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON schema of the arguments object
    fn parameters(&self) -> Value;
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Schemas for the named tools, skipping names that are not registered
    pub fn specs(&self, names: &[&str]) -> Vec<ToolSpec> {
        names
            .iter()
            .filter_map(|name| self.get(name))
            .map(|tool| tool.spec())
            .collect()
    }

    /// Run a model-requested call. A tool reporting `success: false` is an error.
    pub async fn execute_call(&self, call: &ToolCall) -> Result<ToolOutput> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AdvisorError::ToolNotFound(call.name.clone()))?;

        let input = ToolInput {
            tool_name: call.name.clone(),
            parameters: call.args.clone(),
        };

        let output = tool.execute(&input).await?;
        if !output.success {
            return Err(AdvisorError::Tool(
                output
                    .error
                    .unwrap_or_else(|| format!("{} reported failure", call.name)),
            ));
        }

        Ok(output)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn ensure_object_parameters(input: &ToolInput) -> Result<()> {
    if input.parameters.is_object() {
        Ok(())
    } else {
        Err(AdvisorError::InvalidToolInput(
            "tool_input must be a JSON object".to_string(),
        ))
    }
}

/// Registry with the PDF reader, the portfolio builder and web search.
pub fn create_default_registry(search: WebSearchTool) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(PdfReaderTool));
    registry.register(Arc::new(PortfolioBuilderTool));
    registry.register(Arc::new(search));

    registry
}
