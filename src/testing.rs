//! Test doubles shared by the stage and orchestrator tests

use crate::console::{Console, PresetConfirmation};
use crate::error::AdvisorError;
use crate::llm::{ChatModel, ChatRequest};
use crate::models::{ModelReply, ToolInput, ToolOutput};
use crate::nodes::{NodeContext, PipelineSettings};
use crate::prompts::PromptLoader;
use crate::retry::RetryPolicy;
use crate::tools::{PdfReaderTool, PortfolioBuilderTool, Tool, ToolRegistry, WEB_SEARCH_TOOL};
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SEARCH_RESULT: &str = "1. ITC share price today (https://example.com/itc)\nITC Limited trades near ₹430 on NSE with a steady dividend record and low debt across its FMCG and hotels business.";

/// Replays queued replies in order and records every request.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ModelReply>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<ModelReply>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ModelReply> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AdvisorError::Llm("script exhausted".to_string())))
    }
}

/// Web search stand-in returning a fixed result
pub struct CannedSearch;

#[async_trait]
impl Tool for CannedSearch {
    fn name(&self) -> &'static str {
        WEB_SEARCH_TOOL
    }

    fn description(&self) -> &'static str {
        "Canned web search"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {"query": {"type": "string"}}})
    }

    async fn execute(&self, _input: &ToolInput) -> Result<ToolOutput> {
        Ok(ToolOutput {
            success: true,
            data: Value::String(SEARCH_RESULT.to_string()),
            error: None,
        })
    }
}

pub fn test_context(model: Arc<dyn ChatModel>, answer: &str) -> NodeContext {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(PdfReaderTool));
    tools.register(Arc::new(PortfolioBuilderTool));
    tools.register(Arc::new(CannedSearch));

    NodeContext {
        llm: model,
        tools,
        prompts: PromptLoader::builtin(),
        console: Console::silent(),
        confirmation: Arc::new(PresetConfirmation::new(answer)),
        retry: RetryPolicy::new(3, Duration::from_millis(1)),
        settings: PipelineSettings::default(),
    }
}
