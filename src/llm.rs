//! Language-model seam
//!
//! Stages talk to the completion service only through [`ChatModel`], so the
//! Gemini client and the scripted test double are interchangeable.

use crate::models::{Message, ModelReply, ToolSpec};
use crate::Result;
use async_trait::async_trait;

/// How strongly the model is steered towards the offered tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    /// Model decides whether to call a tool
    Auto,
    /// Model must call the named tool
    Required(String),
    /// Tools are not callable for this turn
    None,
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    pub tool_choice: ToolChoice,
}

impl ChatRequest {
    /// Plain completion with no tool access
    pub fn text(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            tool_choice: ToolChoice::None,
        }
    }

    pub fn with_tools(messages: Vec<Message>, tools: Vec<ToolSpec>, tool_choice: ToolChoice) -> Self {
        Self {
            messages,
            tools,
            tool_choice,
        }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, request: ChatRequest) -> Result<ModelReply>;
}
