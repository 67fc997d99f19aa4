//! Core data models for the savings advisor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset-class label the instrument picker reads its budget from.
pub const EQUITY_LABEL: &str = "Equity (Stocks)";
pub const BOND_LABEL: &str = "Bond Securities";
pub const EMERGENCY_LABEL: &str = "Emergency Fund";
pub const INSURANCE_LABEL: &str = "Insurance";

//
// ================= Messages =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Human,
    Ai,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: serde_json::Value,
}

/// One conversational turn in the workflow history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Set on tool results; links back to the originating call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool name on tool results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_error: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
            is_error: false,
            created_at: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::with_role(Role::Human, content)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::with_role(Role::Ai, content)
    }

    pub fn ai_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::with_role(Role::Ai, content)
        }
    }

    pub fn tool(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call.id.clone()),
            name: Some(call.name.clone()),
            ..Self::with_role(Role::Tool, content)
        }
    }

    pub fn tool_error(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::tool(call, content)
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

//
// ================= Model I/O =================
//

/// Schema advertised to the model for one callable tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// What the completion service answered
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Text(String),
    ToolCallRequest {
        content: String,
        calls: Vec<ToolCall>,
    },
}

impl ModelReply {
    pub fn text(&self) -> &str {
        match self {
            ModelReply::Text(text) => text,
            ModelReply::ToolCallRequest { content, .. } => content,
        }
    }

    pub fn into_message(self) -> Message {
        match self {
            ModelReply::Text(text) => Message::ai(text),
            ModelReply::ToolCallRequest { content, calls } => {
                Message::ai_with_tool_calls(content, calls)
            }
        }
    }
}

//
// ================= Tool I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub tool_name: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub data: serde_json::Value,
    pub error: Option<String>,
}

impl ToolOutput {
    /// Text handed back to the model as the tool result
    pub fn content(&self) -> String {
        match &self.data {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

//
// ================= Portfolio =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Allocation {
    pub asset_class: String,
    pub amount: String,
}

/// Asset class → formatted currency amount, in presentation order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Portfolio {
    allocations: Vec<Allocation>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sentinel recorded when there is nothing to invest.
    pub fn no_savings() -> Self {
        let mut portfolio = Self::new();
        portfolio.insert(EMERGENCY_LABEL, "₹0.00");
        portfolio.insert("Note", "No savings to invest");
        portfolio
    }

    pub fn insert(&mut self, asset_class: impl Into<String>, amount: impl Into<String>) {
        let asset_class = asset_class.into();
        let amount = amount.into();
        match self
            .allocations
            .iter_mut()
            .find(|a| a.asset_class == asset_class)
        {
            Some(existing) => existing.amount = amount,
            None => self.allocations.push(Allocation {
                asset_class,
                amount,
            }),
        }
    }

    pub fn get(&self, asset_class: &str) -> Option<&str> {
        self.allocations
            .iter()
            .find(|a| a.asset_class == asset_class)
            .map(|a| a.amount.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.allocations
            .iter()
            .map(|a| (a.asset_class.as_str(), a.amount.as_str()))
    }

    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    pub fn is_no_savings(&self) -> bool {
        self.get("Note") == Some("No savings to invest")
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::Value::Object(map)
    }
}

//
// ================= Execution =================
//

/// Terminal outcome of the instrument picker
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionDecision {
    ConfirmedByUser,
    Cancelled,
    Skipped,
    Failed,
}

impl fmt::Display for ExecutionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionDecision::ConfirmedByUser => "confirmed_by_user",
            ExecutionDecision::Cancelled => "cancelled",
            ExecutionDecision::Skipped => "skipped",
            ExecutionDecision::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portfolio_keeps_insertion_order() {
        let mut portfolio = Portfolio::new();
        portfolio.insert(EQUITY_LABEL, "₹1.00");
        portfolio.insert(BOND_LABEL, "₹2.00");
        portfolio.insert(EQUITY_LABEL, "₹3.00");

        let labels: Vec<&str> = portfolio.iter().map(|(k, _)| k).collect();
        assert_eq!(labels, vec![EQUITY_LABEL, BOND_LABEL]);
        assert_eq!(portfolio.get(EQUITY_LABEL), Some("₹3.00"));
    }

    #[test]
    fn test_no_savings_sentinel() {
        let portfolio = Portfolio::no_savings();
        assert!(portfolio.is_no_savings());
        assert_eq!(portfolio.get(EMERGENCY_LABEL), Some("₹0.00"));
        assert_eq!(portfolio.get(EQUITY_LABEL), None);
    }

    #[test]
    fn test_reply_into_message() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "pdf_reader_tool".to_string(),
            args: serde_json::json!({"pdf_path": "a.pdf"}),
        };
        let msg = ModelReply::ToolCallRequest {
            content: String::new(),
            calls: vec![call.clone()],
        }
        .into_message();

        assert_eq!(msg.role, Role::Ai);
        assert!(msg.has_tool_calls());

        let result = Message::tool_error(&call, "boom");
        assert_eq!(result.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(result.name.as_deref(), Some("pdf_reader_tool"));
        assert!(result.is_error);
    }
}
