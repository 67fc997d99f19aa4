//! Stage 1: read the statement and work out the month's savings

use super::NodeContext;
use crate::currency::{format_inr, safe_float};
use crate::llm::{ChatRequest, ToolChoice};
use crate::memory::{prune_messages, DEFAULT_MAX_MESSAGES};
use crate::models::{Message, ModelReply, Role};
use crate::state::{StateUpdate, WorkflowState};
use crate::tools::PDF_READER_TOOL;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};

lazy_static! {
    static ref AMOUNT: Regex =
        Regex::new(r"(?i)(?:Rs\.?|₹)?\s*([\d,]+)(?:\.\d+)?\b").expect("amount pattern");
    static ref LABELLED_SAVINGS: [Regex; 3] = [
        Regex::new(r"(?i)savings[:\s]*₹?([\d,]+\.?\d*)").expect("savings pattern"),
        Regex::new(r"(?i)remaining[:\s]*₹?([\d,]+\.?\d*)").expect("remaining pattern"),
        Regex::new(r"(\d{4,})").expect("bare number pattern"),
    ];
}

/// Savings = income lines minus expense lines, with labelled-figure fallbacks.
///
/// Pure function of `content`; the result is never negative.
pub fn extract_savings(content: &str) -> f64 {
    let mut income = 0.0;
    let mut expenses = 0.0;

    for line in content.lines() {
        let Some(caps) = AMOUNT.captures(line) else {
            continue;
        };
        let amount = safe_float(&caps[1].replace(',', ""));
        let context = line.to_lowercase();

        if context.contains("received") || context.contains("salary") {
            income += amount;
        }
        if context.contains("sent") || context.contains("spent") {
            expenses += amount;
        }
    }

    let mut savings = income - expenses;
    debug!(income, expenses, savings, "Computed savings from transaction lines");

    if savings <= 0.0 {
        let flattened = content.replace(',', "");
        if let Some(caps) = LABELLED_SAVINGS
            .iter()
            .find_map(|pattern| pattern.captures(&flattened))
        {
            savings = safe_float(&caps[1]);
            debug!(savings, "Used labelled savings fallback");
        }
    }

    savings.max(0.0)
}

/// True once a tool result has arrived after the newest human turn.
fn tool_result_received(messages: &[Message]) -> bool {
    messages
        .iter()
        .rev()
        .find(|m| matches!(m.role, Role::Tool | Role::Human))
        .is_some_and(|m| m.role == Role::Tool)
}

/// True when the newest run of tool results contains a failure.
fn latest_tool_batch_failed(messages: &[Message]) -> bool {
    messages
        .iter()
        .rev()
        .take_while(|m| m.role == Role::Tool)
        .any(|m| m.is_error)
}

fn zero_savings() -> StateUpdate {
    StateUpdate::new().savings(0.0, format_inr(0.0))
}

/// Analyzer node: ask the model, either getting a tool request or the final narrative.
pub async fn analyze_transactions(ctx: &NodeContext, state: &WorkflowState) -> StateUpdate {
    if latest_tool_batch_failed(&state.messages) {
        warn!("Statement could not be read, recording zero savings");
        ctx.console
            .warning("Could not read the statement. Savings recorded as ₹0.00");
        return zero_savings();
    }

    let follow_up = tool_result_received(&state.messages);
    if follow_up {
        ctx.console.info("Analyzing statement contents");
    } else {
        info!("Agent 1: Transaction Analyzer Started");
        ctx.console.section("Agent 1 : Transaction Analyzer Agent Started");
        ctx.console.info("Start Analyzing Transactions");
    }

    let messages = prune_messages(&state.messages, DEFAULT_MAX_MESSAGES);
    let request = if follow_up {
        ChatRequest::text(messages)
    } else {
        ChatRequest::with_tools(
            messages,
            ctx.tools.specs(&[PDF_READER_TOOL]),
            ToolChoice::Auto,
        )
    };

    let reply = match ctx.llm.complete(request).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(error = %e, "Transaction analyzer failed");
            ctx.console.warning("Transaction analysis failed. Savings recorded as ₹0.00");
            return zero_savings();
        }
    };

    let narrative = match reply {
        ModelReply::ToolCallRequest { content, calls } if !follow_up => {
            let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
            info!(tool_calls = ?names, "Tool call detected");
            return StateUpdate::new().message(Message::ai_with_tool_calls(content, calls));
        }
        // tools were not offered; whatever text came back is the answer
        other => other.text().to_string(),
    };

    let total_savings = extract_savings(&narrative);
    info!(total_savings, "Savings extracted");

    if total_savings > 0.0 {
        ctx.console.plain("-------Final Result of Agent 1--------");
        ctx.console.plain(&format!(
            "Total savings in Current Month: {}",
            format_inr(total_savings)
        ));
    }

    StateUpdate::new()
        .message(Message::ai(narrative))
        .savings(total_savings, format_inr(total_savings))
}

/// Tool node: execute every requested call and record the results.
pub async fn run_analyzer_tools(ctx: &NodeContext, state: &WorkflowState) -> StateUpdate {
    let calls = state
        .last_message()
        .map(|m| m.tool_calls.clone())
        .unwrap_or_default();

    let mut update = StateUpdate::new();
    let mut failed = false;

    for call in &calls {
        match ctx.execute_tool(call).await {
            Ok(output) => {
                debug!(tool = %call.name, success = true, "Tool executed");
                update = update.message(Message::tool(call, output.content()));
            }
            Err(e) => {
                error!(tool = %call.name, error = %e, "Tool execution failed");
                failed = true;
                update = update.message(Message::tool_error(
                    call,
                    format!("Tool {} failed: {}", call.name, e),
                ));
            }
        }
    }

    if failed {
        update.total_savings = Some(0.0);
        update.formatted_savings = Some(format_inr(0.0));
    }

    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdvisorError;
    use crate::models::ToolCall;
    use crate::testing::{test_context, ScriptedModel};
    use serde_json::json;
    use std::sync::Arc;

    const STATEMENT_SUMMARY: &str = "\
Salary received ₹50,000 from Acme Corp
Received ₹5,000 from Rahul
Spent ₹12,000 at Grocery Mart
Sent Rs. 8,000 to landlord
Total savings: ₹35,000";

    fn pdf_call() -> ToolCall {
        ToolCall {
            id: "call_pdf".to_string(),
            name: PDF_READER_TOOL.to_string(),
            args: json!({"pdf_path": "/nope/statement.pdf"}),
        }
    }

    #[test]
    fn test_income_minus_expenses() {
        assert_eq!(extract_savings(STATEMENT_SUMMARY), 35000.0);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let samples = [STATEMENT_SUMMARY, "remaining: 1,200", "nothing here", ""];
        for sample in samples {
            assert_eq!(extract_savings(sample), extract_savings(sample));
        }
    }

    #[test]
    fn test_labelled_fallbacks() {
        // expenses exceed income, so the explicit label wins
        let text = "Spent ₹90,000 on rent\nSavings: ₹12,500.50";
        assert_eq!(extract_savings(text), 12500.5);

        assert_eq!(extract_savings("Amount remaining 7,300 this month"), 7300.0);
        assert_eq!(extract_savings("You kept about 45000 aside"), 45000.0);
    }

    #[test]
    fn test_never_negative() {
        assert_eq!(extract_savings("Spent ₹900 on food"), 0.0);
        assert_eq!(extract_savings("no numbers at all"), 0.0);
    }

    #[tokio::test]
    async fn test_tool_call_is_routed_not_parsed() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(ModelReply::ToolCallRequest {
            content: String::new(),
            calls: vec![pdf_call()],
        })]));
        let ctx = test_context(model.clone(), "yes");
        let state = WorkflowState::seeded("sys".into(), "read nov.pdf".into(), 30, false);

        let update = analyze_transactions(&ctx, &state).await;

        assert_eq!(update.total_savings, None);
        assert!(update.messages[0].has_tool_calls());
        let request = &model.requests()[0];
        assert_eq!(request.tool_choice, ToolChoice::Auto);
        assert_eq!(request.tools[0].name, PDF_READER_TOOL);
    }

    #[tokio::test]
    async fn test_follow_up_has_no_tools_and_parses() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(ModelReply::Text(
            STATEMENT_SUMMARY.to_string(),
        ))]));
        let ctx = test_context(model.clone(), "yes");
        let call = pdf_call();
        let state = WorkflowState::seeded("sys".into(), "read nov.pdf".into(), 30, false)
            .apply(StateUpdate::new().message(Message::ai_with_tool_calls("", vec![call.clone()])))
            .apply(StateUpdate::new().message(Message::tool(&call, "Salary received 50000 ...")));

        let update = analyze_transactions(&ctx, &state).await;

        assert_eq!(update.total_savings, Some(35000.0));
        assert_eq!(update.formatted_savings.as_deref(), Some("₹35,000.00"));
        assert!(model.requests()[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_records_zero() {
        let model = Arc::new(ScriptedModel::new(vec![Err(AdvisorError::Llm(
            "503".to_string(),
        ))]));
        let ctx = test_context(model, "yes");
        let state = WorkflowState::seeded("sys".into(), "hi".into(), 30, false);

        let update = analyze_transactions(&ctx, &state).await;
        assert_eq!(update.total_savings, Some(0.0));
        assert_eq!(update.formatted_savings.as_deref(), Some("₹0.00"));
    }

    #[tokio::test]
    async fn test_unreadable_statement_zeroes_savings() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let ctx = test_context(model.clone(), "yes");
        let state = WorkflowState::seeded("sys".into(), "read".into(), 30, false)
            .apply(StateUpdate::new().message(Message::ai_with_tool_calls("", vec![pdf_call()])));

        let update = run_analyzer_tools(&ctx, &state).await;
        assert_eq!(update.total_savings, Some(0.0));
        assert!(update.messages[0].is_error);

        // the analyzer does not call the model again after a failed read
        let state = state.apply(update);
        let update = analyze_transactions(&ctx, &state).await;
        assert_eq!(update.total_savings, Some(0.0));
        assert!(model.requests().is_empty());
    }
}
