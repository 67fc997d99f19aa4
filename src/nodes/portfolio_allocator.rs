//! Stage 2: split savings into asset classes
//!
//! The model is forced to call the portfolio builder. Any failure along the
//! way lands on the rule-based allocation, so this stage always produces a
//! portfolio.

use super::NodeContext;
use crate::currency::format_inr;
use crate::error::AdvisorError;
use crate::llm::{ChatRequest, ToolChoice};
use crate::memory::{prune_messages, ALLOCATOR_MAX_MESSAGES};
use crate::models::{Message, ModelReply, Portfolio, ToolCall, ToolOutput};
use crate::prompts::{ALLOCATOR_SYSTEM, ALLOCATOR_USER};
use crate::state::{StateUpdate, WorkflowState};
use crate::tools::portfolio_builder::{fallback_portfolio, PortfolioArgs, DEFAULT_AGE};
use crate::tools::PORTFOLIO_BUILDER_TOOL;
use crate::Result;
use serde_json::Value;
use tracing::{debug, error, info, warn};

pub const LLM_FAILURE_MARKER: &str =
    "[FALLBACK] Used rule-based portfolio allocation due to LLM failure.";
/// Also used when the model called some other tool.
pub const NO_TOOL_CALL_MARKER: &str =
    "[FALLBACK] Model did not call portfolio_builder_tool. Used rule-based portfolio allocation.";

struct Profile {
    total_savings: f64,
    user_age: u32,
    insured: bool,
}

impl Profile {
    fn from_state(state: &WorkflowState) -> Self {
        Self {
            total_savings: state.total_savings.unwrap_or(0.0),
            user_age: state.user_age.unwrap_or(DEFAULT_AGE),
            insured: state.insured.unwrap_or(false),
        }
    }

    fn fallback(&self) -> Portfolio {
        fallback_portfolio(self.total_savings, self.user_age, self.insured)
    }
}

async fn request_allocation(
    ctx: &NodeContext,
    state: &WorkflowState,
    profile: &Profile,
) -> Result<ModelReply> {
    let system = ctx.prompts.load(ALLOCATOR_SYSTEM)?;
    let user = ctx.prompts.render(
        ALLOCATOR_USER,
        &[
            ("total_savings", format!("{:.2}", profile.total_savings)),
            ("user_age", profile.user_age.to_string()),
            ("insured", profile.insured.to_string()),
        ],
    )?;

    let mut messages = prune_messages(&state.messages, ALLOCATOR_MAX_MESSAGES);
    messages.push(Message::system(system));
    messages.push(Message::human(user));

    ctx.llm
        .complete(ChatRequest::with_tools(
            messages,
            ctx.tools.specs(&[PORTFOLIO_BUILDER_TOOL]),
            ToolChoice::Required(PORTFOLIO_BUILDER_TOOL.to_string()),
        ))
        .await
}

/// Model node: ask for a forced portfolio_builder_tool call.
pub async fn plan_portfolio(ctx: &NodeContext, state: &WorkflowState) -> StateUpdate {
    let profile = Profile::from_state(state);

    info!(
        total_savings = profile.total_savings,
        user_age = profile.user_age,
        insured = profile.insured,
        "Agent 2: Portfolio Allocator Started"
    );
    ctx.console.section("Agent 2 : Portfolio Allocator Agent Started");
    ctx.console.plain(&format!(
        "Savings: {} | Age: {} | Insured: {}",
        format_inr(profile.total_savings),
        profile.user_age,
        profile.insured
    ));

    match request_allocation(ctx, state, &profile).await {
        Ok(reply) => {
            debug!(
                tool_calls = matches!(reply, ModelReply::ToolCallRequest { .. }),
                "Allocator reply received"
            );
            StateUpdate::new().message(reply.into_message())
        }
        Err(e) => {
            error!(error = %e, fallback_used = true, "Portfolio LLM failed");
            ctx.console
                .warning("LLM failed. Using rule-based portfolio allocation.");
            StateUpdate::new()
                .message(Message::ai(LLM_FAILURE_MARKER))
                .portfolio(profile.fallback())
        }
    }
}

fn portfolio_from_output(output: &ToolOutput) -> Result<Portfolio> {
    let Value::Object(map) = &output.data else {
        return Err(AdvisorError::Tool(format!(
            "{} returned a non-object result",
            PORTFOLIO_BUILDER_TOOL
        )));
    };

    let mut portfolio = Portfolio::new();
    for (asset_class, amount) in map {
        let amount = match amount {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        portfolio.insert(asset_class.as_str(), amount);
    }

    if portfolio.is_empty() {
        return Err(AdvisorError::Tool(format!(
            "{} returned an empty allocation",
            PORTFOLIO_BUILDER_TOOL
        )));
    }
    Ok(portfolio)
}

/// Tool node: run the requested builder call with retry, falling back on failure.
pub async fn build_portfolio(ctx: &NodeContext, state: &WorkflowState) -> StateUpdate {
    let profile = Profile::from_state(state);
    let mut update = StateUpdate::new();

    let portfolio = if let Some(existing) = &state.portfolio {
        debug!("Portfolio already set, skipping tool execution");
        existing.clone()
    } else {
        let (calls, ignored): (Vec<ToolCall>, Vec<ToolCall>) = state
            .last_message()
            .map(|m| m.tool_calls.clone())
            .unwrap_or_default()
            .into_iter()
            .partition(|call| call.name == PORTFOLIO_BUILDER_TOOL);

        // not executed, but every call in the history still gets a result
        for call in &ignored {
            warn!(tool = %call.name, "Ignoring non-allocator tool call");
            update = update.message(Message::tool_error(
                call,
                format!("{} is not available in this step", call.name),
            ));
        }

        let mut chosen: Option<Portfolio> = None;

        if calls.is_empty() {
            warn!(fallback_used = true, "No tool call from allocator model");
            ctx.console
                .warning("No tool call from the model. Using rule-based portfolio allocation.");
            update = update.message(Message::ai(NO_TOOL_CALL_MARKER));
        }

        for call in &calls {
            let args = PortfolioArgs::from_value(&call.args);
            let normalized = ToolCall {
                args: args.to_value(),
                ..call.clone()
            };
            debug!(tool = %call.name, args = %normalized.args, "Executing allocator tool");

            match ctx
                .execute_tool(&normalized)
                .await
                .and_then(|output| portfolio_from_output(&output))
            {
                Ok(portfolio) => {
                    info!(tool = %call.name, "Portfolio built by tool");
                    update = update.message(Message::tool(call, portfolio.to_json().to_string()));
                    chosen.get_or_insert(portfolio);
                }
                Err(e) => {
                    error!(tool = %call.name, error = %e, fallback_used = true, "Portfolio tool failed");
                    ctx.console.warning("Portfolio tool failed. Using fallback allocation.");
                    update = update.message(Message::tool_error(
                        call,
                        format!(
                            "[ERROR] Portfolio tool failed: {}. Using fallback allocation.",
                            e
                        ),
                    ));
                    chosen.get_or_insert_with(|| profile.fallback());
                }
            }
        }

        chosen.unwrap_or_else(|| profile.fallback())
    };

    ctx.console
        .result_box("FINAL PORTFOLIO ALLOCATION", portfolio.iter());

    update.portfolio(portfolio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, EMERGENCY_LABEL, EQUITY_LABEL, INSURANCE_LABEL};
    use crate::testing::{test_context, ScriptedModel};
    use crate::tools::PDF_READER_TOOL;
    use serde_json::json;
    use std::sync::Arc;

    fn funded_state(savings: f64) -> WorkflowState {
        WorkflowState::seeded("sys".into(), "statement".into(), 30, false)
            .apply(StateUpdate::new().savings(savings, format_inr(savings)))
    }

    fn builder_call(args: Value) -> ModelReply {
        ModelReply::ToolCallRequest {
            content: String::new(),
            calls: vec![ToolCall {
                id: "call_alloc".to_string(),
                name: PORTFOLIO_BUILDER_TOOL.to_string(),
                args,
            }],
        }
    }

    #[tokio::test]
    async fn test_forced_tool_call_builds_portfolio() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(builder_call(json!({
            "total_savings": "120000",
            "user_age": 30,
            "insured": "false"
        })))]));
        let ctx = test_context(model.clone(), "yes");
        let state = funded_state(120000.0);

        let state = state.clone().apply(plan_portfolio(&ctx, &state).await);
        let request = &model.requests()[0];
        assert_eq!(
            request.tool_choice,
            ToolChoice::Required(PORTFOLIO_BUILDER_TOOL.to_string())
        );

        let update = build_portfolio(&ctx, &state).await;
        let portfolio = update.portfolio.unwrap();
        assert_eq!(portfolio.get(EQUITY_LABEL), Some("₹67,200.00"));
        assert_eq!(portfolio.get(INSURANCE_LABEL), Some("₹12,000.00"));
        assert_eq!(update.messages[0].role, Role::Tool);
        assert!(!update.messages[0].is_error);
    }

    #[tokio::test]
    async fn test_model_failure_uses_fallback() {
        let model = Arc::new(ScriptedModel::new(vec![Err(AdvisorError::Llm(
            "quota".to_string(),
        ))]));
        let ctx = test_context(model, "yes");

        let update = plan_portfolio(&ctx, &funded_state(120000.0)).await;
        assert_eq!(update.messages[0].content, LLM_FAILURE_MARKER);
        assert_eq!(
            update.portfolio,
            Some(fallback_portfolio(120000.0, 30, false))
        );
    }

    #[tokio::test]
    async fn test_declined_tool_call_uses_fallback() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(ModelReply::Text(
            "Put it all in gold.".to_string(),
        ))]));
        let ctx = test_context(model, "yes");
        let state = funded_state(120000.0);

        let state = state.clone().apply(plan_portfolio(&ctx, &state).await);
        let update = build_portfolio(&ctx, &state).await;

        assert_eq!(update.messages[0].content, NO_TOOL_CALL_MARKER);
        assert_eq!(
            update.portfolio,
            Some(fallback_portfolio(120000.0, 30, false))
        );
    }

    #[tokio::test]
    async fn test_zero_savings_records_sentinel() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(builder_call(json!({
            "total_savings": 0,
            "user_age": 30,
            "insured": false
        })))]));
        let ctx = test_context(model, "yes");
        let state = funded_state(0.0);

        let state = state.clone().apply(plan_portfolio(&ctx, &state).await);
        let update = build_portfolio(&ctx, &state).await;

        let portfolio = update.portfolio.unwrap();
        assert!(portfolio.is_no_savings());
        assert_eq!(portfolio.get(EMERGENCY_LABEL), Some("₹0.00"));
        assert!(update.messages[0].is_error);
        assert!(update.messages[0].content.starts_with("[ERROR] Portfolio tool failed"));
    }

    #[tokio::test]
    async fn test_existing_portfolio_is_kept() {
        let ctx = test_context(Arc::new(ScriptedModel::new(vec![])), "yes");
        let state = funded_state(50000.0)
            .apply(StateUpdate::new().portfolio(fallback_portfolio(50000.0, 30, false)));

        let update = build_portfolio(&ctx, &state).await;
        assert!(update.messages.is_empty());
        assert_eq!(update.portfolio, state.portfolio);
    }

    #[tokio::test]
    async fn test_tool_path_keeps_presentation_order() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(builder_call(json!({
            "total_savings": 120000,
            "user_age": 30,
            "insured": false
        })))]));
        let ctx = test_context(model, "yes");
        let state = funded_state(120000.0);

        let state = state.clone().apply(plan_portfolio(&ctx, &state).await);
        let built = build_portfolio(&ctx, &state).await.portfolio.unwrap();

        let labels: Vec<&str> = built.iter().map(|(label, _)| label).collect();
        let expected = fallback_portfolio(120000.0, 30, false);
        let expected: Vec<&str> = expected.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, expected);
        assert_eq!(labels[0], EQUITY_LABEL);
    }

    #[tokio::test]
    async fn test_other_tool_call_goes_to_fallback() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(ModelReply::ToolCallRequest {
            content: String::new(),
            calls: vec![ToolCall {
                id: "call_pdf".to_string(),
                name: PDF_READER_TOOL.to_string(),
                args: json!({"pdf_path": "/missing/nov.pdf"}),
            }],
        })]));
        let ctx = test_context(model, "yes");
        let state = funded_state(120000.0);

        let state = state.clone().apply(plan_portfolio(&ctx, &state).await);
        let update = build_portfolio(&ctx, &state).await;

        assert_eq!(update.messages.len(), 2);
        assert_eq!(update.messages[0].tool_call_id.as_deref(), Some("call_pdf"));
        assert!(update.messages[0].is_error);
        assert_eq!(update.messages[1].content, NO_TOOL_CALL_MARKER);
        assert_eq!(
            update.portfolio,
            Some(fallback_portfolio(120000.0, 30, false))
        );
    }
}
