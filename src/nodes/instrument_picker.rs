//! Stage 3: recommend one stock for the equity budget and gate it on the operator

use super::NodeContext;
use crate::console::is_affirmative;
use crate::currency::{format_inr, parse_inr};
use crate::error::AdvisorError;
use crate::llm::ChatRequest;
use crate::memory::{prune_messages, DEFAULT_MAX_MESSAGES};
use crate::models::{ExecutionDecision, Message, Role, ToolCall, EQUITY_LABEL};
use crate::prompts::{PICKER_SYSTEM, PICKER_USER};
use crate::state::{StateUpdate, WorkflowState};
use crate::tools::{PDF_READER_TOOL, PORTFOLIO_BUILDER_TOOL, WEB_SEARCH_TOOL};
use crate::Result;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const SKIPPED_LOW_EQUITY: &str = "Skipped: Low equity amount";
pub const CANCELLED_BY_USER: &str = "Cancelled by user";
pub const NO_SEARCH_RESULTS: &str = "No recent search results available.";
pub const CONFIRM_QUESTION: &str = "Do you want to confirm this purchase? (yes/no):";

/// Newest successful web search result long enough to count as research, truncated.
///
/// Other long tool results are used only when no search result exists;
/// statement text and allocations never count as research.
pub fn latest_search_context<'a>(
    messages: impl DoubleEndedIterator<Item = &'a Message>,
    min_chars: usize,
    max_chars: usize,
) -> String {
    let candidates: Vec<&Message> = messages
        .rev()
        .filter(|m| m.role == Role::Tool && !m.is_error && m.content.chars().count() > min_chars)
        .filter(|m| !matches!(m.name.as_deref(), Some(PDF_READER_TOOL | PORTFOLIO_BUILDER_TOOL)))
        .collect();

    candidates
        .iter()
        .find(|m| m.name.as_deref() == Some(WEB_SEARCH_TOOL))
        .or_else(|| candidates.first())
        .map(|m| m.content.chars().take(max_chars).collect())
        .unwrap_or_else(|| NO_SEARCH_RESULTS.to_string())
}

fn search_query(equity: f64) -> String {
    format!(
        "best NSE listed stocks to buy today for a long term investor with a budget of {}",
        format_inr(equity)
    )
}

/// Market research as an AI tool-call turn plus its result; empty when search is unavailable.
async fn run_market_search(ctx: &NodeContext, equity: f64) -> Vec<Message> {
    if ctx.tools.get(WEB_SEARCH_TOOL).is_none() {
        debug!("No web search tool registered");
        return Vec::new();
    }

    let call = ToolCall {
        id: format!("call_{}", Uuid::new_v4().simple()),
        name: WEB_SEARCH_TOOL.to_string(),
        args: json!({ "query": search_query(equity) }),
    };

    match ctx.execute_tool(&call).await {
        Ok(output) => {
            info!(tool = %call.name, "Market research gathered");
            vec![
                Message::ai_with_tool_calls("", vec![call.clone()]),
                Message::tool(&call, output.content()),
            ]
        }
        Err(e) => {
            warn!(error = %e, "Market research unavailable, continuing without it");
            Vec::new()
        }
    }
}

async fn recommend_and_confirm(
    ctx: &NodeContext,
    state: &WorkflowState,
    equity: f64,
    update: &mut StateUpdate,
) -> Result<(Vec<String>, ExecutionDecision)> {
    update.messages.extend(run_market_search(ctx, equity).await);

    let search_content = latest_search_context(
        state.messages.iter().chain(update.messages.iter()),
        ctx.settings.min_search_context_chars,
        ctx.settings.max_search_context_chars,
    );
    debug!(chars = search_content.len(), "Search context selected");

    let system = ctx.prompts.load(PICKER_SYSTEM)?;
    let user = ctx.prompts.render(
        PICKER_USER,
        &[
            (
                "equity_amount",
                format_inr(equity).trim_start_matches('₹').to_string(),
            ),
            ("search_content", search_content),
        ],
    )?;

    let mut messages = prune_messages(&state.messages, DEFAULT_MAX_MESSAGES);
    messages.push(Message::system(system));
    messages.push(Message::human(user));

    let reply = ctx.llm.complete(ChatRequest::text(messages)).await?;
    let suggestion = reply.text().trim().to_string();
    if suggestion.is_empty() {
        return Err(AdvisorError::Llm("Empty stock recommendation".to_string()));
    }

    ctx.console.stock_recommendation(&suggestion);
    update.messages.push(Message::ai(suggestion.clone()));

    let answer = ctx.confirmation.ask(CONFIRM_QUESTION).await?;
    update
        .messages
        .push(Message::human(format!("Purchase confirmation: {}", answer.trim())));

    if is_affirmative(&answer) {
        info!(decision = %ExecutionDecision::ConfirmedByUser, "Purchase confirmed");
        ctx.console
            .success("Purchase confirmed! Handing off to the brokerage integration in the next phase.");
        Ok((vec![suggestion], ExecutionDecision::ConfirmedByUser))
    } else {
        info!(decision = %ExecutionDecision::Cancelled, "Purchase cancelled");
        ctx.console.warning("Purchase cancelled by user.");
        Ok((vec![CANCELLED_BY_USER.to_string()], ExecutionDecision::Cancelled))
    }
}

/// Picker node: always records exactly one terminal decision.
pub async fn pick_instrument(ctx: &NodeContext, state: &WorkflowState) -> StateUpdate {
    let equity_amount = state
        .portfolio
        .as_ref()
        .and_then(|p| p.get(EQUITY_LABEL))
        .unwrap_or("₹0")
        .to_string();
    let equity = parse_inr(&equity_amount);

    info!(equity, "Agent 3: Instrument Picker Started");
    ctx.console.section("Agent 3 : Instrument Picker Agent Started");

    if equity < ctx.settings.min_equity {
        warn!(equity, min_equity = ctx.settings.min_equity, "Equity too low, skipping");
        ctx.console.warning(&format!(
            "Equity too low: {} → Skipping stock picking",
            equity_amount
        ));
        return StateUpdate::new().instruments(
            vec![SKIPPED_LOW_EQUITY.to_string()],
            ExecutionDecision::Skipped,
        );
    }

    let mut update = StateUpdate::new();
    match recommend_and_confirm(ctx, state, equity, &mut update).await {
        Ok((instruments, decision)) => update.instruments(instruments, decision),
        Err(e) => {
            error!(error = %e, "Stock picker failed");
            let sentinel = format!("Stock picker failed: {}", e);
            ctx.console.warning(&sentinel);
            update.instruments(vec![sentinel], ExecutionDecision::Failed)
        }
    }
}
