//! Pipeline orchestrator
//!
//! ANALYZER ⇄ ANALYZER_TOOLS → PORTFOLIO_LLM → PORTFOLIO_TOOLS → INSTRUMENT_PICKER → END
//!
//! Nodes run one at a time; each update is folded into the state before
//! routing picks the next node.

use crate::audit::{NodeTiming, RunReport};
use crate::error::AdvisorError;
use crate::nodes::{instrument_picker, portfolio_allocator, transaction_analyzer, NodeContext};
use crate::state::{StateUpdate, WorkflowState};
use crate::Result;
use chrono::Utc;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Upper bound on node executions per run
pub const MAX_STEPS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Node {
    Analyzer,
    AnalyzerTools,
    PortfolioLlm,
    PortfolioTools,
    InstrumentPicker,
}

impl Node {
    pub fn name(&self) -> &'static str {
        match self {
            Node::Analyzer => "transaction_analyzer",
            Node::AnalyzerTools => "transaction_analyzer_tools",
            Node::PortfolioLlm => "portfolio_llm",
            Node::PortfolioTools => "portfolio_tools",
            Node::InstrumentPicker => "instrument_picker",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Next(Node),
    End,
}

/// Decide where to go after `node` has run and its update has been applied.
pub fn route_after(node: Node, state: &WorkflowState) -> Route {
    match node {
        Node::Analyzer => {
            let wants_tools = state
                .last_message()
                .is_some_and(|m| m.has_tool_calls());
            if wants_tools {
                Route::Next(Node::AnalyzerTools)
            } else {
                Route::Next(Node::PortfolioLlm)
            }
        }
        Node::AnalyzerTools => Route::Next(Node::Analyzer),
        Node::PortfolioLlm => Route::Next(Node::PortfolioTools),
        Node::PortfolioTools => Route::Next(Node::InstrumentPicker),
        Node::InstrumentPicker => Route::End,
    }
}

pub struct Orchestrator {
    ctx: NodeContext,
    max_steps: usize,
}

impl Orchestrator {
    pub fn new(ctx: NodeContext) -> Self {
        Self {
            ctx,
            max_steps: MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    async fn execute(&self, node: Node, state: &WorkflowState) -> StateUpdate {
        let ctx = &self.ctx;
        match node {
            Node::Analyzer => transaction_analyzer::analyze_transactions(ctx, state).await,
            Node::AnalyzerTools => transaction_analyzer::run_analyzer_tools(ctx, state).await,
            Node::PortfolioLlm => portfolio_allocator::plan_portfolio(ctx, state).await,
            Node::PortfolioTools => portfolio_allocator::build_portfolio(ctx, state).await,
            Node::InstrumentPicker => instrument_picker::pick_instrument(ctx, state).await,
        }
    }

    /// Drive the pipeline from `initial` to the terminal node.
    pub async fn run(&self, initial: WorkflowState) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id, model = self.ctx.llm.model_name());

        async move {
            let started_at = Utc::now();
            let mut state = initial;
            let mut timings = Vec::new();
            let mut node = Node::Analyzer;

            info!("Pipeline run started");

            loop {
                if timings.len() >= self.max_steps {
                    return Err(AdvisorError::MaxStepsExceeded(format!(
                        "Exceeded {} node executions",
                        self.max_steps
                    )));
                }

                let start = Instant::now();
                let update = self
                    .execute(node, &state)
                    .instrument(info_span!("node", node = node.name()))
                    .await;
                state = state.apply(update);

                let duration_ms = start.elapsed().as_millis() as u64;
                info!(node = node.name(), duration_ms, %run_id, "Node completed");
                timings.push(NodeTiming {
                    node: node.name().to_string(),
                    duration_ms,
                });

                match route_after(node, &state) {
                    Route::Next(next) => {
                        debug!(from = node.name(), to = next.name(), "Routing");
                        node = next;
                    }
                    Route::End => break,
                }
            }

            let report = RunReport::new(run_id, started_at, timings, state);
            info!(
                steps = report.timings.len(),
                decision = ?report.decision(),
                state_digest = %report.state_digest,
                "Pipeline run finished"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }
}
