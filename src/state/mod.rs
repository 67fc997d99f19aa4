//! Workflow state threaded through the pipeline
//!
//! Nodes never mutate the state they are given. Each returns a
//! [`StateUpdate`] and the orchestrator folds it in with [`WorkflowState::apply`].

pub mod reducer;

use crate::models::{ExecutionDecision, Message, Portfolio};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkflowState {
    pub messages: Vec<Message>,
    pub total_savings: Option<f64>,
    pub formatted_savings: Option<String>,
    pub user_age: Option<u32>,
    pub insured: Option<bool>,
    pub portfolio: Option<Portfolio>,
    pub investment_instruments: Option<Vec<String>>,
    pub investment_execution: Option<ExecutionDecision>,
}

/// Partial update produced by one node; `None` / empty means untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub total_savings: Option<f64>,
    pub formatted_savings: Option<String>,
    pub user_age: Option<u32>,
    pub insured: Option<bool>,
    pub portfolio: Option<Portfolio>,
    pub investment_instruments: Option<Vec<String>>,
    pub investment_execution: Option<ExecutionDecision>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn savings(mut self, total: f64, formatted: String) -> Self {
        self.total_savings = Some(total);
        self.formatted_savings = Some(formatted);
        self
    }

    pub fn portfolio(mut self, portfolio: Portfolio) -> Self {
        self.portfolio = Some(portfolio);
        self
    }

    pub fn instruments(mut self, instruments: Vec<String>, decision: ExecutionDecision) -> Self {
        self.investment_instruments = Some(instruments);
        self.investment_execution = Some(decision);
        self
    }
}

impl WorkflowState {
    /// Initial state: system + human prompt pair and the scalar inputs.
    pub fn seeded(system_prompt: String, human_prompt: String, user_age: u32, insured: bool) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::human(human_prompt)],
            user_age: Some(user_age),
            insured: Some(insured),
            ..Self::default()
        }
    }

    pub fn apply(self, update: StateUpdate) -> Self {
        Self {
            messages: reducer::append(&self.messages, update.messages),
            total_savings: reducer::replace_if_some(self.total_savings, update.total_savings),
            formatted_savings: reducer::replace_if_some(
                self.formatted_savings,
                update.formatted_savings,
            ),
            user_age: reducer::keep_first(self.user_age, update.user_age),
            insured: reducer::keep_first(self.insured, update.insured),
            portfolio: reducer::keep_first(self.portfolio, update.portfolio),
            investment_instruments: reducer::keep_first(
                self.investment_instruments,
                update.investment_instruments,
            ),
            investment_execution: reducer::keep_first(
                self.investment_execution,
                update.investment_execution,
            ),
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> WorkflowState {
        WorkflowState::seeded("system".into(), "human".into(), 30, false)
    }

    #[test]
    fn test_empty_update_is_noop() {
        let state = seeded().apply(StateUpdate::new().savings(1000.0, "₹1,000.00".into()));
        let again = state.clone().apply(StateUpdate::new());
        assert_eq!(state, again);
    }

    #[test]
    fn test_savings_replaced_scalars_kept() {
        let state = seeded()
            .apply(StateUpdate::new().savings(0.0, "₹0.00".into()))
            .apply(StateUpdate {
                total_savings: Some(45000.0),
                user_age: Some(60),
                insured: Some(true),
                ..StateUpdate::default()
            });

        assert_eq!(state.total_savings, Some(45000.0));
        assert_eq!(state.formatted_savings.as_deref(), Some("₹0.00"));
        assert_eq!(state.user_age, Some(30));
        assert_eq!(state.insured, Some(false));
    }

    #[test]
    fn test_portfolio_first_write_wins() {
        let mut first = Portfolio::new();
        first.insert("Equity (Stocks)", "₹1.00");
        let state = seeded()
            .apply(StateUpdate::new().portfolio(first.clone()))
            .apply(StateUpdate::new().portfolio(Portfolio::no_savings()));
        assert_eq!(state.portfolio, Some(first));
    }

    #[test]
    fn test_messages_append() {
        let state = seeded().apply(StateUpdate::new().message(Message::ai("hello")));
        assert_eq!(state.messages.len(), 3);
        assert_eq!(state.last_message().map(|m| m.content.as_str()), Some("hello"));
    }
}
