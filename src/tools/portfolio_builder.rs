//! Portfolio builder tool and the "100 - age" allocation rule
//!
//! The same [`AllocationPlan`] backs both the model-invoked tool and the
//! allocator's rule-based fallback.

use super::{ensure_object_parameters, Tool, PORTFOLIO_BUILDER_TOOL};
use crate::currency::{format_inr, safe_float_value};
use crate::error::AdvisorError;
use crate::models::{
    Portfolio, ToolInput, ToolOutput, BOND_LABEL, EMERGENCY_LABEL, EQUITY_LABEL, INSURANCE_LABEL,
};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const MIN_EQUITY_PCT: f64 = 10.0;
pub const MAX_EQUITY_PCT: f64 = 90.0;
pub const EMERGENCY_FUND_PCT: f64 = 10.0;
pub const INSURANCE_PCT: f64 = 10.0;
pub const DEFAULT_AGE: u32 = 35;

/// Equity share before set-asides: `100 - age`, clamped to [10, 90].
pub fn equity_rule_pct(age: u32) -> f64 {
    (100.0 - age as f64).clamp(MIN_EQUITY_PCT, MAX_EQUITY_PCT)
}

/// Percentages of savings per asset class; always sums to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub equity_pct: f64,
    pub bond_pct: f64,
    pub emergency_pct: f64,
    pub insurance_pct: f64,
}

impl AllocationPlan {
    pub fn for_profile(age: u32, insured: bool) -> Self {
        let equity_rule = equity_rule_pct(age);
        let bond_rule = 100.0 - equity_rule;
        let insurance_pct = if insured { 0.0 } else { INSURANCE_PCT };

        // equity/bond split the share left after the set-asides
        let investable = 100.0 - EMERGENCY_FUND_PCT - insurance_pct;

        Self {
            equity_pct: equity_rule * investable / 100.0,
            bond_pct: bond_rule * investable / 100.0,
            emergency_pct: EMERGENCY_FUND_PCT,
            insurance_pct,
        }
    }

    pub fn total_pct(&self) -> f64 {
        self.equity_pct + self.bond_pct + self.emergency_pct + self.insurance_pct
    }

    pub fn to_portfolio(&self, total_savings: f64) -> Portfolio {
        let amount = |pct: f64| format_inr(total_savings * pct / 100.0);

        let mut portfolio = Portfolio::new();
        portfolio.insert(EQUITY_LABEL, amount(self.equity_pct));
        portfolio.insert(BOND_LABEL, amount(self.bond_pct));
        portfolio.insert(EMERGENCY_LABEL, amount(self.emergency_pct));
        if self.insurance_pct > 0.0 {
            portfolio.insert(INSURANCE_LABEL, amount(self.insurance_pct));
        }
        portfolio
    }
}

/// Rule-based allocation used when the model path fails.
///
/// Never divides by savings; non-positive savings yield the sentinel.
pub fn fallback_portfolio(total_savings: f64, user_age: u32, insured: bool) -> Portfolio {
    if !(total_savings > 0.0) {
        return Portfolio::no_savings();
    }
    AllocationPlan::for_profile(user_age, insured).to_portfolio(total_savings)
}

/// Tool arguments after coercing whatever types the model sent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioArgs {
    pub total_savings: f64,
    pub user_age: u32,
    pub insured: bool,
}

impl PortfolioArgs {
    pub fn from_value(args: &Value) -> Self {
        let total_savings = safe_float_value(&args["total_savings"], 0.0);
        let age = safe_float_value(&args["user_age"], DEFAULT_AGE as f64);
        let insured = match &args["insured"] {
            Value::Bool(b) => *b,
            Value::String(s) => s == "true" || s == "True",
            _ => false,
        };

        Self {
            total_savings,
            user_age: age.clamp(0.0, 150.0) as u32,
            insured,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "total_savings": self.total_savings,
            "user_age": self.user_age,
            "insured": self.insured,
        })
    }
}

pub struct PortfolioBuilderTool;

#[async_trait::async_trait]
impl Tool for PortfolioBuilderTool {
    fn name(&self) -> &'static str {
        PORTFOLIO_BUILDER_TOOL
    }

    fn description(&self) -> &'static str {
        "Build an investment portfolio using the '100 - age' rule and adjust for insurance."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "total_savings": {"type": "number", "description": "Savings available to invest"},
                "user_age": {"type": "integer", "description": "Age of the investor in years"},
                "insured": {"type": "boolean", "description": "Whether the investor already holds insurance"}
            },
            "required": ["total_savings", "user_age", "insured"]
        })
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        let args = PortfolioArgs::from_value(&input.parameters);

        if !(args.total_savings > 0.0) {
            return Err(AdvisorError::InvalidToolInput(
                "No savings to invest.".to_string(),
            ));
        }

        let portfolio =
            AllocationPlan::for_profile(args.user_age, args.insured).to_portfolio(args.total_savings);

        Ok(ToolOutput {
            success: true,
            data: portfolio.to_json(),
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::parse_inr;

    #[test]
    fn test_equity_clamped_for_all_ages() {
        for age in 0..=100 {
            let rule = equity_rule_pct(age);
            assert!((MIN_EQUITY_PCT..=MAX_EQUITY_PCT).contains(&rule), "age {}", age);

            for insured in [true, false] {
                let plan = AllocationPlan::for_profile(age, insured);
                assert!((plan.total_pct() - 100.0).abs() < 1e-9, "age {}", age);
            }
        }
        assert_eq!(equity_rule_pct(5), 90.0);
        assert_eq!(equity_rule_pct(95), 10.0);
    }

    #[test]
    fn test_uninsured_thirty_year_old() {
        assert_eq!(equity_rule_pct(30), 70.0);

        let plan = AllocationPlan::for_profile(30, false);
        assert_eq!(plan.insurance_pct, 10.0);
        assert_eq!(plan.emergency_pct, 10.0);

        let portfolio = fallback_portfolio(120000.0, 30, false);
        assert_eq!(portfolio.get(EQUITY_LABEL), Some("₹67,200.00"));
        assert_eq!(portfolio.get(BOND_LABEL), Some("₹28,800.00"));
        assert_eq!(portfolio.get(EMERGENCY_LABEL), Some("₹12,000.00"));
        assert_eq!(portfolio.get(INSURANCE_LABEL), Some("₹12,000.00"));

        let total: f64 = portfolio.iter().map(|(_, v)| parse_inr(v)).sum();
        assert!((total - 120000.0).abs() < 0.05);
    }

    #[test]
    fn test_insured_has_no_insurance_line() {
        let portfolio = fallback_portfolio(100000.0, 40, true);
        assert_eq!(portfolio.get(INSURANCE_LABEL), None);
        assert_eq!(portfolio.get(EQUITY_LABEL), Some("₹54,000.00"));
    }

    #[test]
    fn test_non_positive_savings_sentinel() {
        for savings in [0.0, -5000.0, f64::NAN] {
            assert_eq!(fallback_portfolio(savings, 30, false), Portfolio::no_savings());
        }
    }

    #[test]
    fn test_args_coercion() {
        let args = PortfolioArgs::from_value(&json!({
            "total_savings": "120000",
            "user_age": "30",
            "insured": "True"
        }));
        assert_eq!(
            args,
            PortfolioArgs {
                total_savings: 120000.0,
                user_age: 30,
                insured: true
            }
        );

        let defaults = PortfolioArgs::from_value(&json!({}));
        assert_eq!(defaults.user_age, DEFAULT_AGE);
        assert!(!defaults.insured);
    }

    #[tokio::test]
    async fn test_tool_rejects_zero_savings() {
        let input = ToolInput {
            tool_name: PORTFOLIO_BUILDER_TOOL.to_string(),
            parameters: json!({"total_savings": 0, "user_age": 30, "insured": false}),
        };
        let err = PortfolioBuilderTool.execute(&input).await.unwrap_err();
        assert!(matches!(err, AdvisorError::InvalidToolInput(_)));
    }
}
