//! Operator-facing console: progress narration and the confirmation gate

use crate::error::AdvisorError;
use crate::Result;
use async_trait::async_trait;
use std::io::{BufRead, Write};

/// Human-readable progress output on stdout.
///
/// Separate from `tracing`: this is what the operator reads, logs are for audit.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    enabled: bool,
}

impl Console {
    pub fn stdout() -> Self {
        Self { enabled: true }
    }

    pub fn silent() -> Self {
        Self { enabled: false }
    }

    fn line(&self, text: &str) {
        if self.enabled {
            println!("{}", text);
        }
    }

    pub fn banner(&self, text: &str) {
        let rule = "=".repeat(70);
        self.line(&format!("\n{}\n{:^70}\n{}\n", rule, text, rule));
    }

    pub fn section(&self, title: &str) {
        let rule = "─".repeat(25);
        self.line(&format!("\n{} {} {}", rule, title, rule));
    }

    pub fn success(&self, msg: &str) {
        self.line(&format!("✅ {}", msg));
    }

    pub fn info(&self, msg: &str) {
        self.line(&format!("ℹ️  {}", msg));
    }

    pub fn warning(&self, msg: &str) {
        self.line(&format!("⚠️  {}", msg));
    }

    pub fn plain(&self, msg: &str) {
        self.line(msg);
    }

    pub fn result_box<'a>(&self, title: &str, rows: impl IntoIterator<Item = (&'a str, &'a str)>) {
        let rule = "=".repeat(60);
        let mut out = format!("\n{}\n{:█^60}\n{}\n", rule, format!(" {} ", title), rule);
        for (key, value) in rows {
            out.push_str(&format!("   {:<24}: {}\n", key, value));
        }
        out.push_str(&rule);
        self.line(&out);
    }

    /// Print the lines of a recommendation that carry the stock details.
    pub fn stock_recommendation(&self, suggestion: &str) {
        let sparkle = "✨".repeat(30);
        let mut out = format!(
            "\n{}\n{:^60}\n{}\n",
            sparkle, "BEST STOCK RECOMMENDATION FOR YOU", sparkle
        );

        let detail_lines: Vec<&str> = suggestion
            .lines()
            .map(str::trim)
            .filter(|line| {
                ["Stock:", "Ticker:", "Price:", "Shares:", "Cost:", "Reason:"]
                    .iter()
                    .any(|key| line.contains(key))
            })
            .collect();

        // free-form answers are shown whole
        if detail_lines.is_empty() {
            for line in suggestion.lines() {
                out.push_str(&format!("   {}\n", line));
            }
        } else {
            for line in detail_lines {
                out.push_str(&format!("   {}\n", line));
            }
        }

        self.line(&out);
    }
}

/// Blocking yes/no gate in front of the (stubbed) trade
#[async_trait]
pub trait Confirmation: Send + Sync {
    /// Ask the operator and return their raw answer.
    async fn ask(&self, question: &str) -> Result<String>;
}

/// Whether an operator answer counts as a yes
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")
}

/// Reads the answer from standard input.
pub struct StdinConfirmation;

#[async_trait]
impl Confirmation for StdinConfirmation {
    async fn ask(&self, question: &str) -> Result<String> {
        let question = question.to_string();
        tokio::task::spawn_blocking(move || -> Result<String> {
            let mut stdout = std::io::stdout();
            write!(stdout, "\n{} ", question)?;
            stdout.flush()?;

            let mut answer = String::new();
            let read = std::io::stdin().lock().read_line(&mut answer)?;
            if read == 0 {
                return Err(AdvisorError::Confirmation(
                    "standard input closed before an answer was given".to_string(),
                ));
            }
            Ok(answer.trim().to_string())
        })
        .await
        .map_err(|e| AdvisorError::Confirmation(format!("confirmation prompt failed: {}", e)))?
    }
}

/// Fixed answer, for unattended runs.
pub struct PresetConfirmation {
    answer: String,
}

impl PresetConfirmation {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

#[async_trait]
impl Confirmation for PresetConfirmation {
    async fn ask(&self, _question: &str) -> Result<String> {
        Ok(self.answer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_answers() {
        assert!(is_affirmative("yes"));
        assert!(is_affirmative(" Y \n"));
        assert!(is_affirmative("YES"));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("yeah"));
        assert!(!is_affirmative(""));
    }

    #[tokio::test]
    async fn test_preset_confirmation() {
        let gate = PresetConfirmation::new("no");
        assert_eq!(gate.ask("Buy?").await.unwrap(), "no");
    }
}
