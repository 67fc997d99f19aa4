//! Prompt templates
//!
//! Templates are read from an optional prompts directory and fall back to
//! the copies compiled into the binary.

use crate::error::AdvisorError;
use crate::Result;
use std::path::PathBuf;
use tracing::debug;

pub const ANALYZER_SYSTEM: &str = "system_prompt_transaction_analyzer.txt";
pub const ANALYZER_USER: &str = "user_prompt_transaction_analyzer.txt";
pub const ALLOCATOR_SYSTEM: &str = "system_prompt_portfolio_builder.txt";
pub const ALLOCATOR_USER: &str = "user_prompt_portfolio_builder.txt";
pub const PICKER_SYSTEM: &str = "system_prompt_inst_picker.txt";
pub const PICKER_USER: &str = "user_prompt_inst_picker.txt";

const BUILTIN: &[(&str, &str)] = &[
    (ANALYZER_SYSTEM, include_str!("../prompts/system_prompt_transaction_analyzer.txt")),
    (ANALYZER_USER, include_str!("../prompts/user_prompt_transaction_analyzer.txt")),
    (ALLOCATOR_SYSTEM, include_str!("../prompts/system_prompt_portfolio_builder.txt")),
    (ALLOCATOR_USER, include_str!("../prompts/user_prompt_portfolio_builder.txt")),
    (PICKER_SYSTEM, include_str!("../prompts/system_prompt_inst_picker.txt")),
    (PICKER_USER, include_str!("../prompts/user_prompt_inst_picker.txt")),
];

#[derive(Debug, Clone, Default)]
pub struct PromptLoader {
    dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Built-in templates only
    pub fn builtin() -> Self {
        Self { dir: None }
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn load(&self, name: &str) -> Result<String> {
        if let Some(dir) = &self.dir {
            let path = dir.join(name);
            if path.is_file() {
                debug!(path = %path.display(), "Loading prompt override");
                return Ok(std::fs::read_to_string(&path)?.trim().to_string());
            }
        }

        BUILTIN
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(_, text)| text.trim().to_string())
            .ok_or_else(|| AdvisorError::Prompt(format!("Unknown prompt template: {}", name)))
    }

    /// Load a template and fill its `{placeholders}`.
    pub fn render(&self, name: &str, vars: &[(&str, String)]) -> Result<String> {
        Ok(render(&self.load(name)?, vars))
    }
}

pub fn render(template: &str, vars: &[(&str, String)]) -> String {
    vars.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{}}}", key), value)
    })
}
