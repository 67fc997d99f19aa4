//! Runtime configuration from the environment (and `.env`)

use crate::error::AdvisorError;
use crate::gemini::DEFAULT_MODEL;
use crate::Result;
use std::path::PathBuf;

pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub temperature: f32,
    /// Web search is skipped when unset
    pub tavily_api_key: Option<String>,
    pub prompts_dir: Option<PathBuf>,
    pub log_dir: PathBuf,
}

impl AdvisorConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini_api_key = get("GEMINI_API_KEY")
            .ok_or_else(|| AdvisorError::Config("GEMINI_API_KEY not found".to_string()))?;

        let temperature = match get("GEMINI_TEMPERATURE") {
            Some(raw) => raw.parse::<f32>().map_err(|_| {
                AdvisorError::Config(format!("GEMINI_TEMPERATURE is not a number: {}", raw))
            })?,
            None => DEFAULT_TEMPERATURE,
        };

        Ok(Self {
            gemini_api_key,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature,
            tavily_api_key: get("TAVILY_API_KEY"),
            prompts_dir: get("PROMPTS_DIR").map(PathBuf::from),
            log_dir: get("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
        })
    }
}
