//! PDF text extraction tool

use super::{ensure_object_parameters, Tool, PDF_READER_TOOL};
use crate::error::AdvisorError;
use crate::models::{ToolInput, ToolOutput};
use crate::Result;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{info, warn};

pub struct PdfReaderTool;

fn require_pdf_path(input: &ToolInput) -> Result<PathBuf> {
    input
        .parameters
        .get("pdf_path")
        .and_then(|v| v.as_str())
        .or_else(|| input.parameters.get("path").and_then(|v| v.as_str()))
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| {
            AdvisorError::InvalidToolInput("Expected 'pdf_path' in tool_input".to_string())
        })
}

#[async_trait::async_trait]
impl Tool for PdfReaderTool {
    fn name(&self) -> &'static str {
        PDF_READER_TOOL
    }

    fn description(&self) -> &'static str {
        "Read a PDF file and return its extracted text."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pdf_path": {"type": "string", "description": "Path to the bank statement PDF"}
            },
            "required": ["pdf_path"]
        })
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        let path = require_pdf_path(input)?;

        if !path.exists() {
            warn!(path = %path.display(), "PDF does not exist");
            return Err(AdvisorError::InvalidToolInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        info!(path = %path.display(), "Reading PDF");

        let target = path.clone();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&target))
            .await
            .map_err(|e| AdvisorError::Tool(format!("PDF extraction task failed: {}", e)))?
            .map_err(|e| {
                AdvisorError::Tool(format!("Error reading PDF {}: {}", path.display(), e))
            })?;

        info!(path = %path.display(), chars = text.len(), "Extracted PDF content");

        Ok(ToolOutput {
            success: true,
            data: Value::String(text),
            error: None,
        })
    }
}
