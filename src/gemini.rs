//! Gemini API client
//!
//! Implements [`ChatModel`] on top of `generateContent` with function calling.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::AdvisorError;
use crate::llm::{ChatModel, ChatRequest, ToolChoice};
use crate::models::{Message, ModelReply, Role, ToolCall, ToolSpec};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, temperature: f32) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            temperature,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_request(&self, request: &ChatRequest) -> GeminiRequest {
        let (system_instruction, contents) = split_messages(&request.messages);

        let offer_tools = !request.tools.is_empty() && request.tool_choice != ToolChoice::None;

        let tools = if offer_tools {
            vec![GeminiTool {
                function_declarations: request.tools.iter().map(FunctionDeclaration::from).collect(),
            }]
        } else {
            Vec::new()
        };

        let tool_config = offer_tools.then(|| ToolConfig {
            function_calling_config: match &request.tool_choice {
                ToolChoice::Required(name) => FunctionCallingConfig {
                    mode: "ANY",
                    allowed_function_names: vec![name.clone()],
                },
                _ => FunctionCallingConfig {
                    mode: "AUTO",
                    allowed_function_names: Vec::new(),
                },
            },
        });

        GeminiRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: self.temperature,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 2048,
            },
            system_instruction,
            tools,
            tool_config,
        }
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: ChatRequest) -> crate::Result<ModelReply> {
        if self.api_key.is_empty() {
            return Err(AdvisorError::Config("GEMINI_API_KEY not configured".to_string()));
        }

        let body = self.build_request(&request);

        info!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Calling Gemini API"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!("Gemini API request failed: {}", e);
                AdvisorError::Llm(format!("Gemini API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(AdvisorError::Llm(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to parse Gemini response: {}", e);
            AdvisorError::Llm(format!("Gemini parse error: {}", e))
        })?;

        if let Some(usage) = &gemini_response.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "Gemini usage"
            );
        }

        into_reply(gemini_response)
    }
}

/// System turns become the system instruction; the rest become `contents`.
fn split_messages(messages: &[Message]) -> (Option<SystemInstruction>, Vec<Content>) {
    let mut system_parts = Vec::new();
    let mut contents = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg.role {
            Role::System => system_parts.push(Part::text(&msg.content)),
            Role::Human => contents.push(Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(&msg.content)],
            }),
            Role::Ai => {
                let mut parts = Vec::with_capacity(msg.tool_calls.len() + 1);
                if !msg.content.is_empty() {
                    parts.push(Part::text(&msg.content));
                }
                for call in &msg.tool_calls {
                    parts.push(Part {
                        function_call: Some(FunctionCall {
                            id: None,
                            name: call.name.clone(),
                            args: call.args.clone(),
                        }),
                        ..Part::default()
                    });
                }
                if !parts.is_empty() {
                    contents.push(Content {
                        role: Some("model".to_string()),
                        parts,
                    });
                }
            }
            Role::Tool => contents.push(Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    function_response: Some(FunctionResponse {
                        name: msg.name.clone().unwrap_or_else(|| "tool".to_string()),
                        response: json!({ "content": msg.content }),
                    }),
                    ..Part::default()
                }],
            }),
        }
    }

    let system_instruction = (!system_parts.is_empty()).then_some(SystemInstruction {
        parts: system_parts,
    });

    (system_instruction, contents)
}

fn into_reply(response: GeminiResponse) -> crate::Result<ModelReply> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AdvisorError::Llm("No response from Gemini API".to_string()))?;

    debug!(finish_reason = ?candidate.finish_reason, "Gemini candidate received");

    let mut text = String::new();
    let mut calls = Vec::new();

    for part in candidate.content.parts {
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(fc) = part.function_call {
            calls.push(ToolCall {
                id: fc
                    .id
                    .unwrap_or_else(|| format!("call_{}", Uuid::new_v4().simple())),
                name: fc.name,
                args: fc.args,
            });
        }
    }

    if !calls.is_empty() {
        return Ok(ModelReply::ToolCallRequest {
            content: text,
            calls,
        });
    }

    if text.trim().is_empty() {
        return Err(AdvisorError::Llm("Empty response from Gemini".to_string()));
    }

    Ok(ModelReply::Text(text))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<ToolConfig>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

impl From<&ToolSpec> for FunctionDeclaration {
    fn from(spec: &ToolSpec) -> Self {
        Self {
            name: spec.name.clone(),
            description: spec.description.clone(),
            parameters: spec.parameters.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolConfig {
    function_calling_config: FunctionCallingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionCallingConfig {
    mode: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    allowed_function_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: i32,
    #[serde(default)]
    candidates_token_count: i32,
}
