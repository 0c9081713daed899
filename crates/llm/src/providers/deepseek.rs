//! DeepSeek provider.
//!
//! Speaks the OpenAI-compatible chat-completions API. Requests carry the
//! system instruction and user prompt as separate messages; the response's
//! first choice is the answer.

use crate::client::{ChatRequest, ChatResponse, GenerativeModel, TokenUsage};
use async_trait::async_trait;
use ragflow_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.deepseek.com/v1";
const CHAT_ENDPOINT: &str = "/chat/completions";

/// DeepSeek chat-completions client.
pub struct DeepSeekClient {
    client: Client,
    api_base: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    model: String,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl DeepSeekClient {
    /// Create a client with the default API base.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        Self::with_api_base(DEFAULT_API_BASE, api_key, timeout)
    }

    /// Create a client against a custom endpoint (e.g., a gateway).
    pub fn with_api_base(
        api_base: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Generation(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl GenerativeModel for DeepSeekClient {
    fn provider_name(&self) -> &str {
        "deepseek"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        let url = format!("{}{}", self.api_base, CHAT_ENDPOINT);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ApiMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ApiMessage {
            role: "user",
            content: &request.prompt,
        });

        let payload = ApiRequest {
            model: &request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(model = %request.model, "Sending completion request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Generation(format!("DeepSeek request timed out: {}", e))
                } else {
                    AppError::Generation(format!("Failed to reach DeepSeek: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(AppError::Generation(format!(
                "DeepSeek API error ({}): {}",
                status, body
            )));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse DeepSeek response: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::Generation("DeepSeek returned no choices".to_string()))?;

        let usage = body
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(ChatResponse {
            content,
            model: body.model,
            usage,
        })
    }
}
