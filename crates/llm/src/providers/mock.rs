//! Mock generative-model provider for tests and offline development.

use crate::client::{ChatRequest, ChatResponse, GenerativeModel, TokenUsage};
use async_trait::async_trait;
use ragflow_core::AppResult;
use std::sync::Mutex;

/// Deterministic provider that returns a canned reply.
///
/// Records the last request so tests can assert on the prompt the
/// orchestrator actually built.
pub struct MockClient {
    reply: String,
    last_request: Mutex<Option<ChatRequest>>,
}

impl MockClient {
    /// Create a mock that answers every request with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            last_request: Mutex::new(None),
        }
    }

    /// The most recent request seen by this client, if any.
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().ok().and_then(|g| g.clone())
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new("This is a mock answer.")
    }
}

#[async_trait]
impl GenerativeModel for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(request.clone());
        }

        // Rough token estimate keeps usage fields non-trivial in tests.
        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (self.reply.len() / 4) as u32;

        Ok(ChatResponse {
            content: self.reply.clone(),
            model: request.model.clone(),
            usage: TokenUsage::new(prompt_tokens, completion_tokens),
        })
    }
}
