//! Question answering over the knowledge base.
//!
//! Ties retrieval, prompt assembly, and generation together. The answer's
//! cited sources are exactly the retrieval results whose text made it into
//! the prompt, in rank order; candidates dropped by the context budget are
//! never cited.

use crate::retriever::Retriever;
use crate::types::Answer;
use ragflow_core::AppResult;
use ragflow_llm::{ChatRequest, GenerativeModel};
use ragflow_prompt::{ContextChunk, PromptBuilder};
use std::sync::Arc;
use tracing::info;

pub struct AnswerOrchestrator {
    retriever: Retriever,
    prompts: PromptBuilder,
    model: Arc<dyn GenerativeModel>,
    model_name: String,
    default_top_k: usize,
    temperature: f32,
    max_tokens: u32,
}

impl AnswerOrchestrator {
    pub fn new(
        retriever: Retriever,
        prompts: PromptBuilder,
        model: Arc<dyn GenerativeModel>,
        model_name: impl Into<String>,
        default_top_k: usize,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            retriever,
            prompts,
            model,
            model_name: model_name.into(),
            default_top_k: default_top_k.max(1),
            temperature,
            max_tokens,
        }
    }

    /// Answer a question from the knowledge base.
    ///
    /// `top_k` overrides the configured retrieval depth for this call.
    /// Empty retrieval still produces an answer; the model is told no
    /// context was found and degrades accordingly.
    pub async fn ask(&self, question: &str, top_k: Option<usize>) -> AppResult<Answer> {
        let top_k = top_k.unwrap_or(self.default_top_k);
        let results = self.retriever.retrieve(question, top_k).await?;

        let chunks: Vec<ContextChunk> = results
            .iter()
            .map(|r| {
                ContextChunk::new(
                    format!("{} #{}", r.file_name, r.sequence_index),
                    r.text.clone(),
                )
            })
            .collect();

        let prompt = self.prompts.build(question, &chunks)?;

        let request = ChatRequest::new(prompt.user, self.model_name.clone())
            .with_system(prompt.system)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self.model.complete(&request).await?;

        info!(
            provider = self.model.provider_name(),
            model = %response.model,
            sources = prompt.included,
            total_tokens = response.usage.total_tokens,
            "Answer generated"
        );

        // Cite only the rank prefix that fit into the prompt.
        let sources = results.into_iter().take(prompt.included).collect();

        Ok(Answer {
            text: response.content,
            sources,
            model: response.model,
            usage: response.usage,
        })
    }
}
