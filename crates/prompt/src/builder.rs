//! Prompt builder for the question-answering pipeline.

use crate::types::{BuiltPrompt, ContextChunk};
use handlebars::Handlebars;
use ragflow_core::{AppError, AppResult};
use serde_json::json;

/// Marker placed in the context segment when retrieval produced nothing.
/// The orchestrator still calls the model, so the system degrades to an
/// uncontextualized answer instead of erroring.
pub const NO_CONTEXT_MARKER: &str = "(no relevant context found)";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a knowledge base assistant. Read the provided \
context carefully and answer the user's question based on it.\n\n\
Requirements:\n\
- Answer only from the provided context; do not invent content\n\
- If the context does not contain the answer, state that the information \
was not found in the knowledge base\n\
- Be accurate, clear, and well organized\n\
- Quote key phrases from the context where helpful";

const DEFAULT_USER_TEMPLATE: &str = "[Knowledge base context]\n{{context}}\n\n\
[User question]\n{{question}}\n\n\
Answer the question based on the context above:";

const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Assembles the three-segment RAG prompt.
///
/// The context segment lists each retrieved chunk labeled with its source,
/// bounded by `max_context_chars`. When the budget is exceeded, the
/// lowest-ranked chunks are dropped first; the retriever's ranking is
/// authoritative.
pub struct PromptBuilder {
    system_prompt: String,
    user_template: String,
    max_context_chars: usize,
}

impl PromptBuilder {
    /// Create a builder with the default templates.
    pub fn new(max_context_chars: usize) -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_template: DEFAULT_USER_TEMPLATE.to_string(),
            max_context_chars,
        }
    }

    /// Override the system instruction.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Override the user-message template. Must reference `{{context}}`
    /// and `{{question}}`.
    pub fn with_user_template(mut self, user_template: impl Into<String>) -> Self {
        self.user_template = user_template.into();
        self
    }

    /// Build the prompt for a question and ranked context chunks.
    pub fn build(&self, question: &str, chunks: &[ContextChunk]) -> AppResult<BuiltPrompt> {
        let (context, included) = self.build_context(chunks);

        let user = self.render_user(&context, question)?;

        tracing::debug!(
            included,
            offered = chunks.len(),
            context_chars = context.chars().count(),
            "Built prompt"
        );

        Ok(BuiltPrompt {
            system: self.system_prompt.clone(),
            user,
            included,
        })
    }

    /// Assemble the labeled context segment within the character budget.
    ///
    /// Returns the segment text and the number of chunks included.
    fn build_context(&self, chunks: &[ContextChunk]) -> (String, usize) {
        if chunks.is_empty() {
            return (NO_CONTEXT_MARKER.to_string(), 0);
        }

        let mut context = String::new();
        let mut included = 0;

        for chunk in chunks {
            let block = format!("[Source: {}]\n{}", chunk.source, chunk.text);
            let added = if context.is_empty() {
                block.chars().count()
            } else {
                BLOCK_SEPARATOR.chars().count() + block.chars().count()
            };

            if context.chars().count() + added > self.max_context_chars {
                break;
            }

            if !context.is_empty() {
                context.push_str(BLOCK_SEPARATOR);
            }
            context.push_str(&block);
            included += 1;
        }

        // The top-ranked chunk alone can exceed the budget; keep a truncated
        // head rather than sending an empty context.
        if included == 0 {
            let block = format!("[Source: {}]\n{}", chunks[0].source, chunks[0].text);
            context = block.chars().take(self.max_context_chars).collect();
            included = 1;
        }

        (context, included)
    }

    fn render_user(&self, context: &str, question: &str) -> AppResult<String> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars
            .register_template_string("user", &self.user_template)
            .map_err(|e| AppError::Config(format!("Invalid user template: {}", e)))?;

        handlebars
            .render("user", &json!({ "context": context, "question": question }))
            .map_err(|e| AppError::Config(format!("Failed to render prompt: {}", e)))
    }
}
