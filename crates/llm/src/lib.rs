//! Generative-model provider abstraction.
//!
//! Defines the client contract used by the answer orchestrator, the
//! request/response types, and a factory that resolves a provider name to a
//! concrete client. Swapping providers must not change pipeline behavior
//! beyond answer content.

pub mod client;
pub mod factory;
pub mod providers;

pub use client::{ChatRequest, ChatResponse, GenerativeModel, TokenUsage};
pub use factory::create_client;
