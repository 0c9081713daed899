//! Concrete generative-model provider implementations.

pub mod deepseek;
pub mod mock;

pub use deepseek::DeepSeekClient;
pub use mock::MockClient;
