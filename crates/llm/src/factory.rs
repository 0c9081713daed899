//! Generative-model provider factory.
//!
//! Resolves a provider name from configuration to a concrete client. New
//! providers register here; callers only ever hold `Arc<dyn GenerativeModel>`.

use crate::client::GenerativeModel;
use crate::providers::{DeepSeekClient, MockClient};
use ragflow_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create a generative-model client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("deepseek", "mock")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key for providers that require one
/// * `timeout` - Upper bound for a single completion call
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn GenerativeModel>> {
    match provider.to_lowercase().as_str() {
        "deepseek" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("DeepSeek provider requires an API key".to_string())
            })?;
            let client = match endpoint {
                Some(base) => DeepSeekClient::with_api_base(base, api_key, timeout)?,
                None => DeepSeekClient::new(api_key, timeout)?,
            };
            Ok(Arc::new(client))
        }
        "mock" => Ok(Arc::new(MockClient::default())),
        _ => Err(AppError::Config(format!(
            "Unknown generation provider: '{}'. Supported providers: deepseek, mock",
            provider
        ))),
    }
}
