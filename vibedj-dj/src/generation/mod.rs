//! Generation service clients
//!
//! The query translator talks to a [`GenerationService`]; which provider sits
//! behind it is a startup decision. Clients are built once from configuration
//! and handed to the translator explicitly.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use vibedj_common::config::{GenerationConfig, GenerationProvider};

pub mod chat_completion;
pub mod gemini;

pub use chat_completion::ChatCompletionClient;
pub use gemini::GeminiClient;

const USER_AGENT: &str = concat!("vibedj/", env!("CARGO_PKG_VERSION"));

/// Generation service errors
///
/// Never surfaced to HTTP callers; the translator falls back to the raw vibe.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No API key configured for {0}")]
    MissingApiKey(GenerationProvider),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Generation request timed out")]
    Timeout,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl GenerationError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::NetworkError(err.to_string())
        }
    }
}

/// Text generation capability used by the query translator
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Provider identifier for logs (e.g. "gemini")
    fn provider_name(&self) -> &'static str;

    /// Generate text for `user_text` under `system_instruction`
    async fn generate(
        &self,
        system_instruction: &str,
        user_text: &str,
    ) -> Result<String, GenerationError>;
}

/// Build the configured generation client
///
/// Returns `Ok(None)` for `provider = "none"`.
pub fn build_generation_service(
    config: &GenerationConfig,
) -> Result<Option<Arc<dyn GenerationService>>, GenerationError> {
    if config.provider == GenerationProvider::None {
        return Ok(None);
    }

    let api_key = config
        .resolve_api_key()
        .ok_or(GenerationError::MissingApiKey(config.provider))?;

    let service: Arc<dyn GenerationService> = match config.provider {
        GenerationProvider::Gemini => Arc::new(GeminiClient::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            config.timeout(),
        )?),
        GenerationProvider::ChatCompletion => Arc::new(ChatCompletionClient::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            config.timeout(),
        )?),
        GenerationProvider::None => return Ok(None),
    };

    Ok(Some(service))
}

pub(crate) fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, GenerationError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| GenerationError::NetworkError(e.to_string()))
}

/// Map a non-success HTTP status onto a [`GenerationError`]
pub(crate) async fn status_error(response: reqwest::Response) -> GenerationError {
    let status = response.status();
    match status.as_u16() {
        401 | 403 => GenerationError::InvalidApiKey,
        429 => GenerationError::RateLimited,
        code => {
            let error_text = response.text().await.unwrap_or_default();
            GenerationError::ApiError(code, error_text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_provider_builds_nothing() {
        let config = GenerationConfig {
            provider: GenerationProvider::None,
            ..GenerationConfig::default()
        };
        assert!(build_generation_service(&config).unwrap().is_none());
    }

    #[test]
    fn test_explicit_key_builds_client() {
        let config = GenerationConfig {
            provider: GenerationProvider::ChatCompletion,
            api_key: Some("sk-test".to_string()),
            ..GenerationConfig::default()
        };
        let service = build_generation_service(&config).unwrap().unwrap();
        assert_eq!(service.provider_name(), "chat_completion");
    }
}
