//! Chat provider factory.
//!
//! This module creates chat clients from application configuration. It
//! handles provider resolution and secret injection.

use crate::client::ChatClient;
use crate::providers::{AnthropicClient, OllamaClient};
use coursemate_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a chat client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("anthropic", "claude", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (for providers that require it)
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// secret is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn ChatClient>> {
    match provider.to_lowercase().as_str() {
        "anthropic" | "claude" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("Anthropic provider requires API key".to_string())
            })?;
            let client = match endpoint {
                Some(url) => AnthropicClient::with_base_url(api_key, url),
                None => AnthropicClient::new(api_key),
            };
            Ok(Arc::new(client))
        }
        "ollama" => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            Ok(Arc::new(OllamaClient::with_base_url(base_url)))
        }
        _ => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_anthropic_client() {
        let client = create_client("anthropic", None, Some("test-key"));
        assert!(client.is_ok());
        assert_eq!(client.unwrap().provider_name(), "anthropic");
    }

    #[test]
    fn test_claude_alias() {
        let client = create_client("claude", None, Some("test-key"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_anthropic_requires_api_key() {
        match create_client("anthropic", None, None) {
            Err(err) => assert!(err.to_string().contains("requires API key")),
            Ok(_) => panic!("Expected error for Anthropic without API key"),
        }
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client("ollama", Some("http://localhost:8080"), None);
        assert!(client.is_ok());
        assert_eq!(client.unwrap().provider_name(), "ollama");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
