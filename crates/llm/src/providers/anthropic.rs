//! Anthropic chat provider implementation.
//!
//! Speaks the Messages API, including tool use.
//! API reference: https://docs.anthropic.com/en/api/messages

use crate::client::{ChatClient, ChatRequest, ChatResponse, ContentBlock, Message, StopReason};
use coursemate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Messages API request format.
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool<'a>>>,
}

#[derive(Debug, Serialize)]
struct AnthropicTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a serde_json::Value,
}

/// Messages API response format.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    stop_reason: StopReason,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

/// Anthropic chat client.
pub struct AnthropicClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    /// Create a new client against the public API endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a new client with a custom base URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn to_api_request<'a>(&self, request: &'a ChatRequest) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.as_deref(),
            messages: &request.messages,
            tools: request.tools.as_ref().map(|tools| {
                tools
                    .iter()
                    .map(|t| AnthropicTool {
                        name: &t.name,
                        description: &t.description,
                        input_schema: &t.input_schema,
                    })
                    .collect()
            }),
        }
    }
}

#[async_trait::async_trait]
impl ChatClient for AnthropicClient {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::info!("Sending completion request to Anthropic");
        tracing::debug!(
            "Model: {}, messages: {}, tools: {}",
            request.model,
            request.messages.len(),
            request.tools.as_ref().map(|t| t.len()).unwrap_or(0)
        );

        let api_request = self.to_api_request(request);
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Anthropic: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let detail = serde_json::from_str::<AnthropicErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(AppError::Llm(format!(
                "Anthropic API error ({}): {}",
                status, detail
            )));
        }

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Anthropic response: {}", e)))?;

        tracing::info!(
            "Received completion from Anthropic (stop_reason: {:?})",
            api_response.stop_reason
        );

        Ok(ChatResponse {
            stop_reason: api_response.stop_reason,
            content: api_response.content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ToolSchema;

    #[test]
    fn test_client_creation() {
        let client = AnthropicClient::new("test-key");
        assert_eq!(client.provider_name(), "anthropic");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_request_serialization_with_tools() {
        let client = AnthropicClient::new("test-key");
        let request = ChatRequest::new("claude-test")
            .with_system("instructions")
            .with_message(Message::user_text("What is in lesson 1?"))
            .with_tools(vec![ToolSchema {
                name: "search_course_content".to_string(),
                description: "Search course materials".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {"query": {"type": "string"}},
                    "required": ["query"],
                }),
            }]);

        let api_request = client.to_api_request(&request);
        let json = serde_json::to_value(&api_request).unwrap();

        assert_eq!(json["model"], "claude-test");
        assert_eq!(json["system"], "instructions");
        assert_eq!(json["tools"][0]["name"], "search_course_content");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
    }

    #[test]
    fn test_request_omits_tools_when_absent() {
        let client = AnthropicClient::new("test-key");
        let request = ChatRequest::new("claude-test").with_message(Message::user_text("hi"));

        let json = serde_json::to_value(client.to_api_request(&request)).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("system").is_none());
    }

    #[test]
    fn test_response_deserialization() {
        let body = serde_json::json!({
            "stop_reason": "tool_use",
            "content": [
                {"type": "tool_use", "id": "toolu_01", "name": "search_course_content",
                 "input": {"query": "basics"}}
            ],
        });

        let response: AnthropicResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.content.len(), 1);
    }
}
