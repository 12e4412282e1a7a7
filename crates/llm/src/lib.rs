//! LLM transport crate for Coursemate.
//!
//! This crate provides a provider-agnostic abstraction for chat completions
//! with tool use. The agent orchestrator depends only on the `ChatClient`
//! trait, so providers (and test doubles) are interchangeable.
//!
//! # Providers
//! - **Anthropic**: Messages API (default)
//! - **Ollama**: Local LLM runtime via `/api/chat`
//!
//! # Example
//! ```no_run
//! use coursemate_llm::{ChatClient, ChatRequest, Message, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = ChatRequest::new("llama3.2")
//!     .with_message(Message::user_text("Hello, world!"));
//! let response = client.complete(&request).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{
    ChatClient, ChatRequest, ChatResponse, ContentBlock, Message, Role, StopReason, ToolSchema,
};
pub use factory::create_client;
pub use providers::{AnthropicClient, OllamaClient};
