//! LLM provider abstractions for critic-runtime.
//!
//! This module defines the trait the grader calls through, plus
//! implementations for Anthropic and OpenAI behind cargo features.
//!
//! Providers make exactly one HTTP request per completion. There is no
//! retry, caching, or queueing at this layer; a timeout is enforced by
//! the HTTP client from [`CompletionConfig::timeout`].
//!
//! All providers use the [`secrets`] module for credential handling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod factory;
pub mod secrets;

#[cfg(feature = "anthropic")]
mod anthropic;

#[cfg(feature = "openai")]
mod openai;

pub use factory::{ProviderFactory, ProviderRegistry};
pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicProvider, AnthropicProviderFactory};

#[cfg(feature = "openai")]
pub use openai::{OpenAiProvider, OpenAiProviderFactory};

/// Errors from LLM providers.
///
/// These are surfaced to the caller verbatim; the grader never retries.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Malformed transport response: {0}")]
    Transport(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Configuration for one completion request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Bare model name, without any provider prefix.
    pub model: String,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Temperature (0.0 for deterministic grading).
    pub temperature: f32,

    /// Request timeout, enforced by the HTTP client.
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: critic_core::DEFAULT_MODEL.to_string(),
            max_tokens: 500,
            temperature: 0.0,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A chat message for LLM completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system" or "user".
    pub role: String,

    /// Message content.
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Response from an LLM completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content.
    pub content: String,

    /// Token usage.
    pub usage: TokenUsage,

    /// Model that served the request.
    pub model: String,

    /// Stop reason, if reported.
    pub stop_reason: Option<String>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,

    /// Tokens in the completion.
    pub completion_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used.
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Provider abstraction allows swapping critic model backends.
///
/// The grader is the only caller; it issues one `complete` per
/// evaluation and treats any error as final.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a chat completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Check if the provider is usable (credential present).
    async fn health_check(&self) -> bool;

    /// Provider name for logs.
    fn name(&self) -> &str;
}
