//! # critic-runtime
//!
//! LLM provider layer and grader runtime for Critic.
//!
//! This crate owns the single outbound call per evaluation: it resolves
//! a model identifier to a provider, sends the grading prompt built by
//! `critic-core`, and turns the reply into a [`Verdict`] via the core
//! parser. It never retries, caches, or queues; errors surface to the
//! caller verbatim.
//!
//! ## Example
//!
//! ```rust,ignore
//! use critic_core::CriticConfig;
//! use critic_runtime::{Critic, providers::ProviderRegistry};
//!
//! let config = CriticConfig::builder()
//!     .metric("informative", "Captures the main points.", 75.0)
//!     .max_score(100.0)
//!     .model("anthropic/claude-sonnet-4-5")
//!     .build()?;
//!
//! let registry = ProviderRegistry::with_defaults();
//! let critic = Critic::from_registry(config, &registry, &serde_json::json!({}))?;
//!
//! let verdict = critic.evaluate("The order shipped yesterday.", &Default::default()).await?;
//! if !verdict.passed {
//!     eprintln!("{}", verdict.failure_message());
//! }
//! ```

use thiserror::Error;

mod critic;
pub mod providers;

pub use critic::{Critic, Metadata, Validate};
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    ProviderRegistry, TokenUsage,
};

// Re-export the core types callers need alongside the grader.
pub use critic_core::{
    ConfigError, CriticConfig, MetricSpec, OnFail, ParseError, ValidationOutcome, Verdict,
};

/// Errors from a grading call.
///
/// A failing verdict is not an error; it comes back as
/// `Verdict { passed: false, .. }`.
#[derive(Error, Debug)]
pub enum CriticError {
    #[error("Input text cannot be empty")]
    EmptyInput,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
