//! The Critic grader.
//!
//! Wires the deterministic pieces from critic-core around a single
//! provider call: build prompt, complete, parse, judge. Stateless
//! across calls; the config is read-only, so one `Critic` can serve
//! concurrent evaluations.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value as JsonValue};

use critic_core::{build_prompt, parse_scores, CriticConfig, ValidationOutcome, Verdict};

use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderRegistry};
use crate::CriticError;

/// Open key-value bag reserved for the hosting framework's bookkeeping.
/// Not interpreted by the grader.
pub type Metadata = JsonMap<String, JsonValue>;

/// Validator seam for hosting frameworks.
///
/// A failing verdict maps to [`ValidationOutcome::Fail`]; applying the
/// configured failure policy to it is the caller's job.
#[async_trait]
pub trait Validate: Send + Sync {
    /// Validate a value, returning pass/fail plus the failure message.
    async fn validate(
        &self,
        value: &str,
        metadata: &Metadata,
    ) -> Result<ValidationOutcome, CriticError>;
}

/// Grades a response by asking a critic model to score it per metric.
pub struct Critic {
    config: CriticConfig,
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
}

impl Critic {
    /// Create a grader on an explicit provider.
    ///
    /// If the configured model carries this provider's prefix
    /// (`anthropic/claude-...`), the prefix is stripped before the
    /// wire call.
    pub fn new(config: CriticConfig, provider: Arc<dyn LlmProvider>) -> Self {
        let model = config
            .model()
            .strip_prefix(&format!("{}/", provider.name()))
            .unwrap_or(config.model())
            .to_string();

        let completion = CompletionConfig {
            model,
            ..CompletionConfig::default()
        };

        Self {
            config,
            provider,
            completion,
        }
    }

    /// Create a grader by resolving the configured model identifier
    /// through a provider registry.
    pub fn from_registry(
        config: CriticConfig,
        registry: &ProviderRegistry,
        provider_config: &JsonValue,
    ) -> Result<Self, CriticError> {
        let (provider, model) = registry.resolve(config.model(), provider_config)?;

        let completion = CompletionConfig {
            model,
            ..CompletionConfig::default()
        };

        Ok(Self {
            config,
            provider,
            completion,
        })
    }

    /// Override the completion settings (timeout, max tokens, temperature).
    ///
    /// The model name stays as resolved at construction.
    pub fn with_completion(mut self, completion: CompletionConfig) -> Self {
        self.completion = CompletionConfig {
            model: self.completion.model,
            ..completion
        };
        self
    }

    /// The immutable grading configuration.
    pub fn config(&self) -> &CriticConfig {
        &self.config
    }

    /// Grade one response.
    ///
    /// Exactly one provider call per invocation; provider and parse
    /// errors surface verbatim, never as an implicit verdict.
    pub async fn evaluate(&self, text: &str, metadata: &Metadata) -> Result<Verdict, CriticError> {
        // Reserved for the hosting framework.
        let _ = metadata;

        if text.trim().is_empty() {
            return Err(CriticError::EmptyInput);
        }

        let prompt = build_prompt(text, &self.config);
        tracing::debug!(
            provider = self.provider.name(),
            model = %self.completion.model,
            metrics = self.config.metrics().len(),
            "requesting evaluation"
        );

        let response = self
            .provider
            .complete(vec![ChatMessage::user(prompt)], &self.completion)
            .await?;

        tracing::debug!(tokens = response.usage.total(), "received evaluation");

        let scores = parse_scores(&response.content, &self.config)?;
        let verdict = Verdict::judge(&self.config, &scores);

        tracing::info!(
            passed = verdict.passed,
            failed = ?verdict.failed_metrics,
            "graded response"
        );

        Ok(verdict)
    }
}

#[async_trait]
impl Validate for Critic {
    async fn validate(
        &self,
        value: &str,
        metadata: &Metadata,
    ) -> Result<ValidationOutcome, CriticError> {
        let verdict = self.evaluate(value, metadata).await?;
        Ok(ValidationOutcome::from(&verdict))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CompletionResponse, ProviderError, TokenUsage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock provider returning a fixed completion, counting calls.
    struct MockProvider {
        content: Result<String, &'static str>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn returning(content: &str) -> Arc<Self> {
            Arc::new(Self {
                content: Ok(content.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(message: &'static str) -> Arc<Self> {
            Arc::new(Self {
                content: Err(message),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.content {
                Ok(content) => Ok(CompletionResponse {
                    content: content.clone(),
                    usage: TokenUsage::default(),
                    model: config.model.clone(),
                    stop_reason: Some("stop".to_string()),
                }),
                Err(message) => Err(ProviderError::HttpError(message.to_string())),
            }
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn summary_config() -> CriticConfig {
        CriticConfig::builder()
            .metric("informative", "Captures the main points.", 75.0)
            .metric("coherent", "Logically organized.", 50.0)
            .metric("concise", "Free of repetition.", 50.0)
            .metric("engaging", "Holds attention.", 50.0)
            .max_score(100.0)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_all_metrics_pass() {
        let provider = MockProvider::returning(
            r#"{"informative": 90, "coherent": 80, "concise": 70, "engaging": 85}"#,
        );
        let critic = Critic::new(summary_config(), provider);

        let verdict = critic.evaluate("A thorough summary.", &Metadata::new()).await.unwrap();
        assert!(verdict.passed);
        assert!(verdict.failed_metrics.is_empty());
    }

    #[tokio::test]
    async fn test_failed_metrics_in_configuration_order() {
        let provider = MockProvider::returning(
            r#"{"informative": 40, "coherent": 80, "concise": 70, "engaging": 30}"#,
        );
        let critic = Critic::new(summary_config(), provider);

        let verdict = critic.evaluate("A thin summary.", &Metadata::new()).await.unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.failed_metrics, vec!["informative", "engaging"]);
    }

    #[tokio::test]
    async fn test_missing_metric_is_parse_error_not_verdict() {
        let provider =
            MockProvider::returning(r#"{"informative": 90, "coherent": 80, "concise": 70}"#);
        let critic = Critic::new(summary_config(), provider);

        let result = critic.evaluate("A summary.", &Metadata::new()).await;
        assert!(matches!(result, Err(CriticError::Parse(_))));
    }

    #[tokio::test]
    async fn test_provider_error_propagates_without_retry() {
        let provider = MockProvider::failing("connection refused");
        let critic = Critic::new(summary_config(), Arc::clone(&provider) as Arc<dyn LlmProvider>);

        let result = critic.evaluate("A summary.", &Metadata::new()).await;
        assert!(matches!(result, Err(CriticError::Provider(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_one_provider_call_per_evaluate() {
        let provider = MockProvider::returning(
            r#"{"informative": 90, "coherent": 80, "concise": 70, "engaging": 85}"#,
        );
        let critic = Critic::new(summary_config(), Arc::clone(&provider) as Arc<dyn LlmProvider>);

        critic.evaluate("First.", &Metadata::new()).await.unwrap();
        critic.evaluate("Second.", &Metadata::new()).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let provider = MockProvider::returning("{}");
        let critic = Critic::new(summary_config(), Arc::clone(&provider) as Arc<dyn LlmProvider>);

        let result = critic.evaluate("   ", &Metadata::new()).await;
        assert!(matches!(result, Err(CriticError::EmptyInput)));
        // No provider call is made for empty input.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_prefix_stripped_for_wire_model() {
        let config = CriticConfig::builder()
            .metric("accuracy", "Correct.", 3.0)
            .model("mock/grader-1")
            .build()
            .unwrap();
        let provider = MockProvider::returning(r#"{"accuracy": 4}"#);
        let critic = Critic::new(config, provider);

        assert_eq!(critic.completion.model, "grader-1");
    }

    #[tokio::test]
    async fn test_validate_maps_failing_verdict() {
        let provider = MockProvider::returning(
            r#"{"informative": 40, "coherent": 80, "concise": 70, "engaging": 30}"#,
        );
        let critic = Critic::new(summary_config(), provider);

        let outcome = critic.validate("A thin summary.", &Metadata::new()).await.unwrap();
        match outcome {
            ValidationOutcome::Fail {
                failed_metrics,
                error_message,
            } => {
                assert_eq!(failed_metrics, vec!["informative", "engaging"]);
                assert_eq!(
                    error_message,
                    "The response failed the following metrics: [informative, engaging]"
                );
            }
            ValidationOutcome::Pass => panic!("expected Fail"),
        }
    }

    #[tokio::test]
    async fn test_markdown_fenced_reply_accepted() {
        let provider = MockProvider::returning(
            "```json\n{\"informative\": 90, \"coherent\": 80, \"concise\": 70, \"engaging\": 85}\n```",
        );
        let critic = Critic::new(summary_config(), provider);

        let verdict = critic.evaluate("A summary.", &Metadata::new()).await.unwrap();
        assert!(verdict.passed);
    }
}
