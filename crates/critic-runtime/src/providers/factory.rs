//! Provider factory pattern for dynamic provider registration.
//!
//! New backends register a factory under a provider type; the registry
//! then resolves a `provider/model` identifier (bare model names fall
//! back to the default provider) into a provider instance plus the
//! bare model name to send on the wire.
//!
//! ```ignore
//! let registry = ProviderRegistry::with_defaults();
//! let (provider, model) = registry.resolve("anthropic/claude-sonnet-4-5", &config)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{LlmProvider, ProviderError};

/// Provider type used when a model identifier has no `provider/` prefix.
pub const DEFAULT_PROVIDER_TYPE: &str = "openai";

/// Factory for creating LLM providers from configuration.
pub trait ProviderFactory: Send + Sync {
    /// Unique identifier for this provider type, e.g. "anthropic".
    fn provider_type(&self) -> &'static str;

    /// Create a provider instance from JSON configuration.
    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError>;

    /// Validate configuration without creating a provider.
    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError>;

    /// Human-readable description of this provider.
    fn description(&self) -> &'static str {
        "LLM Provider"
    }
}

/// Registry of available provider factories.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all feature-enabled providers registered.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "anthropic")]
        registry.register(Arc::new(super::AnthropicProviderFactory));
        #[cfg(feature = "openai")]
        registry.register(Arc::new(super::OpenAiProviderFactory));
        registry
    }

    /// Register a provider factory, replacing any same-typed one.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories
            .insert(factory.provider_type().to_string(), factory);
    }

    /// Create a provider for an explicit provider type.
    pub fn create(
        &self,
        provider_type: &str,
        config: &JsonValue,
    ) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        self.factories
            .get(provider_type)
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "Unknown provider type: '{}'. Available: {:?}",
                    provider_type,
                    self.available_types()
                ))
            })?
            .create(config)
    }

    /// Resolve a model identifier into a provider and a bare model name.
    ///
    /// `anthropic/claude-sonnet-4-5` selects the anthropic factory and
    /// strips the prefix; a bare name like `gpt-4o-mini` uses the
    /// default provider. An unregistered prefix is left intact and sent
    /// to the default provider, since model names may themselves
    /// contain slashes.
    pub fn resolve(
        &self,
        model_identifier: &str,
        config: &JsonValue,
    ) -> Result<(Arc<dyn LlmProvider>, String), ProviderError> {
        if let Some((prefix, rest)) = model_identifier.split_once('/') {
            if self.factories.contains_key(prefix) {
                let provider = self.create(prefix, config)?;
                return Ok((provider, rest.to_string()));
            }
        }

        let provider = self.create(DEFAULT_PROVIDER_TYPE, config)?;
        Ok((provider, model_identifier.to_string()))
    }

    /// Validate configuration for a provider type.
    pub fn validate(&self, provider_type: &str, config: &JsonValue) -> Result<(), ProviderError> {
        self.factories
            .get(provider_type)
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!("Unknown provider type: '{}'", provider_type))
            })?
            .validate_config(config)
    }

    /// List available provider types.
    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a provider type is registered.
    pub fn has_provider(&self, provider_type: &str) -> bool {
        self.factories.contains_key(provider_type)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ChatMessage, CompletionConfig, CompletionResponse, TokenUsage};
    use async_trait::async_trait;

    struct MockProvider {
        name: String,
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse {
                content: "{}".to_string(),
                usage: TokenUsage::default(),
                model: "mock".to_string(),
                stop_reason: None,
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    struct MockFactory(&'static str);

    impl ProviderFactory for MockFactory {
        fn provider_type(&self) -> &'static str {
            self.0
        }

        fn create(&self, _config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
            Ok(Arc::new(MockProvider {
                name: self.0.to_string(),
            }))
        }

        fn validate_config(&self, _config: &JsonValue) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MockFactory("mock")));

        assert!(registry.has_provider("mock"));
        let provider = registry.create("mock", &serde_json::json!({})).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn test_unknown_provider_type() {
        let registry = ProviderRegistry::new();
        let result = registry.create("unknown", &serde_json::json!({}));
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn test_resolve_prefixed_model() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MockFactory("anthropic")));
        registry.register(Arc::new(MockFactory("openai")));

        let (provider, model) = registry
            .resolve("anthropic/claude-sonnet-4-5", &serde_json::json!({}))
            .unwrap();
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(model, "claude-sonnet-4-5");
    }

    #[test]
    fn test_resolve_bare_model_uses_default_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MockFactory("openai")));

        let (provider, model) = registry
            .resolve("gpt-4o-mini", &serde_json::json!({}))
            .unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(model, "gpt-4o-mini");
    }

    #[test]
    fn test_resolve_unknown_prefix_kept_in_model_name() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MockFactory("openai")));

        let (provider, model) = registry
            .resolve("org/custom-model", &serde_json::json!({}))
            .unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(model, "org/custom-model");
    }
}
