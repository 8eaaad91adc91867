//! Grading configuration: metrics, scale, model, failure policy.
//!
//! Configuration is validated eagerly when built and never mutated
//! afterwards, so a constructed [`CriticConfig`] can be shared freely
//! across concurrent evaluations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parse::normalize_name;
use crate::policy::OnFail;

/// Default grading scale when none is configured.
pub const DEFAULT_MAX_SCORE: f64 = 5.0;

/// Default model identifier when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Errors raised while building a [`CriticConfig`].
///
/// These are structural precondition violations: they are fatal and
/// surface at construction time, never during an evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("At least one metric is required")]
    EmptyMetrics,

    #[error("Metric name cannot be empty")]
    EmptyMetricName,

    #[error("Duplicate metric name: '{0}'")]
    DuplicateMetric(String),

    #[error("Threshold for metric '{name}' is {threshold}, must be within [0, {max_score}]")]
    ThresholdOutOfRange {
        name: String,
        threshold: f64,
        max_score: f64,
    },

    #[error("Max score must be positive and finite, got {0}")]
    InvalidMaxScore(f64),
}

/// A single evaluative criterion.
///
/// The description is embedded verbatim in the grading prompt; the
/// threshold is the minimum score the metric must reach to pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Unique metric name, used as the key in the model's evaluation.
    pub name: String,

    /// Natural-language description of what the metric measures.
    pub description: String,

    /// Minimum score to pass, within `[0, max_score]`.
    pub threshold: f64,
}

impl MetricSpec {
    /// Create a metric spec.
    pub fn new(name: impl Into<String>, description: impl Into<String>, threshold: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            threshold,
        }
    }
}

/// An ordered, unique-by-name collection of metrics.
///
/// Construction order is preserved and drives the ordering of
/// `failed_metrics` in the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSet {
    metrics: Vec<MetricSpec>,
}

impl MetricSet {
    /// Build a metric set, validating against the grading scale.
    pub fn new(metrics: Vec<MetricSpec>, max_score: f64) -> Result<Self, ConfigError> {
        if !(max_score.is_finite() && max_score > 0.0) {
            return Err(ConfigError::InvalidMaxScore(max_score));
        }
        if metrics.is_empty() {
            return Err(ConfigError::EmptyMetrics);
        }

        // Uniqueness uses the parser's name equivalence: names that
        // collide after trimming and lowercasing would be fed by a
        // single parsed score.
        let mut seen: Vec<String> = Vec::with_capacity(metrics.len());
        for metric in &metrics {
            if metric.name.trim().is_empty() {
                return Err(ConfigError::EmptyMetricName);
            }
            let normalized = normalize_name(&metric.name);
            if seen.contains(&normalized) {
                return Err(ConfigError::DuplicateMetric(metric.name.clone()));
            }
            seen.push(normalized);

            if !metric.threshold.is_finite()
                || metric.threshold < 0.0
                || metric.threshold > max_score
            {
                return Err(ConfigError::ThresholdOutOfRange {
                    name: metric.name.clone(),
                    threshold: metric.threshold,
                    max_score,
                });
            }
        }

        Ok(Self { metrics })
    }

    /// Iterate metrics in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &MetricSpec> {
        self.metrics.iter()
    }

    /// Metric names in configuration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|m| m.name.as_str())
    }

    /// Look up a metric by exact name.
    pub fn get(&self, name: &str) -> Option<&MetricSpec> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Number of configured metrics.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether the set is empty. Always false for a validated set.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Immutable grading configuration.
///
/// Built once via [`CriticConfig::builder`]; all invariants are checked
/// in `build()` so every constructed config is valid.
#[derive(Debug, Clone)]
pub struct CriticConfig {
    metrics: MetricSet,
    max_score: f64,
    model: String,
    on_fail: OnFail,
}

impl CriticConfig {
    /// Start building a configuration.
    pub fn builder() -> CriticConfigBuilder {
        CriticConfigBuilder::new()
    }

    /// Shorthand: build with the given metrics and all defaults.
    pub fn new(metrics: Vec<MetricSpec>) -> Result<Self, ConfigError> {
        Self::builder().metrics(metrics).build()
    }

    /// Configured metrics, in order.
    pub fn metrics(&self) -> &MetricSet {
        &self.metrics
    }

    /// Highest score a metric can receive.
    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    /// Model identifier, optionally in `provider/model` form.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Failure policy the caller should apply to a failing verdict.
    pub fn on_fail(&self) -> &OnFail {
        &self.on_fail
    }
}

/// Builder for [`CriticConfig`].
#[derive(Debug, Default)]
pub struct CriticConfigBuilder {
    metrics: Vec<MetricSpec>,
    max_score: Option<f64>,
    model: Option<String>,
    on_fail: Option<OnFail>,
}

impl CriticConfigBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the metric list.
    pub fn metrics(mut self, metrics: Vec<MetricSpec>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Append a single metric.
    pub fn metric(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        threshold: f64,
    ) -> Self {
        self.metrics.push(MetricSpec::new(name, description, threshold));
        self
    }

    /// Set the grading scale.
    pub fn max_score(mut self, max_score: f64) -> Self {
        self.max_score = Some(max_score);
        self
    }

    /// Set the model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the failure policy.
    pub fn on_fail(mut self, on_fail: OnFail) -> Self {
        self.on_fail = Some(on_fail);
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<CriticConfig, ConfigError> {
        let max_score = self.max_score.unwrap_or(DEFAULT_MAX_SCORE);
        let metrics = MetricSet::new(self.metrics, max_score)?;

        Ok(CriticConfig {
            metrics,
            max_score,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            on_fail: self.on_fail.unwrap_or_default(),
        })
    }
}
