//! Threshold comparison and the resulting verdict.
//!
//! A metric passes iff `score >= threshold`; a score exactly equal to
//! its threshold passes. The verdict lists failing metrics in
//! configuration order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CriticConfig;
use crate::parse::Scores;

/// Aggregate pass/fail outcome of one grading call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// True iff every metric met its threshold.
    pub passed: bool,

    /// Metrics that did not meet their threshold, in configuration order.
    pub failed_metrics: Vec<String>,

    /// Parsed per-metric scores, keyed by configured metric name.
    pub scores: Scores,

    /// Model identifier that produced the scores.
    pub model: String,

    /// When the verdict was derived.
    pub graded_at: DateTime<Utc>,
}

impl Verdict {
    /// Derive a verdict from parsed scores.
    ///
    /// The caller guarantees `scores` holds an entry for every
    /// configured metric; the parser enforces this.
    pub fn judge(config: &CriticConfig, scores: &Scores) -> Self {
        let failed_metrics: Vec<String> = config
            .metrics()
            .iter()
            .filter(|metric| {
                scores
                    .get(&metric.name)
                    .is_some_and(|score| *score < metric.threshold)
            })
            .map(|metric| metric.name.clone())
            .collect();

        Self {
            passed: failed_metrics.is_empty(),
            failed_metrics,
            scores: scores.clone(),
            model: config.model().to_string(),
            graded_at: Utc::now(),
        }
    }

    /// User-visible message for a failing verdict.
    pub fn failure_message(&self) -> String {
        format!(
            "The response failed the following metrics: [{}]",
            self.failed_metrics.join(", ")
        )
    }
}

/// Outcome handed to the hosting framework.
///
/// A failing verdict is not an error; the caller's failure policy
/// decides what to do with a `Fail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// Every metric met its threshold.
    Pass,
    /// One or more metrics fell below threshold.
    Fail {
        /// Failing metric names, in configuration order.
        failed_metrics: Vec<String>,
        /// Message in the fixed user-visible format.
        error_message: String,
    },
}

impl ValidationOutcome {
    /// Build a `Fail` outcome.
    pub fn fail(failed_metrics: Vec<String>, error_message: String) -> Self {
        Self::Fail {
            failed_metrics,
            error_message,
        }
    }

    /// Whether this outcome is a pass.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl From<&Verdict> for ValidationOutcome {
    fn from(verdict: &Verdict) -> Self {
        if verdict.passed {
            Self::Pass
        } else {
            Self::Fail {
                failed_metrics: verdict.failed_metrics.clone(),
                error_message: verdict.failure_message(),
            }
        }
    }
}
