//! # critic-core
//!
//! Deterministic half of the Critic grader: everything around the LLM
//! call, without the call itself.
//!
//! Given a set of named metrics, each with a description and a pass
//! threshold, this crate builds the grading prompt, parses the model's
//! per-metric scores, and derives the pass/fail verdict. The provider
//! layer that actually talks to a model lives in `critic-runtime`.
//!
//! ## Key Guarantees
//!
//! 1. **Eager validation**: a constructed [`CriticConfig`] is valid;
//!    bad metrics fail at build time, not per call
//! 2. **No silent verdicts**: a missing or malformed score is a
//!    [`ParseError`], never coerced into pass or fail
//! 3. **Stable ordering**: failing metrics are reported in
//!    configuration order
//!
//! ## Example
//!
//! ```rust
//! use critic_core::{parse_scores, CriticConfig, Verdict};
//!
//! let config = CriticConfig::builder()
//!     .metric("accuracy", "Factually correct.", 3.0)
//!     .metric("clarity", "Easy to follow.", 2.0)
//!     .build()
//!     .unwrap();
//!
//! let scores = parse_scores(r#"{"accuracy": 4, "clarity": 1}"#, &config).unwrap();
//! let verdict = Verdict::judge(&config, &scores);
//!
//! assert!(!verdict.passed);
//! assert_eq!(verdict.failed_metrics, vec!["clarity"]);
//! ```

pub mod config;
pub mod parse;
pub mod policy;
pub mod prompt;
pub mod verdict;

// Re-export main types at crate root
pub use config::{
    ConfigError, CriticConfig, CriticConfigBuilder, MetricSet, MetricSpec, DEFAULT_MAX_SCORE,
    DEFAULT_MODEL,
};
pub use parse::{parse_scores, ParseError, Scores};
pub use policy::{OnFail, OnFailHandler, UnknownPolicy};
pub use prompt::build_prompt;
pub use verdict::{ValidationOutcome, Verdict};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_to_verdict_round() {
        let config = CriticConfig::builder()
            .metric("informative", "Captures the main points.", 75.0)
            .metric("coherent", "Logically organized.", 50.0)
            .metric("concise", "Free of repetition.", 50.0)
            .metric("engaging", "Holds attention.", 50.0)
            .max_score(100.0)
            .build()
            .unwrap();

        let prompt = build_prompt("A summary of the ruling.", &config);
        assert!(prompt.contains("A summary of the ruling."));

        // Simulated critic reply covering every configured metric.
        let reply = r#"{"informative": 90, "coherent": 80, "concise": 70, "engaging": 85}"#;
        let scores = parse_scores(reply, &config).unwrap();
        let verdict = Verdict::judge(&config, &scores);

        assert!(verdict.passed);
        assert!(verdict.failed_metrics.is_empty());
    }
}
