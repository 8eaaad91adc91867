//! Parsing of the critic model's evaluation into per-metric scores.
//!
//! The accepted grammar, in order:
//! 1. Strip a surrounding markdown code fence, then extract the
//!    outermost `{ ... }` and parse it as a JSON object keyed by
//!    metric name. Commentary around the object is ignored.
//! 2. If no JSON object parses, fall back to one `name: score` pair
//!    per line.
//!
//! Metric names match case-insensitively and whitespace-trimmed.
//! A missing, non-numeric, or out-of-range score for any configured
//! metric is a [`ParseError`], never an implicit pass or fail.

use std::collections::{BTreeMap, HashMap};

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::config::CriticConfig;

/// Parsed per-metric scores, keyed by the configured metric name.
pub type Scores = BTreeMap<String, f64>;

lazy_static! {
    /// One `name: score` pair per line; tolerates quotes, bullets,
    /// `=` separators, and trailing commas.
    static ref SCORE_LINE: Regex = Regex::new(
        r#"(?m)^\s*[-*]?\s*"?([^":=]+?)"?\s*[:=]\s*"?(-?\d+(?:\.\d+)?)"?\s*,?\s*$"#
    )
    .expect("Invalid score line regex");
}

/// Errors turning a raw completion into [`Scores`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Model response contained no parseable evaluation")]
    NoEvaluation,

    #[error("Model response is missing scores for metrics: [{}]", .0.join(", "))]
    MissingMetrics(Vec<String>),

    #[error("Score for metric '{name}' is not numeric: {value}")]
    NonNumericScore { name: String, value: String },

    #[error("Score for metric '{name}' is {score}, outside [0, {max_score}]")]
    ScoreOutOfRange {
        name: String,
        score: f64,
        max_score: f64,
    },
}

/// Parse a raw completion into scores for every configured metric.
pub fn parse_scores(raw: &str, config: &CriticConfig) -> Result<Scores, ParseError> {
    let cleaned = strip_code_fence(raw);
    let entries = match extract_json_object(&cleaned) {
        Some(object) => object
            .into_iter()
            .map(|(key, value)| (normalize_name(&key), value))
            .collect(),
        None => {
            tracing::debug!("no JSON object in response, trying line grammar");
            parse_score_lines(&cleaned)
        }
    };

    if entries.is_empty() {
        return Err(ParseError::NoEvaluation);
    }

    collect_scores(&entries, config)
}

/// Match parsed entries against the configured metrics.
fn collect_scores(
    entries: &HashMap<String, JsonValue>,
    config: &CriticConfig,
) -> Result<Scores, ParseError> {
    let mut scores = Scores::new();
    let mut missing = Vec::new();

    for metric in config.metrics().iter() {
        let Some(value) = entries.get(&normalize_name(&metric.name)) else {
            missing.push(metric.name.clone());
            continue;
        };

        let Some(score) = as_score(value) else {
            return Err(ParseError::NonNumericScore {
                name: metric.name.clone(),
                value: value.to_string(),
            });
        };

        if !score.is_finite() || score < 0.0 || score > config.max_score() {
            return Err(ParseError::ScoreOutOfRange {
                name: metric.name.clone(),
                score,
                max_score: config.max_score(),
            });
        }

        scores.insert(metric.name.clone(), score);
    }

    if !missing.is_empty() {
        return Err(ParseError::MissingMetrics(missing));
    }

    Ok(scores)
}

/// Numeric value of a JSON entry, tolerating numbers quoted as strings.
fn as_score(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Canonical form for metric-name matching.
///
/// Config validation uses the same form, so two configured metrics can
/// never be satisfied by a single parsed entry.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Remove a surrounding ```...``` fence if present.
fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() > 2 && lines[lines.len() - 1].trim_start().starts_with("```") {
            return lines[1..lines.len() - 1].join("\n");
        }
    }
    trimmed.to_string()
}

/// Extract and parse the outermost JSON object, if any.
fn extract_json_object(cleaned: &str) -> Option<serde_json::Map<String, JsonValue>> {
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if start >= end {
        return None;
    }
    serde_json::from_str(&cleaned[start..=end]).ok()
}

/// Fallback line grammar: one `name: score` pair per line.
fn parse_score_lines(cleaned: &str) -> HashMap<String, JsonValue> {
    SCORE_LINE
        .captures_iter(cleaned)
        .filter_map(|caps| {
            let name = normalize_name(&caps[1]);
            let score: f64 = caps[2].parse().ok()?;
            let number = serde_json::Number::from_f64(score)?;
            Some((name, JsonValue::Number(number)))
        })
        .collect()
}
