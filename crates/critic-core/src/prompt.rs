//! Grading prompt construction.
//!
//! The prompt embeds the response under evaluation, the metrics as a
//! JSON object of `{description, threshold}` entries, and the scale,
//! then pins the model to a machine-parseable JSON reply. Fully
//! deterministic for a given config and input.

use serde_json::json;

use crate::config::CriticConfig;

/// Build the grading prompt for one response.
pub fn build_prompt(text: &str, config: &CriticConfig) -> String {
    format!(
        r#"You are an impartial grader. Your task is to evaluate and rate a response.
You are given 'Response', 'Metrics' and 'Max score'. 'Metrics' are the
evaluation metrics, each with a description and a pass threshold. 'Max score'
is the highest score that can be achieved on each metric. Evaluate the
response against each metric and assign a score between 0 and 'Max score'.

Return your evaluation as a single JSON object keyed by metric name
(replace `metric_1`, `metric_2`, ... with the actual metric names and
<score> with the numeric score):
{{
  "metric_1": <score>,
  "metric_2": <score>
}}

Output only the JSON object. Do not include any other text.

Response:
{text}

Metrics:
{metrics}

Max score:
{max_score}
"#,
        text = text,
        metrics = metrics_json(config),
        max_score = config.max_score(),
    )
}

/// Metrics as pretty JSON: name -> {description, threshold}.
fn metrics_json(config: &CriticConfig) -> String {
    let mut object = serde_json::Map::new();
    for metric in config.metrics().iter() {
        object.insert(
            metric.name.clone(),
            json!({
                "description": metric.description,
                "threshold": metric.threshold,
            }),
        );
    }
    serde_json::to_string_pretty(&object).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CriticConfig {
        CriticConfig::builder()
            .metric("informative", "Captures the main points.", 75.0)
            .metric("engaging", "Holds attention.", 50.0)
            .max_score(100.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_prompt_embeds_response_text() {
        let prompt = build_prompt("The quarterly report shows growth.", &config());
        assert!(prompt.contains("The quarterly report shows growth."));
    }

    #[test]
    fn test_prompt_embeds_every_metric() {
        let prompt = build_prompt("text", &config());
        assert!(prompt.contains("\"informative\""));
        assert!(prompt.contains("\"engaging\""));
        assert!(prompt.contains("Captures the main points."));
        assert!(prompt.contains("Holds attention."));
    }

    #[test]
    fn test_prompt_states_scale_and_format() {
        let prompt = build_prompt("text", &config());
        assert!(prompt.contains("Max score:\n100"));
        assert!(prompt.contains("Output only the JSON object"));
        assert!(prompt.contains("<score>"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_prompt("same input", &config());
        let b = build_prompt("same input", &config());
        assert_eq!(a, b);
    }
}
