//! CLI for grading a response with an LLM critic.
//!
//! Loads a YAML grading config, reads the response text from an
//! argument, a file, or stdin, runs one evaluation, and prints the
//! verdict. With `on_fail: exception` a failing verdict exits non-zero.

use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use critic_core::{CriticConfig, MetricSpec, OnFail};
use critic_runtime::{CompletionConfig, Critic, Metadata, ProviderRegistry};

#[derive(Parser)]
#[command(name = "critic", version, about = "Grade a response with an LLM critic")]
struct Cli {
    /// Path to the grading configuration (YAML)
    #[arg(short, long)]
    config: PathBuf,

    /// Response text to grade; reads stdin when omitted
    text: Option<String>,

    /// Read the response text from a file instead
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Request timeout, e.g. "30s" or "2m"
    #[arg(long, default_value = "30s")]
    timeout: String,

    /// Print the verdict as JSON
    #[arg(long)]
    json: bool,
}

/// On-disk grading configuration.
///
/// ```yaml
/// model: anthropic/claude-sonnet-4-5
/// max_score: 100
/// on_fail: exception
/// metrics:
///   - name: informative
///     description: Captures the main points of the input.
///     threshold: 75
/// ```
#[derive(Debug, Deserialize)]
struct GradingFile {
    metrics: Vec<MetricSpec>,
    max_score: Option<f64>,
    model: Option<String>,
    on_fail: Option<String>,
}

impl GradingFile {
    fn into_config(self) -> Result<CriticConfig> {
        let mut builder = CriticConfig::builder().metrics(self.metrics);
        if let Some(max_score) = self.max_score {
            builder = builder.max_score(max_score);
        }
        if let Some(model) = self.model {
            builder = builder.model(model);
        }
        if let Some(on_fail) = self.on_fail {
            builder = builder.on_fail(OnFail::from_str(&on_fail)?);
        }
        builder.build().context("Invalid grading configuration")
    }
}

fn load_config(path: &PathBuf) -> Result<CriticConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let file: GradingFile = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    file.into_config()
}

/// Text rendering of a verdict, scores in configuration order.
fn render_text(config: &CriticConfig, verdict: &critic_runtime::Verdict) -> String {
    let mut out = String::new();
    for name in config.metrics().names() {
        if let Some(score) = verdict.scores.get(name) {
            out.push_str(&format!("{name}: {score}\n"));
        }
    }
    if verdict.passed {
        out.push_str("PASSED\n");
    } else {
        out.push_str("FAILED\n");
        out.push_str(&verdict.failure_message());
        out.push('\n');
    }
    out
}

fn read_text(cli: &Cli) -> Result<String> {
    if let Some(text) = &cli.text {
        return Ok(text.clone());
    }
    if let Some(path) = &cli.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display()));
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read stdin")?;
    Ok(buffer)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    let on_fail = config.on_fail().clone();

    let timeout = humantime::parse_duration(&cli.timeout)
        .with_context(|| format!("Invalid timeout '{}'", cli.timeout))?;

    let registry = ProviderRegistry::with_defaults();
    let critic = Critic::from_registry(config, &registry, &serde_json::json!({}))?
        .with_completion(CompletionConfig {
            timeout,
            ..CompletionConfig::default()
        });

    let text = read_text(&cli)?;
    let verdict = critic.evaluate(&text, &Metadata::new()).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        print!("{}", render_text(critic.config(), &verdict));
    }

    // Policy application is the caller's job; the CLI is the caller here.
    // Only `exception` changes the exit status; reask/fix have no
    // standalone meaning without a producing model to re-prompt.
    if !verdict.passed {
        if let OnFail::Exception = on_fail {
            bail!("{}", verdict.failure_message());
        }
        tracing::warn!(policy = %on_fail, "verdict failed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grading_file_parses_and_builds() {
        let yaml = r#"
model: anthropic/claude-sonnet-4-5
max_score: 100
on_fail: exception
metrics:
  - name: informative
    description: Captures the main points of the input.
    threshold: 75
  - name: engaging
    description: Holds the reader's attention.
    threshold: 50
"#;
        let file: GradingFile = serde_yaml::from_str(yaml).unwrap();
        let config = file.into_config().unwrap();

        assert_eq!(config.model(), "anthropic/claude-sonnet-4-5");
        assert_eq!(config.max_score(), 100.0);
        assert_eq!(config.on_fail().name(), "exception");
        let names: Vec<&str> = config.metrics().names().collect();
        assert_eq!(names, vec!["informative", "engaging"]);
    }

    #[test]
    fn test_grading_file_defaults() {
        let yaml = r#"
metrics:
  - name: accuracy
    description: Factually correct.
    threshold: 3
"#;
        let file: GradingFile = serde_yaml::from_str(yaml).unwrap();
        let config = file.into_config().unwrap();

        assert_eq!(config.max_score(), critic_core::DEFAULT_MAX_SCORE);
        assert_eq!(config.model(), critic_core::DEFAULT_MODEL);
        assert_eq!(config.on_fail().name(), "noop");
    }

    #[test]
    fn test_bad_threshold_rejected_at_load() {
        let yaml = r#"
max_score: 5
metrics:
  - name: accuracy
    description: Factually correct.
    threshold: 10
"#;
        let file: GradingFile = serde_yaml::from_str(yaml).unwrap();
        assert!(file.into_config().is_err());
    }

    #[test]
    fn test_render_text_in_configuration_order() {
        use critic_core::{Scores, Verdict};

        let config = CriticConfig::builder()
            .metric("informative", "Captures the main points.", 75.0)
            .metric("coherent", "Logically organized.", 50.0)
            .metric("engaging", "Holds attention.", 50.0)
            .max_score(100.0)
            .build()
            .unwrap();

        let scores: Scores = [("informative", 40.0), ("coherent", 80.0), ("engaging", 30.0)]
            .into_iter()
            .map(|(name, score)| (name.to_string(), score))
            .collect();
        let verdict = Verdict::judge(&config, &scores);

        let rendered = render_text(&config, &verdict);
        // Configuration order, not the alphabetical map order.
        assert_eq!(
            rendered,
            "informative: 40\ncoherent: 80\nengaging: 30\nFAILED\n\
             The response failed the following metrics: [informative, engaging]\n"
        );
    }

    #[test]
    fn test_unknown_on_fail_rejected() {
        let yaml = r#"
on_fail: explode
metrics:
  - name: accuracy
    description: Factually correct.
    threshold: 3
"#;
        let file: GradingFile = serde_yaml::from_str(yaml).unwrap();
        assert!(file.into_config().is_err());
    }
}
