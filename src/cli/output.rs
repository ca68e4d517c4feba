//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::classifier::{Explanation, LabelScore};
use crate::cli::args::{GlaiveArgs, OutputFormat};
use crate::error::Result;

/// Result of the `train` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub model_path: String,
    pub examples: usize,
    pub intents: usize,
    pub features: usize,
    pub iterations: usize,
    pub final_error: Option<f64>,
    pub state: String,
    pub duration_ms: u64,
}

/// Result of the `classify` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassificationOutput {
    pub text: String,
    pub features: Vec<String>,
    pub intents: Vec<LabelScore>,
}

/// Result of the `info` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub path: String,
    pub locale: String,
    pub trained_at: String,
    pub training_examples: usize,
    pub iterations: usize,
    pub final_error: Option<f64>,
    pub labels: Vec<String>,
    pub feature_count: usize,
    pub none_feature: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

/// Human-readable rendering of a command result.
pub trait HumanReadable {
    fn to_human(&self) -> String;
}

impl HumanReadable for TrainingSummary {
    fn to_human(&self) -> String {
        let error = self
            .final_error
            .map_or_else(|| "n/a".to_string(), |e| format!("{e:.8}"));
        format!(
            "Model: {}\nExamples: {}\nIntents: {}\nFeatures: {}\nIterations: {} ({})\nFinal error: {}\nTraining time: {}ms",
            self.model_path,
            self.examples,
            self.intents,
            self.features,
            self.iterations,
            self.state,
            error,
            self.duration_ms
        )
    }
}

impl HumanReadable for ClassificationOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("\"{}\"", self.text)];
        for (rank, score) in self.intents.iter().enumerate() {
            lines.push(format!(
                "{:>3}. {:<24} {:.4}",
                rank + 1,
                score.label,
                score.score
            ));
        }
        lines.join("\n")
    }
}

impl HumanReadable for Explanation {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Intent: {}", self.label)];
        for c in &self.contributions {
            lines.push(format!(
                "  {:<24} {:>10.4} x {:<8.4} = {:>10.4}",
                c.feature, c.weight, c.value, c.contribution
            ));
        }
        lines.push(format!("  {:<24} {:>10.4}", "(bias)", self.bias));
        lines.push(format!("  {:<24} {:>10.4}", "raw score", self.raw_score));
        lines.join("\n")
    }
}

impl HumanReadable for ModelInfo {
    fn to_human(&self) -> String {
        let error = self
            .final_error
            .map_or_else(|| "n/a".to_string(), |e| format!("{e:.8}"));
        let mut lines = vec![
            format!("Model: {}", self.path),
            format!("Locale: {}", self.locale),
            format!("Trained at: {}", self.trained_at),
            format!("Training examples: {}", self.training_examples),
            format!("Iterations: {}", self.iterations),
            format!("Final error: {error}"),
            format!("Features: {}", self.feature_count),
            format!("None-feature: {}", if self.none_feature { "yes" } else { "no" }),
            format!("Intents: [{}]", self.labels.join(", ")),
        ];
        if let Some(features) = &self.features {
            lines.push(format!("Feature keys: [{}]", features.join(", ")));
        }
        lines.join("\n")
    }
}

/// Render a result in the requested format.
pub fn render<T: Serialize + HumanReadable>(result: &T, args: &GlaiveArgs) -> Result<String> {
    match args.output_format {
        OutputFormat::Human => Ok(result.to_human()),
        OutputFormat::Json if args.pretty => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
    }
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + HumanReadable>(
    message: &str,
    result: &T,
    args: &GlaiveArgs,
) -> Result<()> {
    if args.output_format == OutputFormat::Human && args.verbosity() > 1 {
        println!("{message}");
        println!();
    }
    println!("{}", render(result, args)?);
    Ok(())
}
