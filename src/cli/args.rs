//! Command line argument parsing for the Glaive CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Glaive - train and query linear intent classifiers
#[derive(Parser, Debug, Clone)]
#[command(name = "glaive")]
#[command(about = "Train and query linear intent classifiers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct GlaiveArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl GlaiveArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a model from a corpus document
    Train(TrainArgs),

    /// Rank intents for an utterance
    Classify(ClassifyArgs),

    /// Show how an intent's score for an utterance is composed
    Explain(ExplainArgs),

    /// Show model information
    Info(InfoArgs),
}

/// Arguments for training a model
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Corpus document (JSON)
    #[arg(value_name = "CORPUS")]
    pub corpus: PathBuf,

    /// Where to write the trained model
    #[arg(short, long, value_name = "MODEL")]
    pub output: PathBuf,

    /// Training configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Always run the full iteration count
    #[arg(long)]
    pub fixed_error: bool,

    /// Maximum number of training iterations
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<usize>,

    /// Write a bincode snapshot instead of JSON
    #[arg(long)]
    pub binary: bool,

    /// Report training progress every N iterations
    #[arg(long, value_name = "N")]
    pub progress: Option<usize>,
}

/// Arguments for classifying an utterance
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// Trained model file
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Utterance to classify
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Number of intents to show
    #[arg(short = 'n', long, default_value = "5")]
    pub top: usize,

    /// Locale of the utterance (defaults to the model's locale)
    #[arg(short, long)]
    pub locale: Option<String>,
}

/// Arguments for explaining a score
#[derive(Parser, Debug, Clone)]
pub struct ExplainArgs {
    /// Trained model file
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Utterance to explain
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Intent whose score is explained
    #[arg(value_name = "INTENT")]
    pub intent: String,

    /// Locale of the utterance (defaults to the model's locale)
    #[arg(short, long)]
    pub locale: Option<String>,
}

/// Arguments for showing model information
#[derive(Parser, Debug, Clone)]
pub struct InfoArgs {
    /// Trained model file
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Also list every feature key
    #[arg(long)]
    pub features: bool,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
