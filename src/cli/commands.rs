//! Command implementations for the Glaive CLI.

use std::path::Path;

use log::info;

use crate::analysis::{FeatureExtractor, FeatureSet, SimpleFeatureExtractor};
use crate::classifier::{
    IntentModel, NONE_FEATURE, SnapshotFormat, Trainer, TrainingConfig, TrainingState,
};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::corpus::Corpus;
use crate::error::{GlaiveError, Result};

/// Execute a CLI command.
pub fn execute_command(args: GlaiveArgs) -> Result<()> {
    match &args.command {
        Command::Train(train_args) => train_model(train_args, &args),
        Command::Classify(classify_args) => classify_text(classify_args, &args),
        Command::Explain(explain_args) => explain_score(explain_args, &args),
        Command::Info(info_args) => show_info(info_args, &args),
    }
}

/// Build the training configuration from the command line.
///
/// The corpus locale always wins over the configuration file.
pub fn training_config(args: &TrainArgs, corpus: &Corpus) -> Result<TrainingConfig> {
    let mut config = match &args.config {
        Some(path) => TrainingConfig::from_file(path)?,
        None => TrainingConfig::default(),
    };
    config.locale = corpus.language().to_string();
    if args.fixed_error {
        config.fixed_error = true;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    config.validate()?;
    Ok(config)
}

/// Train a model from a corpus document and save it.
fn train_model(args: &TrainArgs, cli_args: &GlaiveArgs) -> Result<()> {
    let corpus = Corpus::from_file(&args.corpus)?;
    let config = training_config(args, &corpus)?;
    let examples = corpus.examples(&SimpleFeatureExtractor::new())?;
    info!(
        "loaded corpus {:?}: {} utterances, {} intents",
        corpus.name,
        examples.len(),
        corpus.data.len()
    );

    let mut trainer = Trainer::new(config);
    if let Some(every) = args.progress.filter(|n| *n > 0) {
        trainer = trainer.with_progress(move |p| {
            if p.iteration % every == 0 {
                info!(
                    "iteration {}: error {:.8} (delta {:.8})",
                    p.iteration, p.error, p.delta_error
                );
            }
        });
    }

    let (model, result) = trainer.train(&examples)?;
    if result.state == TrainingState::Stopped {
        return Err(GlaiveError::cancelled("training was stopped"));
    }

    let format = if args.binary {
        SnapshotFormat::Binary
    } else {
        SnapshotFormat::Json
    };
    model.save(&args.output, format)?;

    let summary = TrainingSummary {
        model_path: args.output.display().to_string(),
        examples: examples.len(),
        intents: model.labels().len(),
        features: model.encoder().features().len(),
        iterations: result.iterations,
        final_error: result.final_error.is_finite().then_some(result.final_error),
        state: format!("{:?}", result.state),
        duration_ms: result.training_time_ms,
    };
    output_result("Model trained successfully", &summary, cli_args)
}

fn load_model(path: &Path) -> Result<IntentModel> {
    let model = IntentModel::load(path)?;
    info!(
        "loaded model {} ({} intents, {} features)",
        path.display(),
        model.labels().len(),
        model.encoder().features().len()
    );
    Ok(model)
}

fn extract(model: &IntentModel, locale: Option<&str>, text: &str) -> Result<FeatureSet> {
    let locale = locale.unwrap_or(&model.config().locale);
    SimpleFeatureExtractor::new().extract(locale, text)
}

/// Rank intents for an utterance.
fn classify_text(args: &ClassifyArgs, cli_args: &GlaiveArgs) -> Result<()> {
    let model = load_model(&args.model)?;
    let features = extract(&model, args.locale.as_deref(), &args.text)?;

    let mut intents = model.classify(&features);
    intents.truncate(args.top.max(1));

    let output = ClassificationOutput {
        text: args.text.clone(),
        features: features.keys().map(str::to_string).collect(),
        intents,
    };
    output_result("Classification", &output, cli_args)
}

/// Break down an intent's raw score for an utterance.
fn explain_score(args: &ExplainArgs, cli_args: &GlaiveArgs) -> Result<()> {
    let model = load_model(&args.model)?;
    let features = extract(&model, args.locale.as_deref(), &args.text)?;

    let explanation = model
        .explain(&features, &args.intent)
        .ok_or_else(|| GlaiveError::not_found(format!("intent {:?}", args.intent)))?;
    output_result("Explanation", &explanation, cli_args)
}

/// Show model information.
fn show_info(args: &InfoArgs, cli_args: &GlaiveArgs) -> Result<()> {
    let model = load_model(&args.model)?;
    let metadata = model.metadata();
    let vocabulary = model.encoder().features();

    let info = ModelInfo {
        path: args.model.display().to_string(),
        locale: model.config().locale.clone(),
        trained_at: metadata.trained_at.to_rfc3339(),
        training_examples: metadata.training_examples,
        iterations: metadata.iterations,
        final_error: metadata.final_error,
        labels: model.labels().to_vec(),
        feature_count: vocabulary.len(),
        none_feature: vocabulary.contains(NONE_FEATURE),
        features: args.features.then(|| vocabulary.keys().to_vec()),
    };
    output_result("Model information", &info, cli_args)
}
