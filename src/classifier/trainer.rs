//! Training controller.
//!
//! Builds vocabularies, encodes the corpus, initializes the scoring units and
//! iterates until a stopping condition is met:
//!
//! - fixed-error mode runs exactly `max_iterations` iterations;
//! - adaptive mode stops once the aggregate error, or its change between two
//!   iterations, falls to the (possibly scaled) threshold, or at the cap;
//! - a [`CancellationToken`] stops either mode at the next iteration
//!   boundary, keeping the weights learned so far.
//!
//! Every call trains from scratch; there is no incremental training.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use ahash::AHashSet;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::FeatureSet;
use crate::classifier::config::TrainingConfig;
use crate::classifier::encoder::ExampleEncoder;
use crate::classifier::linear::{LinearClassifier, MomentumBuffers, UpdateStep};
use crate::classifier::model::{IntentModel, ModelMetadata};
use crate::classifier::types::{NONE_FEATURE, TrainingExample};
use crate::error::{GlaiveError, Result};

/// Where a training run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingState {
    /// Still iterating.
    Training,
    /// Error or error change fell below its threshold.
    Converged,
    /// The iteration cap was reached (always the case in fixed-error mode).
    MaxIterationsReached,
    /// Cancelled at an iteration boundary.
    Stopped,
}

/// Summary of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Completed iterations.
    pub iterations: usize,
    /// Aggregate error of the last completed iteration; infinite if none ran.
    pub final_error: f64,
    /// Final state.
    pub state: TrainingState,
    /// Wall-clock training time in milliseconds.
    pub training_time_ms: u64,
}

/// Snapshot handed to the progress callback after every iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingProgress {
    /// 1-based index of the completed iteration.
    pub iteration: usize,
    /// Mean squared error over all examples and labels.
    pub error: f64,
    /// Absolute change of the error since the previous iteration.
    pub delta_error: f64,
    /// Time spent on this iteration.
    pub elapsed: Duration,
}

/// Progress observer; it cannot influence training.
pub type ProgressCallback = Box<dyn Fn(&TrainingProgress) + Send + Sync>;

/// Cooperative cancellation signal, checked once per iteration.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Drives training of one model.
pub struct Trainer {
    config: TrainingConfig,
    progress: Option<ProgressCallback>,
    cancellation: Option<CancellationToken>,
}

impl std::fmt::Debug for Trainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trainer")
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .field("cancellation", &self.cancellation)
            .finish()
    }
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(TrainingConfig::default())
    }
}

impl Trainer {
    /// Create a trainer with the given hyperparameters.
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            progress: None,
            cancellation: None,
        }
    }

    /// Observe every completed iteration.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TrainingProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Stop at the next iteration boundary once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Hyperparameters in use.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train a model, building both vocabularies from `examples`.
    pub fn train(&self, examples: &[TrainingExample]) -> Result<(IntentModel, TrainingResult)> {
        self.config.validate()?;
        let corpus = self.prepare_corpus(examples)?;
        let encoder = ExampleEncoder::from_corpus(&corpus)?;
        self.run(encoder, &corpus, none_delta(examples))
    }

    /// Train a model using caller-supplied vocabularies.
    ///
    /// Corpus features missing from `encoder` are ignored, like unknown
    /// features at inference time. Every corpus intent must be in the label
    /// vocabulary.
    pub fn train_with_encoder(
        &self,
        encoder: ExampleEncoder,
        examples: &[TrainingExample],
    ) -> Result<(IntentModel, TrainingResult)> {
        self.config.validate()?;
        if let Some(intent) = examples
            .iter()
            .filter_map(TrainingExample::target)
            .find(|intent| !encoder.labels().contains(intent))
        {
            return Err(GlaiveError::vocabulary(format!(
                "intent {intent:?} is not in the label vocabulary"
            )));
        }
        let corpus = self.prepare_corpus(examples)?;
        self.run(encoder, &corpus, none_delta(examples))
    }

    /// Validate the corpus and append the synthetic none example if enabled.
    fn prepare_corpus(&self, examples: &[TrainingExample]) -> Result<Vec<TrainingExample>> {
        if examples.is_empty() {
            return Err(GlaiveError::corpus("training corpus is empty"));
        }
        if examples.iter().all(|e| e.target().is_none()) {
            return Err(GlaiveError::corpus(
                "training corpus has no labelled examples",
            ));
        }
        if examples.iter().any(|e| e.features.contains(NONE_FEATURE)) {
            return Err(GlaiveError::corpus(format!(
                "feature key {NONE_FEATURE:?} is reserved"
            )));
        }

        let empty = examples.iter().filter(|e| e.features.is_empty()).count();
        if empty > 0 {
            warn!("{empty} training examples have no features and only train biases");
        }

        let mut corpus = examples.to_vec();
        if self.config.none_feature.enabled_for(&self.config.locale) {
            let mut features = FeatureSet::new();
            features.insert(NONE_FEATURE, self.config.none_feature.value);
            corpus.push(TrainingExample::none(features));
        }
        Ok(corpus)
    }

    fn run(
        &self,
        encoder: ExampleEncoder,
        corpus: &[TrainingExample],
        corpus_delta: f64,
    ) -> Result<(IntentModel, TrainingResult)> {
        let config = &self.config;
        let data = encoder.encode_corpus(corpus);
        let none_label = encoder.none_label();
        let num_labels = encoder.labels().len();

        let mut classifier =
            LinearClassifier::with_init(num_labels, encoder.features().len(), &config.weight_init);
        let mut buffers = MomentumBuffers::for_classifier(&classifier);

        let (min_error, min_delta) = config.effective_thresholds(num_labels);
        info!(
            "training on {} examples, {} features, {} labels ({} mode)",
            data.len(),
            encoder.features().len(),
            num_labels,
            if config.fixed_error { "fixed" } else { "adaptive" }
        );

        let start_time = Instant::now();
        let mut iterations = 0;
        let mut error = f64::INFINITY;
        let mut state = TrainingState::Training;

        while state == TrainingState::Training {
            if self.is_cancelled() {
                warn!("training cancelled after {iterations} iterations");
                state = TrainingState::Stopped;
                break;
            }

            let iteration_start = Instant::now();
            iterations += 1;
            let learning_rate = config.learning_rate_at(iterations);

            let step = UpdateStep {
                learning_rate,
                momentum: config.momentum,
                error_scale: 1.0,
            };

            let last_error = error;
            error = classifier.train_iteration(
                &data,
                step,
                none_label,
                config.none_delta_multiplier,
                &mut buffers,
            );
            let delta_error = (error - last_error).abs();

            debug!("iteration {iterations} error {error:.8} delta {delta_error:.8}");
            if let Some(callback) = &self.progress {
                callback(&TrainingProgress {
                    iteration: iterations,
                    error,
                    delta_error,
                    elapsed: iteration_start.elapsed(),
                });
            }

            if iterations >= config.max_iterations {
                state = TrainingState::MaxIterationsReached;
            } else if !config.fixed_error && (error <= min_error || delta_error <= min_delta) {
                state = TrainingState::Converged;
            }
        }

        let training_time = start_time.elapsed();
        info!(
            "training finished: {:?} after {} iterations, error {:.8}, {} ms",
            state,
            iterations,
            error,
            training_time.as_millis()
        );

        let result = TrainingResult {
            iterations,
            final_error: error,
            state,
            training_time_ms: training_time.as_millis() as u64,
        };
        let metadata = ModelMetadata {
            trained_at: chrono::Utc::now(),
            training_examples: data.len(),
            iterations,
            final_error: error.is_finite().then_some(error),
        };
        let mut model_config = config.clone();
        model_config.none_feature.delta = Some(config.none_feature.delta.unwrap_or(corpus_delta));
        let model = IntentModel::new(encoder, classifier, model_config, metadata)?;
        Ok((model, result))
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Number of corpus intents over number of corpus features.
///
/// An explicit None intent counts; the synthetic none example does not.
fn none_delta(examples: &[TrainingExample]) -> f64 {
    let intents: AHashSet<Option<&str>> = examples.iter().map(TrainingExample::target).collect();
    let features: AHashSet<&str> = examples.iter().flat_map(|e| e.features.keys()).collect();
    intents.len() as f64 / features.len().max(1) as f64
}

/// One independent training job for [`train_many`].
#[derive(Debug, Clone)]
pub struct TrainingJob {
    /// Caller-chosen name, returned with the result.
    pub name: String,
    /// Hyperparameters.
    pub config: TrainingConfig,
    /// Corpus.
    pub examples: Vec<TrainingExample>,
}

/// Train several independent models in parallel.
///
/// Jobs share nothing, so each runs on its own rayon worker. Results come
/// back in job order.
pub fn train_many(jobs: Vec<TrainingJob>) -> Vec<(String, Result<(IntentModel, TrainingResult)>)> {
    jobs.into_par_iter()
        .map(|job| {
            let result = Trainer::new(job.config).train(&job.examples);
            (job.name, result)
        })
        .collect()
}
