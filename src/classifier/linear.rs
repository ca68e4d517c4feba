//! Linear scoring units with softmax normalization.
//!
//! One scoring unit per label. The raw score of label `L` for input `x` is
//! `bias[L] + Σ weight[L][i] * x[i]` over the active entries of `x`; raw
//! scores are turned into confidences with a max-shifted softmax.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::classifier::config::WeightInit;
use crate::classifier::encoder::{EncodedExample, SparseVector};
use crate::error::{GlaiveError, Result};

/// Convert raw scores into confidences that sum to 1.
///
/// The maximum score is subtracted before exponentiating, so large scores
/// cannot overflow. NaN scores count as `-inf`. When some scores are
/// `+inf` they share the whole mass; when every score is `-inf` the mass is
/// spread evenly.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let scores: Vec<f64> = scores
        .iter()
        .map(|&s| if s.is_nan() { f64::NEG_INFINITY } else { s })
        .collect();
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max == f64::INFINITY {
        let winners = scores.iter().filter(|s| **s == f64::INFINITY).count();
        let share = 1.0 / winners as f64;
        return scores
            .iter()
            .map(|s| if *s == f64::INFINITY { share } else { 0.0 })
            .collect();
    }
    if max == f64::NEG_INFINITY {
        return vec![1.0 / scores.len() as f64; scores.len()];
    }

    let mut exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    for value in &mut exps {
        *value /= total;
    }
    exps
}

/// Per-step update parameters.
#[derive(Debug, Clone, Copy)]
pub struct UpdateStep {
    /// Learning rate for this iteration.
    pub learning_rate: f64,
    /// Momentum factor.
    pub momentum: f64,
    /// Multiplier applied to this example's error vector.
    pub error_scale: f64,
}

/// Previous change of every weight, used by momentum.
///
/// Biases take the plain delta and keep no history.
#[derive(Debug, Clone)]
pub struct MomentumBuffers {
    weight_changes: Vec<f64>,
}

impl MomentumBuffers {
    /// Zeroed buffers shaped like `classifier`.
    pub fn for_classifier(classifier: &LinearClassifier) -> Self {
        Self {
            weight_changes: vec![0.0; classifier.weights.len()],
        }
    }
}

/// Dense `[labels × features]` weight matrix plus one bias per label.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearClassifier {
    num_labels: usize,
    num_features: usize,
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl LinearClassifier {
    /// Create a classifier with zero weights and biases.
    pub fn new(num_labels: usize, num_features: usize) -> Self {
        Self {
            num_labels,
            num_features,
            weights: vec![0.0; num_labels * num_features],
            biases: vec![0.0; num_labels],
        }
    }

    /// Create a classifier initialized according to `init`. Biases start at 0.
    pub fn with_init(num_labels: usize, num_features: usize, init: &WeightInit) -> Self {
        let mut classifier = Self::new(num_labels, num_features);
        if let WeightInit::Uniform { scale, seed } = *init {
            let mut rng = StdRng::seed_from_u64(seed);
            for weight in &mut classifier.weights {
                *weight = rng.random_range(-scale..scale);
            }
        }
        classifier
    }

    /// Rebuild a classifier from per-label weight rows and biases.
    pub fn from_rows(rows: Vec<Vec<f64>>, biases: Vec<f64>, num_features: usize) -> Result<Self> {
        if rows.len() != biases.len() {
            return Err(GlaiveError::snapshot(format!(
                "{} weight rows but {} biases",
                rows.len(),
                biases.len()
            )));
        }
        let num_labels = rows.len();
        let mut weights = Vec::with_capacity(num_labels * num_features);
        for (label, row) in rows.into_iter().enumerate() {
            if row.len() != num_features {
                return Err(GlaiveError::snapshot(format!(
                    "label {label} has {} weights, expected {num_features}",
                    row.len()
                )));
            }
            weights.extend(row);
        }
        if weights.iter().chain(biases.iter()).any(|v| !v.is_finite()) {
            return Err(GlaiveError::snapshot("non-finite weight or bias"));
        }
        Ok(Self {
            num_labels,
            num_features,
            weights,
            biases,
        })
    }

    /// Number of labels (scoring units).
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// Number of input features per unit.
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Weight row of a label.
    pub fn row(&self, label: usize) -> &[f64] {
        let start = label * self.num_features;
        &self.weights[start..start + self.num_features]
    }

    /// Weight of `feature` in `label`'s unit.
    pub fn weight(&self, label: usize, feature: usize) -> f64 {
        self.weights[label * self.num_features + feature]
    }

    /// Bias of a label.
    pub fn bias(&self, label: usize) -> f64 {
        self.biases[label]
    }

    /// All biases in label order.
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    /// Raw score of one label.
    pub fn raw_score(&self, label: usize, input: &SparseVector) -> f64 {
        let row = self.row(label);
        input
            .iter()
            .fold(self.biases[label], |sum, (i, x)| sum + row[i] * x)
    }

    /// Raw scores of every label, in label order.
    pub fn scores(&self, input: &SparseVector) -> Vec<f64> {
        (0..self.num_labels)
            .map(|label| self.raw_score(label, input))
            .collect()
    }

    /// Normalized confidences of every label, in label order.
    pub fn run(&self, input: &SparseVector) -> Vec<f64> {
        softmax(&self.scores(input))
    }

    /// Apply one delta-rule update for a single example.
    ///
    /// Returns the sum over labels of the squared (unscaled) error.
    pub fn train_example(
        &mut self,
        example: &EncodedExample,
        step: UpdateStep,
        buffers: &mut MomentumBuffers,
    ) -> f64 {
        let confidences = self.run(&example.input);
        let mut squared_error = 0.0;

        for (label, confidence) in confidences.into_iter().enumerate() {
            let error = example.target(label) - confidence;
            squared_error += error * error;

            let delta = step.learning_rate * error * step.error_scale;
            let offset = label * self.num_features;
            for (i, x) in example.input.iter() {
                let slot = offset + i;
                let change = delta * x + step.momentum * buffers.weight_changes[slot];
                buffers.weight_changes[slot] = change;
                self.weights[slot] += change;
            }

            self.biases[label] += delta;
        }

        squared_error
    }

    /// Run one full pass over `examples`.
    ///
    /// Examples that target `none_label` have their error scaled by
    /// `none_multiplier` on top of `step.error_scale`. Returns the mean
    /// squared error over every example and label.
    pub fn train_iteration(
        &mut self,
        examples: &[EncodedExample],
        step: UpdateStep,
        none_label: usize,
        none_multiplier: f64,
        buffers: &mut MomentumBuffers,
    ) -> f64 {
        if examples.is_empty() || self.num_labels == 0 {
            return 0.0;
        }
        let mut total = 0.0;
        for example in examples {
            let example_step = if example.target(none_label) > 0.0 {
                UpdateStep {
                    error_scale: step.error_scale * none_multiplier,
                    ..step
                }
            } else {
                step
            };
            total += self.train_example(example, example_step, buffers);
        }
        total / (examples.len() * self.num_labels) as f64
    }
}
