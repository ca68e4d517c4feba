//! Training hyperparameters.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GlaiveError, Result};

/// How scoring-unit weights are initialized before the first iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightInit {
    /// All weights and biases start at 0.
    #[default]
    Zeros,
    /// Weights drawn uniformly from `[-scale, scale)` with a fixed seed.
    Uniform {
        /// Half-width of the sampling interval.
        scale: f64,
        /// RNG seed; the same seed always yields the same weights.
        seed: u64,
    },
}

/// Settings of the synthetic none-feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoneFeatureConfig {
    /// Whether the none-feature is used when a locale has no override.
    pub enabled: bool,
    /// Per-locale overrides.
    pub locales: HashMap<String, bool>,
    /// Input value of the synthetic none example.
    pub value: f64,
    /// First increment of the inference none-feature value.
    ///
    /// When unset, training resolves it to the number of corpus intents over
    /// the number of corpus features and stores the result in the model.
    pub delta: Option<f64>,
}

impl Default for NoneFeatureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            locales: HashMap::new(),
            value: 1.0,
            delta: None,
        }
    }
}

impl NoneFeatureConfig {
    /// Whether the none-feature applies to `locale`.
    pub fn enabled_for(&self, locale: &str) -> bool {
        self.locales.get(locale).copied().unwrap_or(self.enabled)
    }
}

/// Hyperparameters of a training run.
///
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Locale of the corpus; selects the none-feature override.
    pub locale: String,
    /// Base learning rate.
    pub learning_rate: f64,
    /// Fraction of the previous change re-applied to each weight.
    pub momentum: f64,
    /// Learning rate decay: `lr / (1 + decay * iteration)`.
    pub decay: f64,
    /// Hard cap on the number of iterations.
    pub max_iterations: usize,
    /// Adaptive mode stops once the aggregate error is at or below this.
    pub error_threshold: f64,
    /// Adaptive mode stops once the error changes by at most this.
    pub delta_error_threshold: f64,
    /// Ignore the error trend and always run `max_iterations` iterations.
    pub fixed_error: bool,
    /// Error scale on None-targeted examples, and growth factor of the
    /// inference none-feature per unknown token.
    pub none_delta_multiplier: f64,
    /// Synthetic none-feature settings.
    pub none_feature: NoneFeatureConfig,
    /// Weight initialization.
    pub weight_init: WeightInit,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            learning_rate: 0.6,
            momentum: 0.5,
            decay: 0.001,
            max_iterations: 20_000,
            error_threshold: 0.00005,
            delta_error_threshold: 0.000001,
            fixed_error: false,
            none_delta_multiplier: 1.2,
            none_feature: NoneFeatureConfig::default(),
            weight_init: WeightInit::Zeros,
        }
    }
}

impl TrainingConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TrainingConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject hyperparameter values training cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(GlaiveError::config(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(GlaiveError::config(format!(
                "momentum must be in [0, 1), got {}",
                self.momentum
            )));
        }
        if !self.decay.is_finite() || self.decay < 0.0 {
            return Err(GlaiveError::config(format!(
                "decay must be non-negative, got {}",
                self.decay
            )));
        }
        if self.max_iterations == 0 {
            return Err(GlaiveError::config("max_iterations must be at least 1"));
        }
        if self.error_threshold < 0.0 || self.delta_error_threshold < 0.0 {
            return Err(GlaiveError::config("error thresholds must be non-negative"));
        }
        if !self.none_delta_multiplier.is_finite() || self.none_delta_multiplier <= 0.0 {
            return Err(GlaiveError::config(format!(
                "none_delta_multiplier must be positive, got {}",
                self.none_delta_multiplier
            )));
        }
        if !self.none_feature.value.is_finite() || self.none_feature.value <= 0.0 {
            return Err(GlaiveError::config("none_feature.value must be positive"));
        }
        if let Some(delta) = self.none_feature.delta
            && (!delta.is_finite() || delta <= 0.0)
        {
            return Err(GlaiveError::config(format!(
                "none_feature.delta must be positive, got {delta}"
            )));
        }
        if let WeightInit::Uniform { scale, .. } = self.weight_init
            && (!scale.is_finite() || scale <= 0.0)
        {
            return Err(GlaiveError::config(format!(
                "uniform weight init scale must be positive, got {scale}"
            )));
        }
        Ok(())
    }

    /// Thresholds actually applied for a model with `label_count` labels.
    ///
    /// Adaptive mode loosens both thresholds past 50 labels.
    pub fn effective_thresholds(&self, label_count: usize) -> (f64, f64) {
        if !self.fixed_error && label_count > 50 {
            let scale = 50.0 / label_count as f64;
            (
                self.error_threshold * scale,
                self.delta_error_threshold * scale,
            )
        } else {
            (self.error_threshold, self.delta_error_threshold)
        }
    }

    /// Learning rate at a 1-based iteration.
    pub fn learning_rate_at(&self, iteration: usize) -> f64 {
        self.learning_rate / (1.0 + self.decay * iteration as f64)
    }
}
