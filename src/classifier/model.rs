//! Trained intent model and inference.
//!
//! An [`IntentModel`] is immutable once produced by the trainer or loaded
//! from a snapshot. Every inference method is a pure read, so one model can
//! be shared across threads behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::FeatureSet;
use crate::classifier::IntentClassifier;
use crate::classifier::config::TrainingConfig;
use crate::classifier::encoder::{ExampleEncoder, SparseVector};
use crate::classifier::linear::LinearClassifier;
use crate::classifier::types::{LabelScore, NONE_FEATURE, NONE_LABEL};
use crate::error::{GlaiveError, Result};

/// Information about how a model was trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Training timestamp.
    pub trained_at: chrono::DateTime<chrono::Utc>,
    /// Number of encoded training examples, synthetic none example included.
    pub training_examples: usize,
    /// Completed iterations.
    pub iterations: usize,
    /// Final aggregate error, absent when no iteration completed.
    pub final_error: Option<f64>,
}

/// Result of classifying against a model that may not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// No trained state is available.
    Untrained,
    /// Labels ranked by descending confidence.
    Ranked(Vec<LabelScore>),
}

impl Classification {
    /// Check whether a trained model produced this result.
    pub fn is_trained(&self) -> bool {
        matches!(self, Classification::Ranked(_))
    }

    /// Ranked scores, if trained.
    pub fn scores(&self) -> Option<&[LabelScore]> {
        match self {
            Classification::Untrained => None,
            Classification::Ranked(scores) => Some(scores),
        }
    }

    /// Best label, if trained.
    pub fn top(&self) -> Option<&LabelScore> {
        self.scores().and_then(|scores| scores.first())
    }
}

/// One active feature's share of a raw score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    /// Feature key.
    pub feature: String,
    /// Input value of the feature.
    pub value: f64,
    /// Learned weight of the feature for the explained label.
    pub weight: f64,
    /// `weight * value`.
    pub contribution: f64,
}

/// Breakdown of a label's raw score for one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Explained label.
    pub label: String,
    /// Contributions of the active features, in input order.
    pub contributions: Vec<FeatureContribution>,
    /// Bias of the label's scoring unit.
    pub bias: f64,
    /// Raw (pre-normalization) score.
    pub raw_score: f64,
}

impl Explanation {
    /// Sum of all contributions plus the bias.
    pub fn total(&self) -> f64 {
        self.contributions
            .iter()
            .fold(self.bias, |sum, c| sum + c.contribution)
    }
}

/// Outcome of [`IntentModel::evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Number of evaluated samples.
    pub total: usize,
    /// Samples whose top label matched the expected intent.
    pub correct: usize,
    /// `correct / total`, 0 for an empty set.
    pub accuracy: f64,
    /// Per-sample hit flags, in input order.
    pub hits: Vec<bool>,
}

/// A trained intent classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentModel {
    encoder: ExampleEncoder,
    classifier: LinearClassifier,
    config: TrainingConfig,
    metadata: ModelMetadata,
}

impl IntentModel {
    /// Assemble a model, checking that the scoring units fit the vocabularies.
    pub fn new(
        encoder: ExampleEncoder,
        classifier: LinearClassifier,
        config: TrainingConfig,
        metadata: ModelMetadata,
    ) -> Result<Self> {
        if classifier.num_labels() != encoder.labels().len() {
            return Err(GlaiveError::invalid_argument(format!(
                "{} scoring units for {} labels",
                classifier.num_labels(),
                encoder.labels().len()
            )));
        }
        if classifier.num_features() != encoder.features().len() {
            return Err(GlaiveError::invalid_argument(format!(
                "scoring units expect {} features, vocabulary has {}",
                classifier.num_features(),
                encoder.features().len()
            )));
        }
        Ok(Self {
            encoder,
            classifier,
            config,
            metadata,
        })
    }

    pub fn encoder(&self) -> &ExampleEncoder {
        &self.encoder
    }

    pub fn classifier(&self) -> &LinearClassifier {
        &self.classifier
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Labels in vocabulary order.
    pub fn labels(&self) -> &[String] {
        self.encoder.labels().keys()
    }

    /// Encode an input, adding the none-feature for unknown keys.
    ///
    /// Unknown keys are dropped. If the model was trained with the
    /// none-feature, `u` unknown keys add `__none__` with value
    /// `Σ_{k<u} delta_0 * multiplier^k`, capped at `f64::MAX`. `delta_0`
    /// is the none-feature delta resolved at training time.
    pub fn prepare_input(&self, features: &FeatureSet) -> SparseVector {
        let vocabulary = self.encoder.features();
        let mut input = SparseVector::new();
        let mut unknown = 0;
        for (key, weight) in features.iter() {
            if key == NONE_FEATURE || weight == 0.0 {
                continue;
            }
            match vocabulary.index_of(key) {
                Some(index) => input.push(index, weight),
                None => unknown += 1,
            }
        }

        if unknown > 0
            && let Some(index) = vocabulary.index_of(NONE_FEATURE)
        {
            input.push(index, self.none_feature_value(unknown));
        }
        input
    }

    fn none_feature_value(&self, unknown: usize) -> f64 {
        let multiplier = self.config.none_delta_multiplier;
        let mut value = 0.0;
        let mut step = self.none_delta();
        for _ in 0..unknown {
            value += step;
            if !value.is_finite() {
                return f64::MAX;
            }
            step *= multiplier;
        }
        value
    }

    /// First none-feature increment.
    ///
    /// Snapshots written without a resolved delta fall back to real labels
    /// over real features.
    fn none_delta(&self) -> f64 {
        if let Some(delta) = self.config.none_feature.delta {
            return delta;
        }
        let vocabulary = self.encoder.features();
        let labels = self.encoder.labels().len().saturating_sub(1);
        let features = vocabulary.len() - usize::from(vocabulary.contains(NONE_FEATURE));
        labels as f64 / features.max(1) as f64
    }

    /// Raw scores of every label, in label order.
    pub fn raw_scores(&self, features: &FeatureSet) -> Vec<f64> {
        self.classifier.scores(&self.prepare_input(features))
    }

    /// Confidence of every label.
    pub fn run(&self, features: &FeatureSet) -> HashMap<String, f64> {
        let confidences = self.classifier.run(&self.prepare_input(features));
        self.labels()
            .iter()
            .cloned()
            .zip(confidences)
            .collect()
    }

    /// Labels ranked by descending confidence.
    ///
    /// Equal confidences keep vocabulary order.
    pub fn classify(&self, features: &FeatureSet) -> Vec<LabelScore> {
        let confidences = self.classifier.run(&self.prepare_input(features));
        let mut ranked: Vec<LabelScore> = self
            .labels()
            .iter()
            .zip(confidences)
            .map(|(label, score)| LabelScore {
                label: label.clone(),
                score,
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }

    /// Classify many inputs in parallel. Output order follows input order.
    pub fn classify_batch(&self, inputs: &[FeatureSet]) -> Vec<Vec<LabelScore>> {
        inputs.par_iter().map(|input| self.classify(input)).collect()
    }

    /// Per-feature breakdown of `label`'s raw score, or `None` for an
    /// unknown label.
    pub fn explain(&self, features: &FeatureSet, label: &str) -> Option<Explanation> {
        let label_index = self.encoder.labels().index_of(label)?;
        let input = self.prepare_input(features);

        let contributions = input
            .iter()
            .filter_map(|(index, value)| {
                let feature = self.encoder.features().key(index)?;
                let weight = self.classifier.weight(label_index, index);
                Some(FeatureContribution {
                    feature: feature.to_string(),
                    value,
                    weight,
                    contribution: weight * value,
                })
            })
            .collect();

        Some(Explanation {
            label: label.to_string(),
            contributions,
            bias: self.classifier.bias(label_index),
            raw_score: self.classifier.raw_score(label_index, &input),
        })
    }

    /// Top-label accuracy over labelled samples.
    ///
    /// Blank and `"None"` expectations both mean the None label.
    pub fn evaluate(&self, samples: &[(FeatureSet, String)]) -> Evaluation {
        let hits: Vec<bool> = samples
            .par_iter()
            .map(|(features, expected)| {
                let expected = if expected.is_empty() {
                    NONE_LABEL
                } else {
                    expected.as_str()
                };
                self.classify(features)
                    .first()
                    .is_some_and(|top| top.label == expected)
            })
            .collect();

        let correct = hits.iter().filter(|hit| **hit).count();
        let accuracy = if hits.is_empty() {
            0.0
        } else {
            correct as f64 / hits.len() as f64
        };
        Evaluation {
            total: hits.len(),
            correct,
            accuracy,
            hits,
        }
    }
}

impl IntentClassifier for IntentModel {
    fn predict(&self, features: &FeatureSet) -> Classification {
        Classification::Ranked(self.classify(features))
    }

    fn name(&self) -> &str {
        "linear"
    }
}

/// Shared slot holding the model currently serving inference.
///
/// Readers clone the inner `Arc` and classify without holding the lock, so a
/// replacement never blocks on running classifications and readers never
/// see a half-trained model.
#[derive(Debug, Default)]
pub struct ModelHandle {
    model: RwLock<Option<Arc<IntentModel>>>,
}

impl ModelHandle {
    /// Create an empty handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle serving `model`.
    pub fn with_model(model: IntentModel) -> Self {
        Self {
            model: RwLock::new(Some(Arc::new(model))),
        }
    }

    /// Swap in a fully trained model, returning the previous one.
    pub fn replace(&self, model: IntentModel) -> Option<Arc<IntentModel>> {
        self.model.write().replace(Arc::new(model))
    }

    /// Remove the current model.
    pub fn clear(&self) -> Option<Arc<IntentModel>> {
        self.model.write().take()
    }

    /// The model currently served.
    pub fn current(&self) -> Option<Arc<IntentModel>> {
        self.model.read().clone()
    }

    pub fn is_trained(&self) -> bool {
        self.model.read().is_some()
    }

    /// Classify against the current model.
    pub fn classify(&self, features: &FeatureSet) -> Classification {
        match self.current() {
            Some(model) => Classification::Ranked(model.classify(features)),
            None => Classification::Untrained,
        }
    }

    /// Explain against the current model.
    pub fn explain(&self, features: &FeatureSet, label: &str) -> Option<Explanation> {
        self.current()?.explain(features, label)
    }
}

impl IntentClassifier for ModelHandle {
    fn predict(&self, features: &FeatureSet) -> Classification {
        self.classify(features)
    }

    fn name(&self) -> &str {
        "handle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::trainer::Trainer;
    use crate::classifier::types::TrainingExample;
    use crate::classifier::vocabulary::Vocabulary;

    fn trained() -> IntentModel {
        let examples = vec![
            TrainingExample::new(FeatureSet::from_keys(["hello"]), "greet"),
            TrainingExample::new(FeatureSet::from_keys(["hi"]), "greet"),
            TrainingExample::new(FeatureSet::from_keys(["bye"]), "farewell"),
            TrainingExample::new(FeatureSet::from_keys(["goodbye"]), "farewell"),
        ];
        Trainer::default().train(&examples).unwrap().0
    }

    fn metadata() -> ModelMetadata {
        ModelMetadata {
            trained_at: chrono::Utc::now(),
            training_examples: 0,
            iterations: 0,
            final_error: None,
        }
    }

    #[test]
    fn test_new_rejects_mismatched_shapes() {
        let encoder = ExampleEncoder::new(
            Vocabulary::from_keys(["a", "b"]),
            Vocabulary::from_keys(["x"]),
        )
        .unwrap();
        let result = IntentModel::new(
            encoder.clone(),
            LinearClassifier::new(3, 2),
            TrainingConfig::default(),
            metadata(),
        );
        assert!(result.is_err());

        let result = IntentModel::new(
            encoder,
            LinearClassifier::new(2, 2),
            TrainingConfig::default(),
            metadata(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_none_feature_value_grows_geometrically() {
        let model = trained();
        // 2 real labels over 4 real features.
        assert!((model.none_feature_value(1) - 0.5).abs() < 1e-12);
        assert!((model.none_feature_value(2) - (0.5 + 0.6)).abs() < 1e-12);
        assert_eq!(model.none_feature_value(0), 0.0);
    }

    #[test]
    fn test_none_feature_value_is_capped() {
        let model = trained();
        assert_eq!(model.none_feature_value(5_000), f64::MAX);

        let unknown: FeatureSet = (0..4_000).map(|i| (format!("unknown-{i}"), 1.0)).collect();
        let ranked = model.classify(&unknown);
        let total: f64 = ranked.iter().map(|s| s.score).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(ranked[0].label, NONE_LABEL);
    }

    #[test]
    fn test_none_delta_counts_explicit_none_intent() {
        let examples = vec![
            TrainingExample::new(FeatureSet::from_keys(["hello"]), "greet"),
            TrainingExample::new(FeatureSet::from_keys(["bye"]), "farewell"),
            TrainingExample::none(FeatureSet::from_keys(["meh", "whatever"])),
        ];
        let (model, _) = Trainer::default().train(&examples).unwrap();
        // greet, farewell and None over four corpus features.
        assert_eq!(model.config().none_feature.delta, Some(0.75));
        assert!((model.none_feature_value(1) - 0.75).abs() < 1e-12);

        let mut config = TrainingConfig::default();
        config.none_feature.delta = Some(0.1);
        let (model, _) = Trainer::new(config).train(&examples).unwrap();
        assert_eq!(model.config().none_feature.delta, Some(0.1));
        assert!((model.none_feature_value(2) - (0.1 + 0.12)).abs() < 1e-12);
    }

    #[test]
    fn test_prepare_input_adds_none_feature_for_unknown_keys() {
        let model = trained();
        let none_index = model.encoder().features().index_of(NONE_FEATURE).unwrap();

        let known = model.prepare_input(&FeatureSet::from_keys(["hello"]));
        assert_eq!(known.get(none_index), 0.0);

        let mixed = model.prepare_input(&FeatureSet::from_keys(["hello", "zzz"]));
        assert_eq!(mixed.len(), 2);
        assert!(mixed.get(none_index) > 0.0);

        // The reserved key is never taken from caller input.
        let reserved = model.prepare_input(&FeatureSet::from_keys([NONE_FEATURE]));
        assert!(reserved.is_empty());
    }

    #[test]
    fn test_classify_ranks_descending() {
        let model = trained();
        let ranked = model.classify(&FeatureSet::from_keys(["bye"]));
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].label, "farewell");
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));

        let map = model.run(&FeatureSet::from_keys(["bye"]));
        assert_eq!(map.len(), 3);
        assert!((map["farewell"] - ranked[0].score).abs() < 1e-15);
    }

    #[test]
    fn test_ties_keep_vocabulary_order() {
        let encoder = ExampleEncoder::new(
            Vocabulary::from_keys(["a"]),
            Vocabulary::from_keys(["x", "y"]),
        )
        .unwrap();
        let model = IntentModel::new(
            encoder,
            LinearClassifier::new(3, 1),
            TrainingConfig::default(),
            metadata(),
        )
        .unwrap();
        let labels: Vec<_> = model
            .classify(&FeatureSet::from_keys(["a"]))
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, ["x", "y", "None"]);
    }

    #[test]
    fn test_explain_matches_raw_score() {
        let model = trained();
        let input = FeatureSet::from_keys(["hello", "unknown"]);
        let raw = model.raw_scores(&input);
        for (index, label) in model.labels().iter().enumerate() {
            let explanation = model.explain(&input, label).unwrap();
            assert!((explanation.total() - raw[index]).abs() < 1e-9);
            assert!((explanation.raw_score - raw[index]).abs() < 1e-12);
        }

        let explanation = model.explain(&input, "greet").unwrap();
        let keys: Vec<_> = explanation
            .contributions
            .iter()
            .map(|c| c.feature.as_str())
            .collect();
        assert_eq!(keys, ["hello", NONE_FEATURE]);

        assert!(model.explain(&input, "missing").is_none());
    }

    #[test]
    fn test_evaluate() {
        let model = trained();
        let samples = vec![
            (FeatureSet::from_keys(["hello"]), "greet".to_string()),
            (FeatureSet::from_keys(["bye"]), "farewell".to_string()),
            (FeatureSet::from_keys(["hi"]), "farewell".to_string()),
        ];
        let evaluation = model.evaluate(&samples);
        assert_eq!(evaluation.total, 3);
        assert_eq!(evaluation.correct, 2);
        assert_eq!(evaluation.hits, vec![true, true, false]);
        assert!((evaluation.accuracy - 2.0 / 3.0).abs() < 1e-12);

        assert_eq!(model.evaluate(&[]).accuracy, 0.0);
    }

    #[test]
    fn test_handle_reports_untrained() {
        let handle = ModelHandle::new();
        let input = FeatureSet::from_keys(["hello"]);
        assert!(!handle.is_trained());
        assert_eq!(handle.classify(&input), Classification::Untrained);
        assert!(handle.explain(&input, "greet").is_none());

        assert!(handle.replace(trained()).is_none());
        let result = handle.predict(&input);
        assert_eq!(result.top().map(|s| s.label.as_str()), Some("greet"));

        assert!(handle.clear().is_some());
        assert!(!handle.classify(&input).is_trained());
    }
}
