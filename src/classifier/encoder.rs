//! Sparse encoding of feature sets and labelled corpora.

use serde::{Deserialize, Serialize};

use crate::analysis::FeatureSet;
use crate::classifier::types::{NONE_LABEL, TrainingExample};
use crate::classifier::vocabulary::Vocabulary;
use crate::error::{GlaiveError, Result};

/// Sparse `(index, value)` vector in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    /// Create an empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, index: usize, value: f64) {
        self.entries.push((index, value));
    }

    /// Iterate over active `(index, value)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Value at `index`, 0.0 when inactive.
    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .iter()
            .find(|(i, _)| *i == index)
            .map_or(0.0, |(_, v)| *v)
    }

    /// Number of active entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no entry is active.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An encoded training example.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedExample {
    /// Active input features.
    pub input: SparseVector,
    /// Target label values; labels absent here have target 0.
    pub output: SparseVector,
}

impl EncodedExample {
    /// Target value for a label index.
    pub fn target(&self, label: usize) -> f64 {
        self.output.get(label)
    }
}

/// Encode a feature set against a vocabulary.
///
/// Unknown keys and zero weights are skipped: they cannot contribute to a
/// score.
pub fn encode(features: &FeatureSet, vocabulary: &Vocabulary) -> SparseVector {
    let mut vector = SparseVector::new();
    for (key, weight) in features.iter() {
        if weight == 0.0 {
            continue;
        }
        if let Some(index) = vocabulary.index_of(key) {
            vector.push(index, weight);
        }
    }
    vector
}

/// Feature and label vocabularies bundled with the encoding rules.
///
/// The label vocabulary always contains [`NONE_LABEL`]; when a corpus does
/// not mention it, it is appended after every corpus label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleEncoder {
    features: Vocabulary,
    labels: Vocabulary,
}

impl ExampleEncoder {
    /// Create an encoder from prebuilt vocabularies.
    pub fn new(features: Vocabulary, mut labels: Vocabulary) -> Result<Self> {
        labels.add(NONE_LABEL);
        if labels.len() < 2 {
            return Err(GlaiveError::vocabulary(
                "label vocabulary needs at least one intent besides None",
            ));
        }
        Ok(Self { features, labels })
    }

    /// Build both vocabularies from a corpus, in corpus order.
    pub fn from_corpus(examples: &[TrainingExample]) -> Result<Self> {
        Self::new(
            Vocabulary::build_features(examples),
            Vocabulary::build_labels(examples),
        )
    }

    /// Encode an input feature set.
    pub fn encode(&self, features: &FeatureSet) -> SparseVector {
        encode(features, &self.features)
    }

    /// Encode a target label; unknown labels encode to nothing.
    pub fn encode_output(&self, intent: Option<&str>) -> SparseVector {
        let mut output = SparseVector::new();
        if let Some(index) = self.labels.index_of(intent.unwrap_or(NONE_LABEL)) {
            output.push(index, 1.0);
        }
        output
    }

    /// Encode a single labelled example.
    pub fn encode_example(&self, example: &TrainingExample) -> EncodedExample {
        EncodedExample {
            input: self.encode(&example.features),
            output: self.encode_output(example.target()),
        }
    }

    /// Encode a whole corpus.
    pub fn encode_corpus(&self, examples: &[TrainingExample]) -> Vec<EncodedExample> {
        examples.iter().map(|e| self.encode_example(e)).collect()
    }

    /// Input feature vocabulary.
    pub fn features(&self) -> &Vocabulary {
        &self.features
    }

    /// Output label vocabulary.
    pub fn labels(&self) -> &Vocabulary {
        &self.labels
    }

    /// Index of the None label.
    pub fn none_label(&self) -> usize {
        // Inserted by `new`, so the lookup cannot miss.
        self.labels.index_of(NONE_LABEL).unwrap_or(self.labels.len() - 1)
    }
}
