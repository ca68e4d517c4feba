//! Bidirectional key ↔ dense index mapping.
//!
//! The same structure backs both the input feature vocabulary and the output
//! label vocabulary. Indices are handed out in first-seen order and never
//! change, because scoring-unit weight rows are addressed positionally.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::classifier::types::{NONE_LABEL, TrainingExample};
use crate::error::{GlaiveError, Result};

/// Append-only, insertion-ordered vocabulary.
///
/// Serialized as the plain list of keys in index order; the reverse map is
/// rebuilt on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    index: AHashMap<String, usize>,
    keys: Vec<String>,
}

impl Vocabulary {
    /// Create an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vocabulary from keys, in order. Duplicates keep their first index.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocabulary = Self::new();
        for key in keys {
            vocabulary.add(key);
        }
        vocabulary
    }

    /// Build the input feature vocabulary of a corpus, in corpus order.
    pub fn build_features(examples: &[TrainingExample]) -> Self {
        Self::from_keys(examples.iter().flat_map(|e| e.features.keys()))
    }

    /// Build the output label vocabulary of a corpus, in corpus order.
    ///
    /// Unlabelled examples contribute the None label.
    pub fn build_labels(examples: &[TrainingExample]) -> Self {
        Self::from_keys(examples.iter().map(|e| e.target().unwrap_or(NONE_LABEL)))
    }

    /// Add a key if unseen; returns its index either way.
    pub fn add<S: Into<String>>(&mut self, key: S) -> usize {
        let key = key.into();
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.keys.len();
        self.index.insert(key.clone(), idx);
        self.keys.push(key);
        idx
    }

    /// Index of a key, or `None` if it was never added.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Key stored at an index.
    pub fn key(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    /// Check whether a key is known.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in index order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl PartialEq for Vocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys
    }
}

impl Eq for Vocabulary {}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = GlaiveError;

    fn try_from(keys: Vec<String>) -> Result<Self> {
        let expected = keys.len();
        let vocabulary = Vocabulary::from_keys(keys);
        if vocabulary.len() != expected {
            return Err(GlaiveError::vocabulary(format!(
                "duplicate keys: {} entries but only {} distinct",
                expected,
                vocabulary.len()
            )));
        }
        Ok(vocabulary)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.keys
    }
}
