//! Ordered set of weighted feature keys.
//!
//! A [`FeatureSet`] keeps its keys in first-insertion order. Vocabulary
//! indices are assigned in corpus order, so the iteration order of every
//! feature set has to be deterministic. Lookups go through a key index kept
//! next to the ordered list.
//!
//! # Examples
//!
//! ```
//! use glaive::analysis::FeatureSet;
//!
//! let mut features = FeatureSet::new();
//! features.insert("hello", 1.0);
//! features.insert("world", 1.0);
//! features.insert("hello", 2.0);
//!
//! assert_eq!(features.len(), 2);
//! assert_eq!(features.get("hello"), Some(2.0));
//! assert_eq!(features.keys().collect::<Vec<_>>(), vec!["hello", "world"]);
//! ```

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A single weighted feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Feature key, typically a stemmed token.
    pub key: String,
    /// Feature weight (1.0 for presence, or a frequency / TF-IDF style value).
    pub weight: f64,
}

/// Insertion-ordered, key-unique collection of weighted features.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Feature>", into = "Vec<Feature>")]
pub struct FeatureSet {
    features: Vec<Feature>,
    index: AHashMap<String, usize>,
}

impl FeatureSet {
    /// Create an empty feature set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a feature set where every key has weight 1.0.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        keys.into_iter().map(|key| (key, 1.0)).collect()
    }

    /// Insert a feature, replacing the weight if the key is already present.
    ///
    /// The position of an existing key does not change.
    pub fn insert<S: Into<String>>(&mut self, key: S, weight: f64) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => self.features[pos].weight = weight,
            None => {
                self.index.insert(key.clone(), self.features.len());
                self.features.push(Feature { key, weight });
            }
        }
    }

    /// Remove a feature and return its weight.
    pub fn remove(&mut self, key: &str) -> Option<f64> {
        let pos = self.index.remove(key)?;
        let removed = self.features.remove(pos);
        for feature in &self.features[pos..] {
            if let Some(slot) = self.index.get_mut(&feature.key) {
                *slot -= 1;
            }
        }
        Some(removed.weight)
    }

    /// Weight of a key, if present.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.index.get(key).map(|&pos| self.features[pos].weight)
    }

    /// Check whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Iterate over `(key, weight)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.features.iter().map(|f| (f.key.as_str(), f.weight))
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.key.as_str())
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check whether the set has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl PartialEq for FeatureSet {
    fn eq(&self, other: &Self) -> bool {
        self.features == other.features
    }
}

impl From<Vec<Feature>> for FeatureSet {
    fn from(features: Vec<Feature>) -> Self {
        features.into_iter().map(|f| (f.key, f.weight)).collect()
    }
}

impl From<FeatureSet> for Vec<Feature> {
    fn from(set: FeatureSet) -> Self {
        set.features
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut set = FeatureSet::new();
        for (key, weight) in iter {
            set.insert(key, weight);
        }
        set
    }
}

impl<S: Into<String>> Extend<(S, f64)> for FeatureSet {
    fn extend<I: IntoIterator<Item = (S, f64)>>(&mut self, iter: I) {
        for (key, weight) in iter {
            self.insert(key, weight);
        }
    }
}
