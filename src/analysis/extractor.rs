//! Feature extractors: raw text to [`FeatureSet`].
//!
//! # Examples
//!
//! ```
//! use glaive::analysis::{FeatureExtractor, SimpleFeatureExtractor};
//!
//! let extractor = SimpleFeatureExtractor::new();
//! let features = extractor.extract("en", "Hello, World! hello").unwrap();
//!
//! assert_eq!(features.keys().collect::<Vec<_>>(), vec!["hello", "world"]);
//! ```

use ahash::AHashSet;
use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::feature_set::FeatureSet;
use crate::error::Result;

/// Default English stop words list.
pub const DEFAULT_ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Converts text in a given locale into a set of weighted feature keys.
///
/// Implementations must be deterministic: the same `(locale, text)` must
/// always produce the same keys in the same order.
pub trait FeatureExtractor: Send + Sync {
    /// Extract features from `text`.
    fn extract(&self, locale: &str, text: &str) -> Result<FeatureSet>;

    /// Get the name of this extractor for debugging and logging.
    fn name(&self) -> &str;
}

/// Reference extractor: Unicode word segmentation, lowercasing and an
/// optional stopword list. Every surviving token is a feature of weight 1.
///
/// It knows nothing about stemming; plug a real language pipeline in through
/// [`FeatureExtractor`] for production corpora.
#[derive(Debug, Clone)]
pub struct SimpleFeatureExtractor {
    lowercase: bool,
    stop_words: AHashSet<String>,
}

impl Default for SimpleFeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleFeatureExtractor {
    /// Create an extractor that lowercases and keeps every word.
    pub fn new() -> Self {
        Self {
            lowercase: true,
            stop_words: AHashSet::new(),
        }
    }

    /// Drop the given words (compared after lowercasing, if enabled).
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = words.into_iter().map(Into::into).collect();
        self
    }

    /// Drop [`DEFAULT_ENGLISH_STOP_WORDS`].
    pub fn with_english_stop_words(self) -> Self {
        self.with_stop_words(DEFAULT_ENGLISH_STOP_WORDS.iter().copied())
    }

    /// Enable or disable lowercasing.
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }
}

impl FeatureExtractor for SimpleFeatureExtractor {
    fn extract(&self, _locale: &str, text: &str) -> Result<FeatureSet> {
        let mut features = FeatureSet::new();
        for word in text.unicode_words() {
            let token = if self.lowercase {
                word.to_lowercase()
            } else {
                word.to_string()
            };
            if self.stop_words.contains(&token) {
                continue;
            }
            features.insert(token, 1.0);
        }
        Ok(features)
    }

    fn name(&self) -> &str {
        "simple"
    }
}
