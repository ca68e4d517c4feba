//! Corpus documents.
//!
//! A corpus groups example utterances by intent:
//!
//! ```json
//! {
//!   "name": "Greetings",
//!   "locale": "en-US",
//!   "data": [
//!     { "intent": "greet", "utterances": ["hello", "hi there"] },
//!     { "intent": "farewell", "utterances": ["bye"] }
//!   ]
//! }
//! ```
//!
//! Unknown fields (answers, entities, ...) are ignored. Utterances become
//! [`TrainingExample`]s through an injected [`FeatureExtractor`].

use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::FeatureExtractor;
use crate::classifier::TrainingExample;
use crate::error::{GlaiveError, Result};

fn default_locale() -> String {
    "en".to_string()
}

/// Utterances of one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentData {
    pub intent: String,
    #[serde(default)]
    pub utterances: Vec<String>,
}

/// A named, single-locale training corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub data: Vec<IntentData>,
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new("", default_locale())
    }
}

impl Corpus {
    /// Create an empty corpus.
    pub fn new<N: Into<String>, L: Into<String>>(name: N, locale: L) -> Self {
        Self {
            name: name.into(),
            locale: locale.into(),
            data: Vec::new(),
        }
    }

    /// Parse a corpus document.
    pub fn from_json(json: &str) -> Result<Self> {
        let corpus: Corpus = serde_json::from_str(json)?;
        if corpus.data.iter().any(|d| d.intent.trim().is_empty()) {
            return Err(GlaiveError::corpus("intent names must not be blank"));
        }
        Ok(corpus)
    }

    /// Load a corpus document from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize as a pretty-printed corpus document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Language part of the locale (`"en-US"` → `"en"`).
    pub fn language(&self) -> &str {
        match self.locale.char_indices().nth(2) {
            Some((end, _)) => &self.locale[..end],
            None => &self.locale,
        }
    }

    /// Add an utterance, creating the intent entry if needed.
    pub fn add<I: Into<String>, U: Into<String>>(&mut self, intent: I, utterance: U) {
        let intent = intent.into();
        let utterance = utterance.into();
        match self.data.iter_mut().find(|d| d.intent == intent) {
            Some(entry) => entry.utterances.push(utterance),
            None => self.data.push(IntentData {
                intent,
                utterances: vec![utterance],
            }),
        }
    }

    /// Intent names in document order.
    pub fn intents(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|d| d.intent.as_str())
    }

    /// `(utterance, intent)` pairs in document order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter().flat_map(|d| {
            d.utterances
                .iter()
                .map(move |u| (u.as_str(), d.intent.as_str()))
        })
    }

    /// Total number of utterances.
    pub fn len(&self) -> usize {
        self.data.iter().map(|d| d.utterances.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Turn every utterance into a training example.
    pub fn examples(&self, extractor: &dyn FeatureExtractor) -> Result<Vec<TrainingExample>> {
        let locale = self.language();
        let mut examples = Vec::with_capacity(self.len());
        for (utterance, intent) in self.pairs() {
            let features = extractor.extract(locale, utterance)?;
            if features.is_empty() {
                warn!("utterance {utterance:?} of intent {intent:?} produced no features");
            }
            examples.push(TrainingExample::new(features, intent));
        }
        debug!(
            "extracted {} examples from corpus {:?} with {}",
            examples.len(),
            self.name,
            extractor.name()
        );
        Ok(examples)
    }
}
