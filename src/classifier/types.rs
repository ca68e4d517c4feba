//! Common types for intent classification.

use serde::{Deserialize, Serialize};

use crate::analysis::FeatureSet;

/// Name of the designated "no matching intent" label.
pub const NONE_LABEL: &str = "None";

/// Reserved feature key carrying the none-feature signal.
pub const NONE_FEATURE: &str = "__none__";

/// Training sample for intent classification.
///
/// An example without an intent (or with the intent `"None"`) trains the
/// None label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Features extracted from the utterance.
    pub features: FeatureSet,
    /// Intent label.
    #[serde(default)]
    pub intent: Option<String>,
}

impl TrainingExample {
    /// Create an example labelled with `intent`.
    pub fn new<S: Into<String>>(features: FeatureSet, intent: S) -> Self {
        Self {
            features,
            intent: Some(intent.into()),
        }
    }

    /// Create an example that targets the None label.
    pub fn none(features: FeatureSet) -> Self {
        Self {
            features,
            intent: None,
        }
    }

    /// The intent this example trains, with blanks and `"None"` folded to `None`.
    pub fn target(&self) -> Option<&str> {
        match self.intent.as_deref() {
            None | Some("") | Some(NONE_LABEL) => None,
            Some(intent) => Some(intent),
        }
    }
}

/// A label with its normalized confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    /// Intent label.
    pub label: String,
    /// Confidence in [0, 1].
    pub score: f64,
}
