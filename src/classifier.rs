//! Intent classification core.
//!
//! A corpus of labelled feature sets is turned into two vocabularies
//! (features and labels), encoded into sparse vectors and used to train one
//! linear scoring unit per label. Scores are normalized with softmax, so the
//! confidences of one classification always sum to 1.
//!
//! # Architecture
//!
//! - [`Vocabulary`]: first-seen ordered key ↔ index mapping
//! - [`ExampleEncoder`]: feature sets and labels to sparse vectors
//! - [`LinearClassifier`]: dense `[labels × features]` weights plus biases
//! - [`Trainer`]: iteration loop, stopping rules, cancellation and progress
//! - [`IntentModel`]: immutable trained model (classify, run, explain)
//! - [`ModelSnapshot`]: lossless JSON / bincode persistence
//!
//! # Example
//!
//! ```
//! use glaive::analysis::FeatureSet;
//! use glaive::classifier::{self, TrainingConfig, TrainingExample};
//!
//! # fn main() -> glaive::error::Result<()> {
//! let examples = vec![
//!     TrainingExample::new(FeatureSet::from_keys(["hello"]), "greet"),
//!     TrainingExample::new(FeatureSet::from_keys(["bye"]), "farewell"),
//! ];
//!
//! let (model, result) = classifier::train(&examples, TrainingConfig::default())?;
//! let ranked = model.classify(&FeatureSet::from_keys(["hello"]));
//! assert_eq!(ranked[0].label, "greet");
//! assert!(result.iterations > 0);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod encoder;
pub mod linear;
pub mod model;
pub mod snapshot;
pub mod trainer;
pub mod types;
pub mod vocabulary;

use crate::analysis::FeatureSet;
use crate::error::Result;

pub use config::{NoneFeatureConfig, TrainingConfig, WeightInit};
pub use encoder::{EncodedExample, ExampleEncoder, SparseVector};
pub use linear::{LinearClassifier, softmax};
pub use model::{
    Classification, Evaluation, Explanation, FeatureContribution, IntentModel, ModelHandle,
    ModelMetadata,
};
pub use snapshot::{ModelSnapshot, ScoringUnitSnapshot, SnapshotFormat};
pub use trainer::{
    CancellationToken, Trainer, TrainingJob, TrainingProgress, TrainingResult, TrainingState,
    train_many,
};
pub use types::{LabelScore, NONE_FEATURE, NONE_LABEL, TrainingExample};
pub use vocabulary::Vocabulary;

/// Common interface of anything that can rank intents for a feature set.
pub trait IntentClassifier: Send + Sync {
    /// Rank intents for `features`.
    ///
    /// Returns [`Classification::Untrained`] when no trained state exists.
    fn predict(&self, features: &FeatureSet) -> Classification;

    /// Get the name of this classifier for debugging and logging.
    fn name(&self) -> &str;
}

/// Train a model with `config` and no progress or cancellation hooks.
pub fn train(
    examples: &[TrainingExample],
    config: TrainingConfig,
) -> Result<(IntentModel, TrainingResult)> {
    Trainer::new(config).train(examples)
}

/// Load a model snapshot (JSON or bincode) as a boxed classifier.
pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Box<dyn IntentClassifier>> {
    Ok(Box::new(IntentModel::load(path)?))
}
