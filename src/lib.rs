//! # Glaive
//!
//! Intent classification for short utterances.
//!
//! Glaive learns one linear scoring unit per intent from labelled feature
//! sets and ranks intents for new input by softmax confidence, with an
//! explicit `None` outcome for input that matches no known intent.
//!
//! ## Features
//!
//! - Deterministic vocabularies built in corpus order
//! - Delta-rule training with momentum and learning-rate decay
//! - Fixed or adaptive stopping, cooperative cancellation, progress hooks
//! - Per-feature score explanations
//! - Lossless JSON and bincode model snapshots
//!
//! Text processing is pluggable through [`analysis::FeatureExtractor`].

pub mod analysis;
pub mod classifier;
pub mod cli;
pub mod corpus;
pub mod error;

pub mod prelude {
    pub use crate::analysis::{FeatureExtractor, FeatureSet, SimpleFeatureExtractor};
    pub use crate::classifier::{
        CancellationToken, Classification, IntentClassifier, IntentModel, ModelHandle,
        Trainer, TrainingConfig, TrainingExample, TrainingResult,
    };
    pub use crate::corpus::Corpus;
    pub use crate::error::{GlaiveError, Result};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
