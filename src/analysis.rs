//! Text-to-feature boundary for Glaive.
//!
//! The classification core never looks at raw text. It consumes
//! [`FeatureSet`]s produced by a [`FeatureExtractor`], which owns
//! tokenization, stemming, stopword removal and any spelling correction.
//! [`SimpleFeatureExtractor`] is a small reference implementation based on
//! Unicode word boundaries.

pub mod extractor;
pub mod feature_set;

// Re-export commonly used types
pub use extractor::*;
pub use feature_set::*;
