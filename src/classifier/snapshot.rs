//! Model snapshots.
//!
//! A snapshot is a plain value holding both vocabularies, every scoring
//! unit's weights and bias, the hyperparameters and training metadata. It can
//! be stored as pretty JSON or as compact bincode; [`ModelSnapshot::load`]
//! tells the two apart by the first byte.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::config::TrainingConfig;
use crate::classifier::encoder::ExampleEncoder;
use crate::classifier::linear::LinearClassifier;
use crate::classifier::model::{IntentModel, ModelMetadata};
use crate::classifier::types::NONE_LABEL;
use crate::classifier::vocabulary::Vocabulary;
use crate::error::{GlaiveError, Result};

/// Current snapshot layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk encoding of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotFormat {
    #[default]
    Json,
    Binary,
}

/// Weights and bias of one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringUnitSnapshot {
    /// One weight per input feature, in feature vocabulary order.
    pub weights: Vec<f64>,
    pub bias: f64,
}

/// Complete serializable state of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub version: u32,
    /// Input feature keys in index order.
    pub features: Vocabulary,
    /// Labels in index order; `units[i]` belongs to `labels[i]`.
    pub labels: Vocabulary,
    pub units: Vec<ScoringUnitSnapshot>,
    /// Hyperparameters used for training.
    pub config: TrainingConfig,
    pub metadata: ModelMetadata,
}

impl ModelSnapshot {
    /// Write the snapshot to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P, format: SnapshotFormat) -> Result<()> {
        match format {
            SnapshotFormat::Json => self.save_json(path),
            SnapshotFormat::Binary => self.save_binary(path),
        }
    }

    /// Read a snapshot written in either format.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        match Self::detect_format(&bytes) {
            SnapshotFormat::Json => Self::from_json_slice(&bytes),
            SnapshotFormat::Binary => Self::from_binary_slice(&bytes),
        }
    }

    /// Guess the encoding of raw snapshot bytes.
    pub fn detect_format(bytes: &[u8]) -> SnapshotFormat {
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => SnapshotFormat::Json,
            _ => SnapshotFormat::Binary,
        }
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: ModelSnapshot = serde_json::from_reader(reader)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    pub fn save_binary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_binary<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: ModelSnapshot = bincode::deserialize_from(reader)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let snapshot: ModelSnapshot = serde_json::from_slice(bytes)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    pub fn to_binary(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_binary_slice(bytes: &[u8]) -> Result<Self> {
        let snapshot: ModelSnapshot = bincode::deserialize(bytes)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    fn check_version(&self) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(GlaiveError::snapshot(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                self.version
            )));
        }
        Ok(())
    }
}

impl IntentModel {
    /// Export the full model state.
    pub fn to_snapshot(&self) -> ModelSnapshot {
        let classifier = self.classifier();
        let units = (0..classifier.num_labels())
            .map(|label| ScoringUnitSnapshot {
                weights: classifier.row(label).to_vec(),
                bias: classifier.bias(label),
            })
            .collect();

        ModelSnapshot {
            version: SNAPSHOT_VERSION,
            features: self.encoder().features().clone(),
            labels: self.encoder().labels().clone(),
            units,
            config: self.config().clone(),
            metadata: self.metadata().clone(),
        }
    }

    /// Rebuild a model from a snapshot, validating its consistency.
    pub fn from_snapshot(snapshot: ModelSnapshot) -> Result<Self> {
        snapshot.check_version()?;
        snapshot.config.validate()?;
        if !snapshot.labels.contains(NONE_LABEL) {
            return Err(GlaiveError::snapshot(format!(
                "label vocabulary lacks the {NONE_LABEL:?} label"
            )));
        }
        if snapshot.units.len() != snapshot.labels.len() {
            return Err(GlaiveError::snapshot(format!(
                "{} scoring units for {} labels",
                snapshot.units.len(),
                snapshot.labels.len()
            )));
        }

        let num_features = snapshot.features.len();
        let (rows, biases) = snapshot
            .units
            .into_iter()
            .map(|unit| (unit.weights, unit.bias))
            .unzip();
        let classifier = LinearClassifier::from_rows(rows, biases, num_features)?;
        let encoder = ExampleEncoder::new(snapshot.features, snapshot.labels)?;

        IntentModel::new(encoder, classifier, snapshot.config, snapshot.metadata)
    }

    /// Save the model to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P, format: SnapshotFormat) -> Result<()> {
        self.to_snapshot().save(path, format)
    }

    /// Load a model saved in either format.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_snapshot(ModelSnapshot::load(path)?)
    }
}
