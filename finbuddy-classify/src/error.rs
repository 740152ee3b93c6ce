//! Error taxonomy for the classification pipeline

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Bad or empty training configuration/input
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Too few categories or examples to train meaningfully
    #[error("insufficient training data: {0}")]
    InsufficientData(String),

    /// No persisted model pair at the given location
    #[error("no trained model pair at {}", .0.display())]
    ModelNotFound(PathBuf),

    /// Feature model and classifier come from different training runs
    #[error("model pair mismatch: features from run {features}, classifier from run {classifier}")]
    ModelMismatch { features: String, classifier: String },

    /// Same description mapped to two categories within one training run
    #[error("conflicting categories for '{description}': '{first}' vs '{second}'")]
    CorpusConflict {
        description: String,
        first: String,
        second: String,
    },

    /// Label outside the category vocabulary
    #[error("unknown category label '{0}'")]
    UnknownLabel(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Format(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClassifyError>;
