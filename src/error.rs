use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the regression model, either while loading the
/// artifact or while evaluating a single input.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model artifact {path}: {source}")]
    Load {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model artifact is inconsistent: {0}")]
    Artifact(String),

    #[error("Input rejected for feature `{feature}`: {reason}")]
    InvalidFeature {
        feature: &'static str,
        reason: String,
    },

    #[error("Model produced a non-finite score: {0}")]
    NonFiniteOutput(f64),
}

/// The two ways a single prediction attempt can fail.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("previous score {0:?} is not a number")]
    InvalidScore(String),

    #[error("model invocation failed: {0}")]
    Model(#[from] ModelError),
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
