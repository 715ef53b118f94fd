//! Student final score prediction.
//!
//! Validates five study metrics, hands them to a pre-trained regression model
//! and turns the outcome into the string shown to the user.

pub mod batch;
pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod predictor;
pub mod server;

pub use config::Config;
pub use error::{AppError, ModelError, PredictError, Result};
pub use features::{ParticipationLevel, StudentFeatures};
pub use model::{BundledModel, BundledModelLoader, ModelInput, ModelLoader, ModelOutput, ScoreModel};
pub use predictor::{predict, try_predict, Prediction, PredictionForm};
