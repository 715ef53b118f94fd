//! Regression model seam.
//!
//! The predictor only ever sees [`ScoreModel`] and [`ModelLoader`]. The
//! shipped implementation evaluates a pre-trained linear artifact that is
//! embedded in the binary; any other runtime (or a test double) can stand in
//! by implementing the two traits.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::features::StudentFeatures;

/// Artifact compiled into the binary.
pub const BUNDLED_ARTIFACT: &str = include_str!("../models/student_score_predictor.json");

/// Exactly what the model is asked for. `participation_level` travels as the
/// category string the model was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    pub study_hours: f64,
    pub attendance_rate: f64,
    pub previous_scores: f64,
    pub participation_level: String,
    pub sleep_hours: f64,
}

impl From<&StudentFeatures> for ModelInput {
    fn from(features: &StudentFeatures) -> Self {
        ModelInput {
            study_hours: features.study_hours,
            attendance_rate: features.attendance_rate,
            previous_scores: features.previous_score,
            participation_level: features.participation_level.label().to_string(),
            sleep_hours: features.sleep_hours,
        }
    }
}

/// Numeric inputs a model artifact may reference. `ModelInput` yields its
/// values in this order.
pub const NUMERIC_INPUTS: [&str; 4] = [
    "study_hours",
    "attendance_rate",
    "previous_scores",
    "sleep_hours",
];

impl ModelInput {
    fn numeric_values(&self) -> [f64; 4] {
        [
            self.study_hours,
            self.attendance_rate,
            self.previous_scores,
            self.sleep_hours,
        ]
    }
}

fn numeric_column(name: &str) -> Option<usize> {
    NUMERIC_INPUTS.iter().position(|input| *input == name)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOutput {
    pub final_score: f64,
}

/// A loaded regression model.
pub trait ScoreModel {
    fn prediction(&self, input: &ModelInput) -> Result<ModelOutput, ModelError>;

    /// Descriptive metadata, when the model carries any.
    fn info(&self) -> Option<ModelInfo> {
        None
    }
}

/// Produces a ready model with its default configuration.
pub trait ModelLoader {
    type Model: ScoreModel;

    fn load(&self) -> Result<Self::Model, ModelError>;
}

/// Serialized form of the pre-trained regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub version: String,
    pub target: String,
    /// Order of the numeric inputs, matching `coefficients`.
    pub inputs: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Additive offset per `participation_level` category.
    pub participation_level: BTreeMap<String, f64>,
}

/// Metadata exposed by `GET /model/info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub target: String,
    pub inputs: Vec<String>,
    pub categories: Vec<String>,
}

impl ModelArtifact {
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let artifact: ModelArtifact = serde_json::from_str(text)?;
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.inputs.len() != self.coefficients.len() {
            return Err(ModelError::Artifact(format!(
                "{} inputs but {} coefficients",
                self.inputs.len(),
                self.coefficients.len()
            )));
        }

        if let Some(unknown) = self.inputs.iter().find(|name| numeric_column(name).is_none()) {
            return Err(ModelError::Artifact(format!("unknown input `{}`", unknown)));
        }

        if self.participation_level.is_empty() {
            return Err(ModelError::Artifact(
                "no participation_level categories".to_string(),
            ));
        }

        let all_finite = self
            .coefficients
            .iter()
            .chain(self.participation_level.values())
            .chain(std::iter::once(&self.intercept))
            .all(|w| w.is_finite());
        if !all_finite {
            return Err(ModelError::Artifact("non-finite weight".to_string()));
        }

        Ok(())
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            name: self.name.clone(),
            version: self.version.clone(),
            target: self.target.clone(),
            inputs: self.inputs.clone(),
            categories: self.participation_level.keys().cloned().collect(),
        }
    }
}

/// Linear regression evaluated from a [`ModelArtifact`].
#[derive(Debug, Clone)]
pub struct BundledModel {
    artifact: ModelArtifact,
    weights: Array1<f64>,
    /// Position in [`NUMERIC_INPUTS`] of each artifact input.
    columns: Vec<usize>,
}

impl BundledModel {
    pub fn new(artifact: ModelArtifact) -> Result<Self, ModelError> {
        artifact.validate()?;
        let columns = artifact
            .inputs
            .iter()
            .filter_map(|name| numeric_column(name))
            .collect();
        let weights = Array1::from_vec(artifact.coefficients.clone());
        Ok(BundledModel {
            artifact,
            weights,
            columns,
        })
    }
}

impl ScoreModel for BundledModel {
    fn info(&self) -> Option<ModelInfo> {
        Some(self.artifact.info())
    }

    fn prediction(&self, input: &ModelInput) -> Result<ModelOutput, ModelError> {
        let numeric = input.numeric_values();
        let mut values = Vec::with_capacity(self.columns.len());
        for &column in &self.columns {
            let value = numeric[column];
            if !value.is_finite() {
                return Err(ModelError::InvalidFeature {
                    feature: NUMERIC_INPUTS[column],
                    reason: format!("{} is not a finite number", value),
                });
            }
            values.push(value);
        }

        let offset = self
            .artifact
            .participation_level
            .get(&input.participation_level)
            .copied()
            .ok_or_else(|| ModelError::InvalidFeature {
                feature: "participation_level",
                reason: format!("unknown category {:?}", input.participation_level),
            })?;

        let x = Array1::from_vec(values);
        let final_score = self.weights.dot(&x) + self.artifact.intercept + offset;

        if !final_score.is_finite() {
            return Err(ModelError::NonFiniteOutput(final_score));
        }

        Ok(ModelOutput { final_score })
    }
}

/// Where the artifact comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactSource {
    Embedded,
    File(PathBuf),
}

/// Loads the bundled artifact, or an override file when configured.
#[derive(Debug, Clone)]
pub struct BundledModelLoader {
    source: ArtifactSource,
}

impl BundledModelLoader {
    pub fn embedded() -> Self {
        BundledModelLoader {
            source: ArtifactSource::Embedded,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        BundledModelLoader {
            source: ArtifactSource::File(path.as_ref().to_path_buf()),
        }
    }

    pub fn source(&self) -> &ArtifactSource {
        &self.source
    }
}

impl Default for BundledModelLoader {
    fn default() -> Self {
        Self::embedded()
    }
}

impl ModelLoader for BundledModelLoader {
    type Model = BundledModel;

    fn load(&self) -> Result<BundledModel, ModelError> {
        let artifact = match &self.source {
            ArtifactSource::Embedded => ModelArtifact::from_json(BUNDLED_ARTIFACT)?,
            ArtifactSource::File(path) => {
                let text = fs::read_to_string(path).map_err(|source| ModelError::Load {
                    path: path.clone(),
                    source,
                })?;
                ModelArtifact::from_json(&text)?
            }
        };
        BundledModel::new(artifact)
    }
}
