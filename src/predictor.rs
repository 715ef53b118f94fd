//! Input validation and the single model call behind the "Predict" button.

use std::fmt;

use tracing::{debug, warn};

use crate::error::{ModelError, PredictError};
use crate::features::{
    self, ParticipationLevel, StudentFeatures, ATTENDANCE_RATE_RANGE, SLEEP_HOURS_RANGE,
    STUDY_HOURS_RANGE,
};
use crate::model::{ModelInput, ModelLoader, ScoreModel};

pub const INVALID_SCORE_MESSAGE: &str = "Invalid Score";
pub const ERROR_MESSAGE: &str = "Error";

/// Outcome of one prediction attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prediction {
    Score(f64),
    InvalidScore,
    Error,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Score(score) => f.write_str(&format_score(*score)),
            Prediction::InvalidScore => f.write_str(INVALID_SCORE_MESSAGE),
            Prediction::Error => f.write_str(ERROR_MESSAGE),
        }
    }
}

impl From<Result<f64, PredictError>> for Prediction {
    fn from(result: Result<f64, PredictError>) -> Self {
        match result {
            Ok(score) => Prediction::Score(score),
            Err(PredictError::InvalidScore(_)) => Prediction::InvalidScore,
            Err(PredictError::Model(_)) => Prediction::Error,
        }
    }
}

/// Zero decimal places, halves rounded away from zero. Negative zero prints as "0".
pub fn format_score(score: f64) -> String {
    format!("{:.0}", score.round() + 0.0)
}

/// Validate the raw inputs and query the model once.
///
/// Returns the final score, or which of the two failure modes stopped it. The
/// model is not loaded at all when the previous score text is not a number.
pub fn try_predict<L: ModelLoader>(
    loader: &L,
    study_hours: f64,
    attendance_rate: f64,
    previous_score_text: &str,
    participation_level: ParticipationLevel,
    sleep_hours: f64,
) -> Result<f64, PredictError> {
    let previous_score = features::parse_previous_score(previous_score_text)?;

    let features = StudentFeatures {
        study_hours,
        attendance_rate,
        previous_score,
        participation_level,
        sleep_hours,
    };

    let model = loader.load()?;
    let output = model.prediction(&ModelInput::from(&features))?;

    if !output.final_score.is_finite() {
        return Err(ModelError::NonFiniteOutput(output.final_score).into());
    }

    Ok(output.final_score)
}

/// Same as [`try_predict`], folded into the displayable outcome.
pub fn predict<L: ModelLoader>(
    loader: &L,
    study_hours: f64,
    attendance_rate: f64,
    previous_score_text: &str,
    participation_level: ParticipationLevel,
    sleep_hours: f64,
) -> Prediction {
    let result = try_predict(
        loader,
        study_hours,
        attendance_rate,
        previous_score_text,
        participation_level,
        sleep_hours,
    );

    match &result {
        Ok(score) => debug!(score, %participation_level, "prediction succeeded"),
        Err(PredictError::InvalidScore(text)) => {
            warn!(text = %text, "previous score is not a number")
        }
        Err(PredictError::Model(e)) => warn!(error = %e, "model invocation failed"),
    }

    Prediction::from(result)
}

/// Controls that can hold input focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    StudyHours,
    AttendanceRate,
    PreviousScore,
    ParticipationLevel,
    SleepHours,
}

/// Live state of the prediction screen: the five inputs, the focused
/// control, and the one result slot that each submission overwrites.
#[derive(Debug, Clone)]
pub struct PredictionForm {
    pub study_hours: f64,
    pub attendance_rate: f64,
    pub previous_score: String,
    participation: ParticipationLevel,
    pub sleep_hours: f64,
    focus: Option<Field>,
    predicted_score: String,
}

impl Default for PredictionForm {
    fn default() -> Self {
        PredictionForm {
            study_hours: 10.0,
            attendance_rate: 75.0,
            previous_score: "80".to_string(),
            participation: ParticipationLevel::Medium,
            sleep_hours: 7.0,
            focus: None,
            predicted_score: String::new(),
        }
    }
}

impl PredictionForm {
    pub fn participation(&self) -> ParticipationLevel {
        self.participation
    }

    pub fn participation_index(&self) -> usize {
        self.participation.index()
    }

    /// Select by picker position. Out-of-table indices leave the selection alone.
    pub fn select_participation(&mut self, index: usize) -> bool {
        match ParticipationLevel::from_index(index) {
            Some(level) => {
                self.participation = level;
                true
            }
            None => false,
        }
    }

    pub fn focus(&mut self, field: Field) {
        self.focus = Some(field);
    }

    pub fn focused(&self) -> Option<Field> {
        self.focus
    }

    /// Text of the result section; `None` until the first submission.
    pub fn result(&self) -> Option<&str> {
        if self.predicted_score.is_empty() {
            None
        } else {
            Some(&self.predicted_score)
        }
    }

    /// Run one prediction from the current inputs.
    ///
    /// Slider values are pinned to their bounds first. The result slot is
    /// overwritten and focus is dismissed whatever the outcome.
    pub fn submit<L: ModelLoader>(&mut self, loader: &L) -> Prediction {
        let prediction = predict(
            loader,
            features::clamp_to(&STUDY_HOURS_RANGE, self.study_hours),
            features::clamp_to(&ATTENDANCE_RATE_RANGE, self.attendance_rate),
            &self.previous_score,
            self.participation,
            features::clamp_to(&SLEEP_HOURS_RANGE, self.sleep_hours),
        );

        self.predicted_score = prediction.to_string();
        self.focus = None;
        prediction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_score_zero_decimals() {
        assert_eq!(format_score(87.4), "87");
        assert_eq!(format_score(87.5), "88");
        assert_eq!(format_score(87.6), "88");
        assert_eq!(format_score(5.0), "5");
        assert_eq!(format_score(104.49), "104");
        assert_eq!(format_score(-0.4), "0");
        assert_eq!(format_score(-2.5), "-3");
    }

    #[test]
    fn test_prediction_display() {
        assert_eq!(Prediction::Score(68.85).to_string(), "69");
        assert_eq!(Prediction::InvalidScore.to_string(), "Invalid Score");
        assert_eq!(Prediction::Error.to_string(), "Error");
    }

    #[test]
    fn test_form_defaults() {
        let form = PredictionForm::default();
        assert_eq!(form.study_hours, 10.0);
        assert_eq!(form.attendance_rate, 75.0);
        assert_eq!(form.previous_score, "80");
        assert_eq!(form.participation_index(), 1);
        assert_eq!(form.sleep_hours, 7.0);
        assert_eq!(form.result(), None);
        assert_eq!(form.focused(), None);
    }

    #[test]
    fn test_select_participation_bounds() {
        let mut form = PredictionForm::default();
        assert!(form.select_participation(2));
        assert_eq!(form.participation(), ParticipationLevel::High);
        assert!(!form.select_participation(3));
        assert_eq!(form.participation(), ParticipationLevel::High);
    }
}
