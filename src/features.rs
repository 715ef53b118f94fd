use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::PredictError;

pub const STUDY_HOURS_RANGE: RangeInclusive<f64> = 0.0..=30.0;
pub const ATTENDANCE_RATE_RANGE: RangeInclusive<f64> = 0.0..=100.0;
pub const SLEEP_HOURS_RANGE: RangeInclusive<f64> = 4.0..=10.0;

pub const STUDY_HOURS_STEP: f64 = 0.5;
pub const ATTENDANCE_RATE_STEP: f64 = 1.0;
pub const SLEEP_HOURS_STEP: f64 = 0.5;

/// How actively a student takes part in class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ParticipationLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl ParticipationLevel {
    /// Picker order, paired with the category string the model was trained
    /// on. Index and label lookups both go through this table.
    pub const ALL: [(ParticipationLevel, &'static str); 3] = [
        (ParticipationLevel::Low, "Low"),
        (ParticipationLevel::Medium, "Medium"),
        (ParticipationLevel::High, "High"),
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).map(|(level, _)| *level)
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|(level, _)| *level == self)
            .unwrap_or_default()
    }

    pub fn label(self) -> &'static str {
        Self::ALL[self.index()].1
    }
}

impl fmt::Display for ParticipationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ParticipationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|(_, label)| label.eq_ignore_ascii_case(s.trim()))
            .map(|(level, _)| *level)
            .ok_or_else(|| format!("unknown participation level: {}", s))
    }
}

/// Feature record handed to the model. Built fresh for every prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentFeatures {
    pub study_hours: f64,
    pub attendance_rate: f64,
    pub previous_score: f64,
    pub participation_level: ParticipationLevel,
    pub sleep_hours: f64,
}

/// Parse the free-text previous exam score. Only finite numbers pass.
pub fn parse_previous_score(text: &str) -> Result<f64, PredictError> {
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(PredictError::InvalidScore(text.to_string())),
    }
}

/// Name of the first slider value that is NaN or infinite, if any.
pub fn non_finite_slider(
    study_hours: f64,
    attendance_rate: f64,
    sleep_hours: f64,
) -> Option<&'static str> {
    [
        ("study_hours", study_hours),
        ("attendance_rate", attendance_rate),
        ("sleep_hours", sleep_hours),
    ]
    .into_iter()
    .find(|(_, value)| !value.is_finite())
    .map(|(name, _)| name)
}

/// Pin a slider value into its bounds, the way the widget itself would.
pub fn clamp_to(range: &RangeInclusive<f64>, value: f64) -> f64 {
    value.clamp(*range.start(), *range.end())
}
