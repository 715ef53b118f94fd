use std::io::{Read, Write};

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::features::{
    self, ParticipationLevel, ATTENDANCE_RATE_RANGE, SLEEP_HOURS_RANGE, STUDY_HOURS_RANGE,
};
use crate::model::ModelLoader;
use crate::predictor::{Prediction, PredictionForm};

/// One CSV input row. `previous_score` stays text so it goes through the
/// same validation as the form field.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRow {
    pub study_hours: f64,
    pub attendance_rate: f64,
    pub previous_score: String,
    pub participation_level: String,
    pub sleep_hours: f64,
}

/// Result text for a row that could not be turned into a form submission.
pub const INVALID_INPUT_MESSAGE: &str = "Invalid Input";

const INPUT_COLUMNS: [&str; 5] = [
    "study_hours",
    "attendance_rate",
    "previous_score",
    "participation_level",
    "sleep_hours",
];

#[derive(Debug, Clone, Serialize)]
struct BatchOutputRow<'a> {
    study_hours: f64,
    attendance_rate: f64,
    previous_score: &'a str,
    participation_level: &'a str,
    sleep_hours: f64,
    predicted_score: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub scored: usize,
    pub invalid_score: usize,
    pub invalid_input: usize,
    pub errors: usize,
}

fn parse_row(
    headers: &StringRecord,
    record: &StringRecord,
) -> std::result::Result<(BatchRow, ParticipationLevel), String> {
    let row: BatchRow = record
        .deserialize(Some(headers))
        .map_err(|e| e.to_string())?;

    let level: ParticipationLevel = row.participation_level.parse()?;

    if let Some(name) =
        features::non_finite_slider(row.study_hours, row.attendance_rate, row.sleep_hours)
    {
        return Err(format!("{} is not a finite number", name));
    }

    Ok((row, level))
}

/// Field of `record` under the input column `name`, as written in the file.
fn raw_field<'r>(headers: &StringRecord, record: &'r StringRecord, name: &str) -> &'r str {
    headers
        .iter()
        .position(|header| header == name)
        .and_then(|index| record.get(index))
        .unwrap_or("")
}

/// Predict every row of `input` independently and write the results to `output`.
///
/// A row that cannot be read as a form submission is echoed as written with
/// `Invalid Input` and the batch moves on. Slider values are written as the
/// model received them, pinned to their bounds.
pub fn run_batch<R: Read, W: Write, L: ModelLoader>(
    input: R,
    output: W,
    loader: &L,
) -> Result<BatchSummary> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);
    let mut summary = BatchSummary::default();

    let headers = reader.headers()?.clone();
    writer.write_record(INPUT_COLUMNS.iter().chain(["predicted_score"].iter()))?;

    for (index, result) in reader.records().enumerate() {
        let record = result?;
        // header is line 1
        let line = index + 2;
        summary.total += 1;

        let (row, level) = match parse_row(&headers, &record) {
            Ok(parsed) => parsed,
            Err(reason) => {
                warn!(line, reason = %reason, "row rejected");
                summary.invalid_input += 1;
                writer.write_record(
                    INPUT_COLUMNS
                        .iter()
                        .map(|name| raw_field(&headers, &record, name))
                        .chain([INVALID_INPUT_MESSAGE]),
                )?;
                continue;
            }
        };

        let mut form = PredictionForm::default();
        form.study_hours = features::clamp_to(&STUDY_HOURS_RANGE, row.study_hours);
        form.attendance_rate = features::clamp_to(&ATTENDANCE_RATE_RANGE, row.attendance_rate);
        form.previous_score = row.previous_score.clone();
        form.select_participation(level.index());
        form.sleep_hours = features::clamp_to(&SLEEP_HOURS_RANGE, row.sleep_hours);
        let prediction = form.submit(loader);

        match prediction {
            Prediction::Score(_) => summary.scored += 1,
            Prediction::InvalidScore => summary.invalid_score += 1,
            Prediction::Error => summary.errors += 1,
        }

        writer.serialize(BatchOutputRow {
            study_hours: form.study_hours,
            attendance_rate: form.attendance_rate,
            previous_score: &row.previous_score,
            participation_level: level.label(),
            sleep_hours: form.sleep_hours,
            predicted_score: prediction.to_string(),
        })?;
    }

    writer.flush()?;
    info!(
        total = summary.total,
        scored = summary.scored,
        invalid_score = summary.invalid_score,
        invalid_input = summary.invalid_input,
        errors = summary.errors,
        "batch complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BundledModelLoader;

    const HEADER: &str = "study_hours,attendance_rate,previous_score,participation_level,sleep_hours\n";

    fn run(body: &str) -> Result<(BatchSummary, String)> {
        let input = format!("{}{}", HEADER, body);
        let mut out = Vec::new();
        let summary = run_batch(input.as_bytes(), &mut out, &BundledModelLoader::embedded())?;
        Ok((summary, String::from_utf8(out).unwrap()))
    }

    #[test]
    fn test_rows_are_predicted_independently() {
        let (summary, out) = run("10,75,80,Medium,7\n10,75,abc,High,7\n10,75,,low,7\n").unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                total: 3,
                scored: 1,
                invalid_score: 2,
                invalid_input: 0,
                errors: 0
            }
        );

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "study_hours,attendance_rate,previous_score,participation_level,sleep_hours,predicted_score"
        );
        assert_eq!(lines[1], "10.0,75.0,80,Medium,7.0,69");
        assert_eq!(lines[2], "10.0,75.0,abc,High,7.0,Invalid Score");
        assert_eq!(lines[3], "10.0,75.0,,Low,7.0,Invalid Score");
    }

    #[test]
    fn test_bad_rows_do_not_stop_the_batch() {
        let (summary, out) = run(concat!(
            "10,75,80,Medium,7\n",
            "10,75,80,Sometimes,7\n",
            "ten,75,80,High,7\n",
            "10,75,80\n",
            "10,75,80,High,7\n",
        ))
        .unwrap();

        assert_eq!(summary.total, 5);
        assert_eq!(summary.scored, 2);
        assert_eq!(summary.invalid_input, 3);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1], "10.0,75.0,80,Medium,7.0,69");
        assert_eq!(lines[2], "10,75,80,Sometimes,7,Invalid Input");
        assert_eq!(lines[3], "ten,75,80,High,7,Invalid Input");
        assert_eq!(lines[4], "10,75,80,,,Invalid Input");
        // 68.85 + 2.5
        assert_eq!(lines[5], "10.0,75.0,80,High,7.0,71");
    }

    #[test]
    fn test_invalid_row_first_keeps_header_on_top() {
        let (summary, out) = run("10,75,80,Sometimes,7\n10,75,80,Low,7\n").unwrap();
        assert_eq!(summary.invalid_input, 1);
        assert_eq!(summary.scored, 1);

        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("study_hours,"));
        assert_eq!(lines[1], "10,75,80,Sometimes,7,Invalid Input");
        // 68.85 - 2.0
        assert_eq!(lines[2], "10.0,75.0,80,Low,7.0,67");
    }

    #[test]
    fn test_output_shows_clamped_sliders() {
        let (_, out) = run("45,120,80,Medium,2\n").unwrap();
        let lines: Vec<&str> = out.lines().collect();
        // 5.0 + 1.1*30 + 0.15*100 + 0.45*80 + 0.8*4
        assert_eq!(lines[1], "30.0,100.0,80,Medium,4.0,92");
    }

    #[test]
    fn test_columns_matched_by_header_name() {
        let input = "sleep_hours,participation_level,previous_score,attendance_rate,study_hours\n\
                     7,High,80,75,10\n\
                     7,Never,80,75,10\n";
        let mut out = Vec::new();
        let summary = run_batch(input.as_bytes(), &mut out, &BundledModelLoader::embedded()).unwrap();
        assert_eq!(summary.scored, 1);

        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "10.0,75.0,80,High,7.0,71");
        assert_eq!(lines[2], "10,75,80,Never,7,Invalid Input");
    }

    #[test]
    fn test_model_failure_reported_per_row() {
        let input = format!("{}10,75,80,High,7\n", HEADER);
        let mut out = Vec::new();
        let loader = BundledModelLoader::from_path("missing/model.json");
        let summary = run_batch(input.as_bytes(), &mut out, &loader).unwrap();
        assert_eq!(summary.errors, 1);
        assert!(String::from_utf8(out).unwrap().contains(",Error"));
    }
}
