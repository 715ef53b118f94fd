use std::ops::RangeInclusive;

use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::features::{
    self, ParticipationLevel, ATTENDANCE_RATE_RANGE, ATTENDANCE_RATE_STEP, SLEEP_HOURS_RANGE,
    SLEEP_HOURS_STEP, STUDY_HOURS_RANGE, STUDY_HOURS_STEP,
};
use crate::model::{BundledModelLoader, ModelLoader, ScoreModel};
use crate::predictor::PredictionForm;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub study_hours: f64,
    pub attendance_rate: f64,
    pub previous_score: String,
    pub participation_index: usize,
    pub sleep_hours: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_score: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse { error: message })
}

// Prediction endpoint. All three outcomes are a 200 with the display string.
async fn predict<L: ModelLoader + 'static>(
    req: web::Json<PredictRequest>,
    loader: web::Data<L>,
) -> HttpResponse {
    let req = req.into_inner();

    if let Some(name) =
        features::non_finite_slider(req.study_hours, req.attendance_rate, req.sleep_hours)
    {
        return bad_request(format!("{} must be a finite number", name));
    }

    let mut form = PredictionForm::default();
    form.study_hours = req.study_hours;
    form.attendance_rate = req.attendance_rate;
    form.previous_score = req.previous_score;
    form.sleep_hours = req.sleep_hours;
    if !form.select_participation(req.participation_index) {
        return bad_request(format!(
            "participation_index must be below {}",
            ParticipationLevel::ALL.len()
        ));
    }

    let prediction = form.submit(loader.get_ref());

    HttpResponse::Ok().json(PredictResponse {
        predicted_score: prediction.to_string(),
    })
}

// Model info endpoint
async fn get_model_info<L: ModelLoader + 'static>(loader: web::Data<L>) -> HttpResponse {
    match loader.load() {
        Ok(model) => match model.info() {
            Some(info) => HttpResponse::Ok().json(info),
            None => HttpResponse::NotFound().json(ErrorResponse {
                error: "model carries no metadata".to_string(),
            }),
        },
        Err(e) => HttpResponse::ServiceUnavailable().json(ErrorResponse {
            error: e.to_string(),
        }),
    }
}

// Health check endpoint
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("Score Predictor is running!")
}

async fn serve_homepage() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(homepage())
}

/// Register every route against a loader of type `L`.
pub fn routes<L: ModelLoader + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(serve_homepage))
        .route("/predict", web::post().to(predict::<L>))
        .route("/model/info", web::get().to(get_model_info::<L>))
        .route("/health", web::get().to(health_check));
}

pub async fn start_api(config: &Config) -> std::io::Result<()> {
    let loader = web::Data::new(config.model_loader());
    let host = config.server.host.clone();
    let port = config.server.port;

    info!("Starting Score Predictor on http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(loader.clone())
            .configure(routes::<BundledModelLoader>)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

/// Display format of a slider's current value next to its label.
struct ValueFormat {
    decimals: usize,
    suffix: &'static str,
}

const HOURS: ValueFormat = ValueFormat {
    decimals: 1,
    suffix: "",
};
const PERCENT: ValueFormat = ValueFormat {
    decimals: 0,
    suffix: "%",
};

fn slider(
    id: &str,
    label: &str,
    range: &RangeInclusive<f64>,
    step: f64,
    value: f64,
    shown: &ValueFormat,
) -> String {
    format!(
        r#"<div class="form-group">
                <label for="{id}">{label}: <span id="{id}-value">{text}</span></label>
                <input type="range" id="{id}" min="{min}" max="{max}" step="{step}" value="{value}"
                    oninput="document.getElementById('{id}-value').textContent = Number(this.value).toFixed({decimals}) + '{suffix}'">
            </div>"#,
        id = id,
        label = label,
        text = format!("{:.*}{}", shown.decimals, value, shown.suffix),
        min = range.start(),
        max = range.end(),
        step = step,
        value = value,
        decimals = shown.decimals,
        suffix = shown.suffix,
    )
}

fn homepage() -> String {
    let defaults = PredictionForm::default();

    let options: String = ParticipationLevel::ALL
        .iter()
        .enumerate()
        .map(|(index, (_, label))| {
            let selected = if index == defaults.participation_index() {
                " selected"
            } else {
                ""
            };
            format!(r#"<option value="{}"{}>{}</option>"#, index, selected, label)
        })
        .collect();

    let fields = [
        slider(
            "study_hours",
            "Study Hours",
            &STUDY_HOURS_RANGE,
            STUDY_HOURS_STEP,
            defaults.study_hours,
            &HOURS,
        ),
        slider(
            "attendance_rate",
            "Attendance Rate",
            &ATTENDANCE_RATE_RANGE,
            ATTENDANCE_RATE_STEP,
            defaults.attendance_rate,
            &PERCENT,
        ),
        format!(
            r#"<div class="form-group">
                <label for="previous_score">Previous Exam Score</label>
                <input type="text" inputmode="decimal" id="previous_score" value="{}">
            </div>"#,
            defaults.previous_score
        ),
        format!(
            r#"<div class="form-group">
                <label for="participation_index">Participation Level</label>
                <select id="participation_index">{}</select>
            </div>"#,
            options
        ),
        slider(
            "sleep_hours",
            "Sleep Hours",
            &SLEEP_HOURS_RANGE,
            SLEEP_HOURS_STEP,
            defaults.sleep_hours,
            &HOURS,
        ),
    ]
    .join("\n            ");

    format!("{}{}{}", PAGE_HEAD, fields, PAGE_TAIL)
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Score Predictor</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body { font-family: Arial, sans-serif; max-width: 480px; margin: 30px auto; padding: 20px; }
        .container { background: #f5f5f5; padding: 25px; border-radius: 10px; }
        .form-group { margin: 15px 0; }
        label { display: block; margin-bottom: 5px; font-weight: bold; }
        input, select { width: 100%; padding: 8px; box-sizing: border-box; }
        button { background: #007bff; color: white; padding: 12px 24px; border: none; border-radius: 4px; cursor: pointer; width: 100%; }
        button:hover { background: #0056b3; }
        .result { margin-top: 20px; padding: 20px; border-radius: 5px; background: #d1ecf1; color: #0c5460; display: none; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Score Predictor</h1>
        <h3>Student Information</h3>
            "#;

const PAGE_TAIL: &str = r#"
        <button id="predict-button" onclick="predict()">Predict Final Score</button>

        <div id="result" class="result">
            <h3>Result</h3>
            <p>Predicted Final Score: <strong id="predicted-score"></strong></p>
        </div>
    </div>

    <script>
        async function predict() {
            const value = id => document.getElementById(id).value;
            const resultDiv = document.getElementById('result');
            let text;

            try {
                const response = await fetch('/predict', {
                    method: 'POST',
                    headers: {'Content-Type': 'application/json'},
                    body: JSON.stringify({
                        study_hours: parseFloat(value('study_hours')),
                        attendance_rate: parseFloat(value('attendance_rate')),
                        previous_score: value('previous_score'),
                        participation_index: parseInt(value('participation_index'), 10),
                        sleep_hours: parseFloat(value('sleep_hours'))
                    })
                });
                const data = await response.json();
                text = data.predicted_score !== undefined ? data.predicted_score : 'Error';
            } catch (error) {
                text = 'Error';
            }

            document.getElementById('predicted-score').textContent = text;
            resultDiv.style.display = 'block';

            if (document.activeElement) {
                document.activeElement.blur();
            }
        }
    </script>
</body>
</html>
"#;
