use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use score_predictor::server::{routes, PredictResponse};
use score_predictor::BundledModelLoader;

async fn post_predict(loader: BundledModelLoader, body: Value) -> (StatusCode, Value) {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(loader))
            .configure(routes::<BundledModelLoader>),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

fn form(previous_score: &str, participation_index: usize) -> Value {
    json!({
        "study_hours": 10.0,
        "attendance_rate": 75.0,
        "previous_score": previous_score,
        "participation_index": participation_index,
        "sleep_hours": 7.0
    })
}

#[actix_web::test]
async fn test_predict_returns_rounded_score() {
    let (status, body) = post_predict(BundledModelLoader::embedded(), form("80", 1)).await;
    assert_eq!(status, StatusCode::OK);
    let resp: PredictResponse = serde_json::from_value(body).unwrap();
    assert_eq!(resp.predicted_score, "69");
}

#[actix_web::test]
async fn test_predict_invalid_score() {
    let (status, body) = post_predict(BundledModelLoader::embedded(), form("abc", 1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_score"], "Invalid Score");
}

#[actix_web::test]
async fn test_predict_model_error() {
    let loader = BundledModelLoader::from_path("no/such/model.json");
    let (status, body) = post_predict(loader, form("80", 0)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_score"], "Error");
}

#[actix_web::test]
async fn test_predict_rejects_unknown_participation_index() {
    let (status, body) = post_predict(BundledModelLoader::embedded(), form("80", 3)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("participation_index"));
}

#[actix_web::test]
async fn test_model_info_and_health() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(BundledModelLoader::embedded()))
            .configure(routes::<BundledModelLoader>),
    )
    .await;

    let req = test::TestRequest::get().uri("/model/info").to_request();
    let info: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(info["name"], "StudentScorePredictor");
    assert_eq!(info["target"], "final_score");

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get().uri("/").to_request();
    let page = test::call_and_read_body(&app, req).await;
    let page = String::from_utf8(page.to_vec()).unwrap();
    assert!(page.contains("Predict Final Score"));
}
