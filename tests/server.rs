use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use timetable_solver::config::GeneratorConfig;
use timetable_solver::server::router;

fn generate_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/schedule/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn valid_body() -> Value {
    json!({
        "teachers": [{ "id": "t1", "fullName": "Иванов И.И." }],
        "groups": [{ "id": "g1", "name": "G1" }],
        "subjects": [{
            "id": "s1",
            "name": "Алгоритмы",
            "totalHours": 12,
            "groups": "G1",
            "teacherName": "Иванов И.И."
        }],
        "rooms": [{ "id": "r1", "number": "301", "type": "computer" }],
        "preferences": [{ "teacherFullName": "Иванов И.И.", "schedulePreference": "только пн" }],
        "semesterWeeks": 3
    })
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = router(GeneratorConfig::default())
        .oneshot(Request::builder().uri("/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_generate_returns_schedule() {
    let response = router(GeneratorConfig::default())
        .oneshot(generate_request(valid_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["schedule"]["weeks"].as_array().unwrap().len(), 3);
    assert_eq!(body["stats"]["totalLessons"], 6);
    assert_eq!(body["stats"]["lessonsPerWeek"], 2);
    assert_eq!(body["stats"]["satisfactionRate"], 100);
    assert_eq!(body["stats"]["conflicts"], 0);
    for lesson in body["schedule"]["weeks"][0]["lessons"].as_array().unwrap() {
        assert_eq!(lesson["weekday"], 1);
    }
}

#[tokio::test]
async fn test_generate_uses_configured_label() {
    let config = GeneratorConfig {
        semester_label: "1 семестр 2026-27".to_string(),
        ..GeneratorConfig::default()
    };
    let response = router(config).oneshot(generate_request(valid_body())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["schedule"]["semesterLabel"], "1 семестр 2026-27");
}

#[tokio::test]
async fn test_generate_rejects_missing_rooms() {
    let mut body = valid_body();
    body["rooms"] = json!([]);
    let response = router(GeneratorConfig::default())
        .oneshot(generate_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("no rooms"));
}

#[tokio::test]
async fn test_generate_rejects_oversized_semester() {
    let mut body = valid_body();
    body["semesterWeeks"] = json!(100_000_000);
    let response = router(GeneratorConfig::default())
        .oneshot(generate_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("exceeds the limit of 52"));
}

#[tokio::test]
async fn test_generate_reports_diagnostics() {
    let mut body = valid_body();
    body["subjects"][0]["teacherName"] = json!("Петров П.П.");
    let response = router(GeneratorConfig::default())
        .oneshot(generate_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["stats"]["totalLessons"], 0);
    let skipped = &body["diagnostics"]["skippedSubjects"][0];
    assert_eq!(skipped["subjectName"], "Алгоритмы");
    assert_eq!(skipped["reason"]["kind"], "teacherNotFound");
    assert_eq!(skipped["reason"]["rawName"], "Петров П.П.");
}
