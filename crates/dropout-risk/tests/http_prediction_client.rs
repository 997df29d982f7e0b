use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use dropout_risk::config::PredictionConfig;
use dropout_risk::prediction::{
    FeatureEncoder, FieldId, HttpPredictionService, PredictionReply, PredictionService,
    ProtocolViolation, StudentProfile, TransportError,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;

async fn score_by_clicks(Json(body): Json<Value>) -> impl IntoResponse {
    if body.get("gender_F").is_none() && body.get("gender_M").is_none() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "gender is required" })),
        );
    }

    let clicks = body["vle_total_clicks"].as_f64().unwrap_or(0.0);
    let score = if clicks > 1000.0 { 0.15 } else { 0.82 };
    (StatusCode::OK, Json(json!({ "risk_score": score })))
}

async fn not_json() -> impl IntoResponse {
    (StatusCode::BAD_GATEWAY, "<html>upstream unavailable</html>")
}

async fn slow_score() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({ "risk_score": 0.5 }))
}

async fn spawn_model() -> SocketAddr {
    let app = Router::new()
        .route("/predict", post(score_by_clicks))
        .route("/broken", post(not_json))
        .route("/slow", post(slow_score));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("model server runs");
    });
    addr
}

fn client_for(endpoint: String) -> HttpPredictionService {
    client_with_timeout(endpoint, 5)
}

fn client_with_timeout(endpoint: String, timeout_secs: u64) -> HttpPredictionService {
    let config = PredictionConfig {
        endpoint,
        timeout_secs,
        ..PredictionConfig::default()
    };
    let client = HttpPredictionService::new(&config).expect("client builds");
    assert_eq!(client.endpoint(), config.endpoint);
    client
}

fn profile_with_clicks(clicks: f64) -> StudentProfile {
    let mut profile = StudentProfile::new();
    profile.select(FieldId::Gender, "gender_M");
    profile.set_number(FieldId::VleTotalClicks, clicks);
    profile
}

#[tokio::test]
async fn posts_payload_and_reads_score() {
    let addr = spawn_model().await;
    let client = client_for(format!("http://{addr}/predict"));
    let payload = FeatureEncoder::default().encode(&profile_with_clicks(2400.0));

    let reply = client.predict(&payload).await.expect("service reachable");

    assert_eq!(reply, PredictionReply::Score(0.15));
}

#[tokio::test]
async fn error_body_on_server_error_is_a_service_error() {
    let addr = spawn_model().await;
    let client = client_for(format!("http://{addr}/predict"));
    let payload = FeatureEncoder::default().encode(&StudentProfile::new());

    let reply = client.predict(&payload).await.expect("service reachable");

    assert_eq!(
        reply,
        PredictionReply::ServiceError("gender is required".to_string())
    );
}

#[tokio::test]
async fn non_json_body_is_a_protocol_failure() {
    let addr = spawn_model().await;
    let client = client_for(format!("http://{addr}/broken"));
    let payload = FeatureEncoder::default().encode(&profile_with_clicks(10.0));

    let err = client
        .predict(&payload)
        .await
        .expect_err("html is not a reply");

    match err {
        TransportError::Protocol { status, violation } => {
            assert_eq!(status, 502);
            assert!(matches!(violation, ProtocolViolation::NotJson(_)));
        }
        other => panic!("expected protocol failure, got {other:?}"),
    }
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);

    let client = client_for(format!("http://{addr}/predict"));
    let payload = FeatureEncoder::default().encode(&profile_with_clicks(10.0));

    let err = client
        .predict(&payload)
        .await
        .expect_err("nothing is listening");

    assert!(matches!(err, TransportError::Unreachable(_)));
}

#[tokio::test]
async fn slow_model_times_out() {
    let addr = spawn_model().await;
    let client = client_with_timeout(format!("http://{addr}/slow"), 1);
    let payload = FeatureEncoder::default().encode(&profile_with_clicks(10.0));

    let err = client
        .predict(&payload)
        .await
        .expect_err("reply arrives after the timeout");

    assert_eq!(err, TransportError::TimedOut(Duration::from_secs(1)));
}
