use crate::infra::{profile_from_form, AppState};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use dropout_risk::error::AppError;
use dropout_risk::prediction::{
    AssessmentOutcome, FieldSchema, OutcomeKind, PredictionService, RiskAssessor, RiskBand,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct AssessmentResponse {
    pub(crate) status: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) risk_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) percent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) band: Option<RiskBand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) band_label: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) advisory: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) detail: Option<String>,
    pub(crate) assessed_at: DateTime<Utc>,
}

impl AssessmentResponse {
    pub(crate) fn from_outcome(outcome: &AssessmentOutcome, assessed_at: DateTime<Utc>) -> Self {
        let mut response = Self {
            status: outcome.kind(),
            risk_score: None,
            percent: None,
            band: None,
            band_label: None,
            advisory: None,
            error: outcome.failure_message().map(str::to_string),
            detail: None,
            assessed_at,
        };

        match outcome {
            AssessmentOutcome::Assessed(assessment) => {
                response.risk_score = Some(assessment.score);
                response.percent = Some(assessment.percent());
                response.band = Some(assessment.band);
                response.band_label = Some(assessment.band.label());
                response.advisory = Some(assessment.advisory);
            }
            AssessmentOutcome::ServiceError(_) => {}
            AssessmentOutcome::TransportFailure(err) => response.detail = Some(err.to_string()),
        }

        response
    }

    fn status_code(&self) -> StatusCode {
        match self.status {
            OutcomeKind::Assessed => StatusCode::OK,
            OutcomeKind::ServiceError => StatusCode::BAD_GATEWAY,
            OutcomeKind::TransportFailure => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AssessmentResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

pub(crate) fn with_risk_routes<S>(assessor: Arc<RiskAssessor<S>>) -> Router
where
    S: PredictionService + 'static,
{
    Router::new()
        .route("/api/v1/schema", get(schema_endpoint::<S>))
        .route("/api/v1/risk/assess", post(assess_endpoint::<S>))
        .with_state(assessor)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn schema_endpoint<S>(
    State(assessor): State<Arc<RiskAssessor<S>>>,
) -> Json<FieldSchema>
where
    S: PredictionService + 'static,
{
    Json(assessor.schema().clone())
}

pub(crate) async fn assess_endpoint<S>(
    State(assessor): State<Arc<RiskAssessor<S>>>,
    Json(form): Json<BTreeMap<String, Value>>,
) -> Result<AssessmentResponse, AppError>
where
    S: PredictionService + 'static,
{
    let profile = profile_from_form(assessor.schema(), &form)?;
    let outcome = assessor.assess(&profile).await;
    Ok(AssessmentResponse::from_outcome(&outcome, Utc::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use dropout_risk::prediction::{
        EncodedPayload, FeatureEncoder, PredictionReply, TransportError, CONNECTIVITY_MESSAGE,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    struct CannedService(Result<PredictionReply, TransportError>);

    impl PredictionService for CannedService {
        async fn predict(
            &self,
            _payload: &EncodedPayload,
        ) -> Result<PredictionReply, TransportError> {
            self.0.clone()
        }
    }

    fn app(reply: Result<PredictionReply, TransportError>, ready: bool) -> Router {
        let assessor = Arc::new(RiskAssessor::new(
            FeatureEncoder::default(),
            CannedService(reply),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_risk_routes(assessor).layer(Extension(state))
    }

    async fn post_form(app: Router, form: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/risk/assess")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(form.to_string()))
            .expect("request builds");

        let response = app.oneshot(request).await.expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let body = serde_json::from_slice(&bytes).expect("json body");
        (status, body)
    }

    #[tokio::test]
    async fn assess_returns_band_and_advisory() {
        let app = app(Ok(PredictionReply::Score(0.85)), true);

        let (status, body) = post_form(
            app,
            json!({ "gender": "gender_F", "age_band": "age_band_0-35", "studied_credits": "120" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "assessed");
        assert_eq!(body["band"], "high");
        assert_eq!(body["percent"], "85.0%");
        assert_eq!(body["advisory"], "immediate intervention recommended");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn assess_relays_service_error_verbatim() {
        let app = app(
            Ok(PredictionReply::ServiceError("missing field".to_string())),
            true,
        );

        let (status, body) = post_form(app, json!({})).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], "service_error");
        assert_eq!(body["error"], "missing field");
        assert!(body.get("band").is_none());
    }

    #[tokio::test]
    async fn assess_reports_transport_failure_separately() {
        let app = app(
            Err(TransportError::Unreachable("connection refused".to_string())),
            true,
        );

        let (status, body) = post_form(app, json!({ "gender": "gender_M" })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "transport_failure");
        assert_eq!(body["error"], CONNECTIVITY_MESSAGE);
        assert!(body["detail"]
            .as_str()
            .expect("detail present")
            .contains("connection refused"));
        assert!(body.get("band").is_none());
    }

    #[tokio::test]
    async fn assess_rejects_unknown_fields() {
        let app = app(Ok(PredictionReply::Score(0.1)), true);

        let (status, body) = post_form(app, json!({ "shoe_size": 9 })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .expect("error message")
            .contains("shoe_size"));
    }

    #[tokio::test]
    async fn schema_lists_every_field() {
        let app = app(Ok(PredictionReply::Score(0.1)), true);
        let request = Request::builder()
            .uri("/api/v1/schema")
            .body(Body::empty())
            .expect("request builds");

        let response = app.oneshot(request).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let fields: Vec<Value> = serde_json::from_slice(&bytes).expect("json array");

        assert_eq!(fields.len(), 15);
        assert_eq!(fields[0]["id"], "gender");
        assert_eq!(fields[0]["kind"], "categorical");
        assert_eq!(fields[0]["options"][0]["key"], "gender_M");
        assert_eq!(fields[7]["id"], "studied_credits");
        assert_eq!(fields[7]["max"], 600.0);
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let request = || {
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .expect("request builds")
        };

        let waiting = app(Ok(PredictionReply::Score(0.1)), false)
            .oneshot(request())
            .await
            .expect("router responds");
        assert_eq!(waiting.status(), StatusCode::SERVICE_UNAVAILABLE);

        let ready = app(Ok(PredictionReply::Score(0.1)), true)
            .oneshot(request())
            .await
            .expect("router responds");
        assert_eq!(ready.status(), StatusCode::OK);
    }
}
