//! HTTP API for fare estimation, surge control, and health/metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fare_lib::{
    training, FareEstimate, FareEstimator, FareMetrics, RideHistory, StructuredLogger,
    TrainOutcome,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub estimator: Arc<FareEstimator>,
    pub history: Arc<dyn RideHistory>,
    pub metrics: FareMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        estimator: Arc<FareEstimator>,
        history: Arc<dyn RideHistory>,
        metrics: FareMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            estimator,
            history,
            metrics,
            logger,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    model_trained: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictResponse {
    min_fare: f64,
    max_fare: f64,
    average_fare: f64,
    model: &'static str,
    message: String,
}

impl From<FareEstimate> for PredictResponse {
    fn from(estimate: FareEstimate) -> Self {
        let model = estimate.model.as_str();
        Self {
            min_fare: estimate.min_fare,
            max_fare: estimate.max_fare,
            average_fare: estimate.average_fare,
            model,
            message: format!("Fare suggestion based on {} model", model),
        }
    }
}

#[derive(Serialize)]
struct RetrainResponse {
    message: &'static str,
    is_trained: bool,
}

#[derive(Serialize)]
struct SurgeResponse {
    message: &'static str,
    multiplier: f64,
}

#[derive(Serialize)]
struct StatsResponse {
    total_rides: i64,
    avg_fare: f64,
    min_fare: f64,
    max_fare: f64,
    avg_distance: f64,
    model_trained: bool,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Accept JSON numbers and numeric strings, the way the fare endpoints
/// have always been called.
fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Health check; reports whether a fitted pricing curve is active
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        service: "fare-service",
        model_trained: state.estimator.is_trained(),
    })
}

/// Estimate a fare range for a trip distance
async fn predict_fare(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> Response {
    let Some(raw) = body.get("distance_km") else {
        return error_response(StatusCode::BAD_REQUEST, "distance_km is required");
    };
    let Some(distance_km) = parse_number(raw) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid distance_km value");
    };
    if !(distance_km > 0.0) {
        return error_response(StatusCode::BAD_REQUEST, "distance_km must be positive");
    }

    let start = Instant::now();
    let estimate = state.estimator.predict(distance_km);
    state
        .metrics
        .observe_prediction_latency(start.elapsed().as_secs_f64());
    state.metrics.inc_prediction(estimate.model.as_str());
    state.logger.log_estimate(distance_km, &estimate);

    (StatusCode::OK, Json(PredictResponse::from(estimate))).into_response()
}

/// Retrain the pricing curve from recent ride history
async fn retrain_model(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let outcome = training::train_from_history(&state.estimator, state.history.as_ref()).await;
    state.metrics.record_training(&outcome);
    state.logger.log_training(&outcome);

    let message = match &outcome {
        TrainOutcome::Trained { .. } => "Model retrained successfully",
        TrainOutcome::InsufficientData { .. } => "Not enough ride history to train model",
        TrainOutcome::FitFailed { .. } => "Model training failed, previous model kept",
        TrainOutcome::HistoryUnavailable { .. } => "Ride history unavailable, previous model kept",
    };

    Json(RetrainResponse {
        message,
        is_trained: state.estimator.is_trained(),
    })
}

/// Update the surge pricing multiplier (clamped to its bounds)
async fn update_surge(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> Response {
    let Some(raw) = body.get("multiplier") else {
        return error_response(StatusCode::BAD_REQUEST, "multiplier is required");
    };
    let Some(multiplier) = parse_number(raw) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid multiplier value");
    };

    state.estimator.update_surge(multiplier);
    let applied = state.estimator.surge_multiplier();
    state.metrics.set_surge_multiplier(applied);
    state.logger.log_surge_update(multiplier, applied);

    (
        StatusCode::OK,
        Json(SurgeResponse {
            message: "Surge multiplier updated",
            multiplier: applied,
        }),
    )
        .into_response()
}

/// Aggregate fare statistics over completed rides
async fn fare_stats(State(state): State<Arc<AppState>>) -> Response {
    match state.history.fare_stats().await {
        Ok(stats) => (
            StatusCode::OK,
            Json(StatsResponse {
                total_rides: stats.total_rides,
                avg_fare: stats.avg_fare,
                min_fare: stats.min_fare,
                max_fare: stats.max_fare,
                avg_distance: stats.avg_distance,
                model_trained: state.estimator.is_trained(),
            }),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to load fare statistics");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/fare/predict", post(predict_fare))
        .route("/api/fare/retrain", post(retrain_model))
        .route("/api/fare/surge", post(update_surge))
        .route("/api/fare/stats", get(fare_stats))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting fare API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use fare_lib::{FareStats, HistoryError, RideSample};
    use tower::ServiceExt;

    struct StubHistory {
        samples: Vec<RideSample>,
        stats: Result<FareStats, ()>,
    }

    impl StubHistory {
        fn empty() -> Self {
            Self {
                samples: Vec::new(),
                stats: Ok(FareStats::default()),
            }
        }

        fn with_linear_rides(count: usize) -> Self {
            Self {
                samples: (1..=count)
                    .map(|d| RideSample {
                        distance_km: d as f64,
                        fare: 2.0 + 1.2 * d as f64,
                    })
                    .collect(),
                stats: Ok(FareStats::default()),
            }
        }

        fn broken() -> Self {
            Self {
                samples: Vec::new(),
                stats: Err(()),
            }
        }
    }

    #[async_trait]
    impl RideHistory for StubHistory {
        async fn recent_completed(&self, limit: usize) -> Result<Vec<RideSample>, HistoryError> {
            Ok(self.samples.iter().take(limit).copied().collect())
        }

        async fn fare_stats(&self) -> Result<FareStats, HistoryError> {
            match &self.stats {
                Ok(stats) => Ok(stats.clone()),
                Err(()) => Err(HistoryError::Unavailable("connection refused".to_string())),
            }
        }
    }

    fn setup_app(history: StubHistory) -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::new(
            Arc::new(FareEstimator::new()),
            Arc::new(history),
            FareMetrics::new(),
            StructuredLogger::new("fare-service-test"),
        ));
        (create_router(state.clone()), state)
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_untrained_model() {
        let (app, _state) = setup_app(StubHistory::empty());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let health = body_json(response).await;
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["service"], "fare-service");
        assert_eq!(health["model_trained"], false);
    }

    #[tokio::test]
    async fn test_predict_fallback_pricing() {
        let (app, _state) = setup_app(StubHistory::empty());

        let response = app
            .oneshot(json_post("/api/fare/predict", r#"{"distance_km": 10.0}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let quote = body_json(response).await;
        assert_eq!(quote["minFare"], 14.0);
        assert_eq!(quote["maxFare"], 21.0);
        assert_eq!(quote["averageFare"], 17.5);
        assert_eq!(quote["model"], "fallback");
        assert_eq!(quote["message"], "Fare suggestion based on fallback model");
    }

    #[tokio::test]
    async fn test_predict_requires_distance() {
        let (app, _state) = setup_app(StubHistory::empty());

        let response = app
            .oneshot(json_post("/api/fare/predict", r#"{}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "distance_km is required");
    }

    #[tokio::test]
    async fn test_predict_rejects_non_numeric_distance() {
        let (app, _state) = setup_app(StubHistory::empty());

        let response = app
            .oneshot(json_post("/api/fare/predict", r#"{"distance_km": true}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid distance_km value");
    }

    #[tokio::test]
    async fn test_predict_accepts_numeric_string() {
        let (app, _state) = setup_app(StubHistory::empty());

        let response = app
            .oneshot(json_post("/api/fare/predict", r#"{"distance_km": "4.0"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let quote = body_json(response).await;
        assert_eq!(quote["averageFare"], 8.5);
    }

    #[tokio::test]
    async fn test_predict_rejects_non_positive_distance() {
        let (app, _state) = setup_app(StubHistory::empty());

        for body in [r#"{"distance_km": 0}"#, r#"{"distance_km": -3.2}"#] {
            let response = app
                .clone()
                .oneshot(json_post("/api/fare/predict", body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let json = body_json(response).await;
            assert_eq!(json["error"], "distance_km must be positive");
        }
    }

    #[tokio::test]
    async fn test_retrain_with_sufficient_history() {
        let (app, state) = setup_app(StubHistory::with_linear_rides(20));

        let response = app
            .oneshot(json_post("/api/fare/retrain", ""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Model retrained successfully");
        assert_eq!(body["is_trained"], true);
        assert!(state.estimator.is_trained());
    }

    #[tokio::test]
    async fn test_retrain_with_sparse_history() {
        let (app, state) = setup_app(StubHistory::with_linear_rides(3));

        let response = app
            .oneshot(json_post("/api/fare/retrain", ""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Not enough ride history to train model");
        assert_eq!(body["is_trained"], false);
        assert!(!state.estimator.is_trained());
    }

    #[tokio::test]
    async fn test_surge_is_clamped() {
        let (app, state) = setup_app(StubHistory::empty());

        let response = app
            .oneshot(json_post("/api/fare/surge", r#"{"multiplier": 5.0}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Surge multiplier updated");
        assert_eq!(body["multiplier"], 3.0);
        assert_eq!(state.estimator.surge_multiplier(), 3.0);
    }

    #[tokio::test]
    async fn test_surge_requires_multiplier() {
        let (app, _state) = setup_app(StubHistory::empty());

        let response = app
            .oneshot(json_post("/api/fare/surge", r#"{}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "multiplier is required");
    }

    #[tokio::test]
    async fn test_stats_include_model_flag() {
        let history = StubHistory {
            samples: Vec::new(),
            stats: Ok(FareStats {
                total_rides: 128,
                avg_fare: 14.75,
                min_fare: 3.2,
                max_fare: 88.4,
                avg_distance: 9.1,
            }),
        };
        let (app, _state) = setup_app(history);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/fare/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_rides"], 128);
        assert_eq!(body["avg_fare"], 14.75);
        assert_eq!(body["model_trained"], false);
    }

    #[tokio::test]
    async fn test_stats_maps_history_failure_to_500() {
        let (app, _state) = setup_app(StubHistory::broken());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/fare/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_metrics_endpoint_exposes_fare_families() {
        let (app, state) = setup_app(StubHistory::empty());
        state.metrics.observe_prediction_latency(0.001);
        state.metrics.inc_prediction("fallback");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().contains("text/plain"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("fare_service_prediction_latency_seconds"));
        assert!(text.contains("fare_service_predictions_total"));
    }
}
