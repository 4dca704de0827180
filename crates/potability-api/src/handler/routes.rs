//! Route definitions for the potability service
//!
//! - GET  /         - welcome message
//! - POST /predict  - validate a water sample and predict its potability
//! - GET  /health   - liveness and model description
//! - GET  /schema   - required input fields in model column order
//! - GET  /model    - summary of the loaded model artifact
//! - GET  /metrics  - Prometheus text exposition

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use potability_core::{
    validate_json, InferencePipeline, ModelSummary, PayloadError, PotabilityLabel,
    PredictiveModel, ValidationError, WaterSample,
};

use super::{
    sample_schema, ApiResponse, ErrorInfo, FieldErrorDetail, HealthResponse, SchemaField,
    WELCOME_MESSAGE,
};
use crate::config::ServerConfig;
use crate::telemetry::PredictionMetrics;

/// Handler state shared across all routes
///
/// Everything here is read-only after startup; cloning is cheap.
#[derive(Clone)]
pub struct HandlerState {
    pub pipeline: InferencePipeline,
    /// Present when the model came from an artifact file
    pub model_summary: Option<Arc<ModelSummary>>,
    pub metrics: PredictionMetrics,
    pub inference_timeout: Duration,
    pub max_body_size: usize,
    pub start_time: Instant,
}

impl HandlerState {
    pub fn new(model: Arc<dyn PredictiveModel>, metrics: PredictionMetrics) -> Self {
        let defaults = ServerConfig::default();
        Self {
            pipeline: InferencePipeline::new(model),
            model_summary: None,
            metrics,
            inference_timeout: defaults.inference_timeout(),
            max_body_size: defaults.max_body_size,
            start_time: Instant::now(),
        }
    }

    pub fn with_summary(mut self, summary: ModelSummary) -> Self {
        self.model_summary = Some(Arc::new(summary));
        self
    }

    pub fn with_limits(mut self, config: &ServerConfig) -> Self {
        self.inference_timeout = config.inference_timeout();
        self.max_body_size = config.max_body_size;
        self
    }

    /// Run the model off the async executor, bounded by the inference timeout
    async fn infer(&self, sample: WaterSample) -> Result<PotabilityLabel, ApiError> {
        let pipeline = self.pipeline.clone();
        let started = Instant::now();
        let task = tokio::task::spawn_blocking(move || pipeline.predict_sample(&sample));
        let outcome = tokio::time::timeout(self.inference_timeout, task).await;
        self.metrics.observe_inference(started.elapsed().as_secs_f64());

        match outcome {
            Ok(Ok(Ok(label))) => Ok(label),
            Ok(Ok(Err(err))) => {
                tracing::error!(error = %err, reason = err.reason(), "Model inference failed");
                self.metrics.record_inference_failure(err.reason());
                Err(ApiError::InferenceFailed)
            }
            Ok(Err(join_err)) => {
                tracing::error!(error = %join_err, "Inference task aborted");
                self.metrics.record_inference_failure("task_aborted");
                Err(ApiError::InferenceFailed)
            }
            Err(_) => {
                let timeout_ms = self.inference_timeout.as_millis() as u64;
                tracing::error!(timeout_ms, "Model inference timed out");
                self.metrics.record_inference_failure("timeout");
                Err(ApiError::InferenceTimeout(timeout_ms))
            }
        }
    }
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    PayloadTooLarge(String),
    NotFound(String),
    ValidationFailed(ValidationError),
    InferenceFailed,
    InferenceTimeout(u64),
    InternalError(String),
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::PayloadTooLarge(_) => "BODY_TOO_LARGE",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ValidationFailed(_) => "VALIDATION_FAILED",
            ApiError::InferenceFailed => "INFERENCE_FAILED",
            ApiError::InferenceTimeout(_) => "INFERENCE_TIMEOUT",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InferenceFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InferenceTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_info(&self) -> ErrorInfo {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalError(msg) => ErrorInfo::new(self.error_code(), msg),
            ApiError::ValidationFailed(err) => {
                let errors: Vec<FieldErrorDetail> =
                    err.issues().iter().map(FieldErrorDetail::from).collect();
                ErrorInfo::new(self.error_code(), "Water sample validation failed")
                    .with_details(serde_json::json!({ "errors": errors }))
            }
            // Model internals stay in the logs.
            ApiError::InferenceFailed => {
                ErrorInfo::new(self.error_code(), "Model inference failed")
            }
            ApiError::InferenceTimeout(ms) => ErrorInfo::new(
                self.error_code(),
                format!("Model inference exceeded {}ms", ms),
            ),
        }
    }

    /// Render with a known request id
    pub fn into_response_for(self, request_id: &str) -> Response {
        let status = self.status_code();
        let response = ApiResponse::<()>::error(self.error_info(), request_id.to_string());
        (status, [("x-request-id", request_id.to_string())], Json(response)).into_response()
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl From<PayloadError> for ApiError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::Syntax(e) => {
                ApiError::BadRequest(format!("Failed to parse the request body as JSON: {}", e))
            }
            PayloadError::Validation(e) => ApiError::ValidationFailed(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_response_for(&Uuid::new_v4().to_string())
    }
}

/// Create the router with all routes
pub fn create_router(state: HandlerState) -> Router {
    let max_body_size = state.max_body_size;

    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .route("/health", get(health_check))
        .route("/schema", get(schema))
        .route("/model", get(model_info))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - Welcome message
pub async fn index() -> Json<&'static str> {
    Json(WELCOME_MESSAGE)
}

/// POST /predict - Validate a water sample and predict its potability
///
/// Returns the label text as a JSON string. The model is not consulted when
/// validation fails.
pub async fn predict(
    State(state): State<HandlerState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let started = Instant::now();

    match run_prediction(&state, &headers, body).await {
        Ok(label) => {
            state.metrics.record_prediction(label);
            tracing::info!(
                request_id = %request_id,
                label = label.as_str(),
                duration_ms = started.elapsed().as_millis() as u64,
                "Prediction served"
            );
            (
                StatusCode::OK,
                [("x-request-id", request_id)],
                Json(label.message()),
            )
                .into_response()
        }
        Err(err) => {
            if let ApiError::ValidationFailed(validation) = &err {
                state.metrics.record_validation_failure();
                tracing::warn!(
                    request_id = %request_id,
                    field_count = validation.issues().len(),
                    error = %validation,
                    "Prediction request rejected"
                );
            }
            err.into_response_for(&request_id)
        }
    }
}

// The body is parsed here rather than by `Json` so that a number too large
// for f64 is reported against its field.
async fn run_prediction(
    state: &HandlerState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<PotabilityLabel, ApiError> {
    if !has_json_content_type(headers) {
        return Err(ApiError::BadRequest(
            "Expected request with `Content-Type: application/json`".to_string(),
        ));
    }
    let body = body?;
    let sample = validate_json(&body)?;
    state.infer(sample).await
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(mime) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
    else {
        return false;
    };

    let mime = mime.trim().to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<HandlerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_kind: state.model_summary.as_ref().map(|s| s.kind.clone()),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /schema - Required input fields
pub async fn schema() -> Json<ApiResponse<Vec<SchemaField>>> {
    Json(ApiResponse::success(
        sample_schema(),
        Uuid::new_v4().to_string(),
    ))
}

/// GET /model - Loaded model summary
pub async fn model_info(
    State(state): State<HandlerState>,
) -> Result<Json<ApiResponse<ModelSummary>>, ApiError> {
    let summary = state
        .model_summary
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("No model artifact description available".to_string()))?;

    Ok(Json(ApiResponse::success(
        ModelSummary::clone(summary),
        Uuid::new_v4().to_string(),
    )))
}

/// GET /metrics - Prometheus scrape endpoint
pub async fn metrics(State(state): State<HandlerState>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .encode_text()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
