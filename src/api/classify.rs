use std::time::Instant;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    app::AppState,
    classification::BiasLabel,
    model::Confidences,
    pipeline::{ClassificationResult, DecisionReason, PipelineError},
};

#[derive(Debug, Deserialize)]
pub(crate) struct ClassifyRequest {
    #[serde(default)]
    headline: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct ConfidenceBody {
    left: f64,
    neutral: f64,
    right: f64,
}

impl From<&Confidences> for ConfidenceBody {
    fn from(confidences: &Confidences) -> Self {
        Self {
            left: confidences.percentage(BiasLabel::Left),
            neutral: confidences.percentage(BiasLabel::Neutral),
            right: confidences.percentage(BiasLabel::Right),
        }
    }
}

#[derive(Debug, Serialize)]
struct ClassifyResponse {
    label: BiasLabel,
    reason: DecisionReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidences: Option<ConfidenceBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched_keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<String>,
    request_id: Uuid,
}

impl ClassifyResponse {
    fn new(result: ClassificationResult, request_id: Uuid) -> Self {
        let (matched_keyword, topic) = match result.matched_keyword {
            Some(phrase) => (Some(phrase.text), Some(phrase.topic)),
            None => (None, None),
        };
        Self {
            label: result.label,
            reason: result.reason,
            confidences: result.confidences.as_ref().map(ConfidenceBody::from),
            matched_keyword,
            topic,
            request_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    request_id: Uuid,
}

fn error_response(status: StatusCode, error: impl Into<String>, request_id: Uuid) -> Response {
    let body = Json(ErrorResponse {
        error: error.into(),
        request_id,
    });
    (status, body).into_response()
}

pub(crate) async fn classify_headline(
    State(state): State<AppState>,
    Json(payload): Json<ClassifyRequest>,
) -> impl IntoResponse {
    let request_id = Uuid::now_v7();
    let started = Instant::now();
    let headline = payload.headline.unwrap_or_default();
    let pipeline = state.pipeline();
    let timeout = state.request_timeout();

    // Inference is CPU bound; keep it off the async workers.
    let task = tokio::task::spawn_blocking(move || pipeline.evaluate(&headline));
    let outcome = tokio::time::timeout(timeout, task).await;
    let metrics = state.telemetry().metrics();
    metrics
        .request_duration
        .observe(started.elapsed().as_secs_f64());

    match outcome {
        Ok(Ok(Ok(result))) => {
            info!(
                %request_id,
                label = %result.label,
                reason = result.reason.as_str(),
                "headline classified"
            );
            (StatusCode::OK, Json(ClassifyResponse::new(result, request_id))).into_response()
        }
        Ok(Ok(Err(PipelineError::InvalidInput))) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::InvalidInput.to_string(),
            request_id,
        ),
        Ok(Ok(Err(error))) => {
            error!(%request_id, %error, "headline classification failed");
            error_response(StatusCode::SERVICE_UNAVAILABLE, error.to_string(), request_id)
        }
        Ok(Err(join_error)) => {
            error!(%request_id, error = %join_error, "classification task aborted");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "classification task aborted",
                request_id,
            )
        }
        Err(_) => {
            metrics.request_timeouts.inc();
            warn!(%request_id, ?timeout, "classification timed out");
            error_response(
                StatusCode::GATEWAY_TIMEOUT,
                format!("classification exceeded {}ms", timeout.as_millis()),
                request_id,
            )
        }
    }
}
