//! HTTP routes

use crate::page::{self, ResultView};
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let max_body = state.config.max_body_bytes;

    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home() -> Html<String> {
    metrics::counter!("sentiview_requests_total", "route" => "home").increment(1);
    page::render(None)
}

#[derive(Debug, Deserialize)]
pub struct PredictForm {
    pub text: String,
}

async fn predict(
    State(state): State<AppState>,
    Form(form): Form<PredictForm>,
) -> Result<Html<String>, AppError> {
    metrics::counter!("sentiview_requests_total", "route" => "predict").increment(1);

    let outcome = state.predictor.predict(&form.text).await?;
    let label = outcome.prediction.label();

    metrics::counter!("sentiview_predictions_total", "label" => label.to_string()).increment(1);
    metrics::histogram!("sentiview_predict_latency_us").record(outcome.latency_us as f64);
    info!("Predicted label {} in {}us", label, outcome.latency_us);

    let view = ResultView {
        label,
        display_name: state.config.label_name(label).map(str::to_string),
    };
    Ok(page::render(Some(&view)))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    metrics::counter!("sentiview_requests_total", "route" => "health").increment(1);
    let version = state.predictor.version();
    Json(json!({
        "status": "healthy",
        "model_name": version.name,
        "model_version": version.version,
    }))
}

async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    Inference(String),
    InternalError(String),
}

impl From<sentiview_core::Error> for AppError {
    fn from(err: sentiview_core::Error) -> Self {
        metrics::counter!("sentiview_errors_total", "kind" => err.kind()).increment(1);
        let message = err.to_string();
        match err {
            sentiview_core::Error::Inference(_) => AppError::Inference(message),
            _ => AppError::InternalError(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (kind, message) = match self {
            AppError::Inference(msg) => ("inference_error", msg),
            AppError::InternalError(msg) => ("internal_error", msg),
        };
        error!("Request failed: {}", message);

        let body = json!({
            "error": {
                "message": message,
                "type": kind,
            }
        });

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
