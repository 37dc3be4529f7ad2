//! Sentiview Server
//!
//! HTTP front end for the sentiment model: an HTML form at `/`, predictions
//! at `/predict`, liveness at `/health` and Prometheus metrics at `/metrics`.
//!
//! The model, vectorizer and normalizer are loaded once by
//! [`AppState::initialize`] and shared read-only with every request.

pub mod cli;
pub mod config;
pub mod page;
pub mod predictor;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use cli::Cli;
pub use config::{LogFormat, ServerConfig};
pub use predictor::{PredictionOutcome, Predictor};
pub use routes::create_router;
pub use state::{validate_startup, AppState};
