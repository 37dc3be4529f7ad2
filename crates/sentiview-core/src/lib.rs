//! Sentiview Core
//!
//! Core types and error handling shared across Sentiview components.
//!
//! This crate provides:
//! - The workspace-wide error type and result alias
//! - Value types passed between the vectorizer, the model and the server

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{FeatureRow, ModelVersion, Prediction};
