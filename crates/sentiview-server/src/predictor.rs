//! Normalize, vectorize and classify one piece of text

use sentiview_core::{ModelVersion, Prediction, Result};
use sentiview_model::{check_compatible, Model, Vectorizer};
use sentiview_text::TextNormalizer;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, enabled, Level};

/// Result of one prediction
#[derive(Debug, Clone)]
pub struct PredictionOutcome {
    /// Text after normalization
    pub cleaned: String,
    pub prediction: Prediction,
    pub latency_us: u64,
}

/// Inference pipeline shared by every request
pub struct Predictor {
    normalizer: TextNormalizer,
    vectorizer: Arc<dyn Vectorizer>,
    model: Arc<dyn Model>,
    version: ModelVersion,
}

impl Predictor {
    /// Build a predictor, failing when the model and vectorizer disagree on width
    pub fn new(
        normalizer: TextNormalizer,
        vectorizer: Arc<dyn Vectorizer>,
        model: Arc<dyn Model>,
        version: ModelVersion,
    ) -> Result<Self> {
        check_compatible(model.as_ref(), vectorizer.as_ref())?;
        Ok(Self {
            normalizer,
            vectorizer,
            model,
            version,
        })
    }

    pub fn version(&self) -> &ModelVersion {
        &self.version
    }

    pub async fn predict(&self, text: &str) -> Result<PredictionOutcome> {
        let start = Instant::now();

        if enabled!(Level::TRACE) {
            for (stage, output) in self.normalizer.trace(text) {
                tracing::trace!(stage = %stage, output = %output, "normalizer stage");
            }
        }

        let cleaned = self.normalizer.normalize(text);
        let row = self.vectorizer.transform(&cleaned)?;
        debug!(
            "Normalized {} chars to {} chars, {} active features",
            text.len(),
            cleaned.len(),
            row.nnz()
        );

        let prediction = self.model.predict(&row).await?;

        Ok(PredictionOutcome {
            cleaned,
            prediction,
            latency_us: start.elapsed().as_micros() as u64,
        })
    }
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("model", &self.model.name())
            .field("features", &self.vectorizer.width())
            .field("version", &self.version)
            .finish()
    }
}
