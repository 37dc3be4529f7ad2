//! Linear classifier scored with Candle tensors

use async_trait::async_trait;
use candle_core::{Device, Tensor};
use sentiview_core::{Error, FeatureRow, Prediction, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trait for all sentiment models
#[async_trait]
pub trait Model: Send + Sync {
    /// Predict the class label of one feature row
    async fn predict(&self, row: &FeatureRow) -> Result<Prediction>;

    /// Get the model name
    fn name(&self) -> &str;

    /// Number of input features expected per row
    fn n_features(&self) -> usize;
}

/// On-disk form of a linear classifier
///
/// `coef` has one row per decision function: a single row for binary
/// problems, one row per class otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Class labels, in the order used by `coef`
    pub classes: Vec<i64>,

    pub coef: Vec<Vec<f32>>,

    pub intercept: Vec<f32>,
}

fn default_kind() -> String {
    "logistic_regression".to_string()
}

/// Logistic-regression style linear model
pub struct LinearModel {
    name: String,
    classes: Vec<i64>,
    /// (n_features, n_rows), contiguous
    weights_t: Tensor,
    /// (n_rows,)
    bias: Tensor,
    n_features: usize,
}

impl LinearModel {
    /// Load a model artifact from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::artifact(format!("Failed to read model {}: {}", path.display(), e))
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model")
            .to_string();
        Self::from_slice(name, &bytes)
    }

    /// Parse a model artifact from raw JSON bytes
    pub fn from_slice(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let artifact: LinearModelArtifact = serde_json::from_slice(bytes)
            .map_err(|e| Error::artifact(format!("Invalid model artifact: {}", e)))?;
        Self::from_artifact(name, artifact)
    }

    /// Validate an artifact and move its weights onto the CPU device
    pub fn from_artifact(name: impl Into<String>, artifact: LinearModelArtifact) -> Result<Self> {
        if artifact.kind != "logistic_regression" && artifact.kind != "linear_svc" {
            return Err(Error::artifact(format!(
                "Unsupported model kind '{}'",
                artifact.kind
            )));
        }

        let n_rows = artifact.coef.len();
        let n_features = artifact.coef.first().map(Vec::len).unwrap_or(0);
        if n_rows == 0 || n_features == 0 {
            return Err(Error::artifact("Model has no coefficients"));
        }
        if artifact.coef.iter().any(|row| row.len() != n_features) {
            return Err(Error::artifact("Coefficient rows have different widths"));
        }
        if artifact.intercept.len() != n_rows {
            return Err(Error::artifact(format!(
                "Expected {} intercepts, found {}",
                n_rows,
                artifact.intercept.len()
            )));
        }

        let expected_classes = if n_rows == 1 { 2 } else { n_rows };
        if artifact.classes.len() != expected_classes {
            return Err(Error::artifact(format!(
                "{} coefficient rows need {} classes, found {}",
                n_rows,
                expected_classes,
                artifact.classes.len()
            )));
        }

        let device = Device::Cpu;
        let flat: Vec<f32> = artifact.coef.into_iter().flatten().collect();
        let weights_t = Tensor::from_vec(flat, (n_rows, n_features), &device)
            .and_then(|w| w.t())
            .and_then(|w| w.contiguous())
            .map_err(candle_error)?;
        let bias = Tensor::from_vec(artifact.intercept, n_rows, &device).map_err(candle_error)?;

        Ok(Self {
            name: name.into(),
            classes: artifact.classes,
            weights_t,
            bias,
            n_features,
        })
    }

    /// Class labels in decision-function order
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    /// Raw decision scores `W·x + b` for one row
    pub fn decision_function(&self, row: &FeatureRow) -> Result<Vec<f32>> {
        if row.width() != self.n_features {
            return Err(Error::inference(format!(
                "Feature row has width {}, model expects {}",
                row.width(),
                self.n_features
            )));
        }

        let x = Tensor::from_slice(row.values(), (1, self.n_features), &Device::Cpu)
            .map_err(candle_error)?;
        x.matmul(&self.weights_t)
            .and_then(|scores| scores.broadcast_add(&self.bias))
            .and_then(|scores| scores.squeeze(0))
            .and_then(|scores| scores.to_vec1::<f32>())
            .map_err(candle_error)
    }

    fn label_for(&self, scores: &[f32]) -> Result<i64> {
        let index = if scores.len() == 1 {
            usize::from(scores[0] > 0.0)
        } else {
            scores
                .iter()
                .enumerate()
                .fold(None, |best: Option<(usize, f32)>, (i, &s)| match best {
                    Some((_, b)) if b >= s => best,
                    _ => Some((i, s)),
                })
                .map(|(i, _)| i)
                .ok_or_else(|| Error::inference("Model produced no scores"))?
        };

        self.classes
            .get(index)
            .copied()
            .ok_or_else(|| Error::inference(format!("No class for score index {}", index)))
    }
}

#[async_trait]
impl Model for LinearModel {
    async fn predict(&self, row: &FeatureRow) -> Result<Prediction> {
        let scores = self.decision_function(row)?;
        Ok(Prediction(self.label_for(&scores)?))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn n_features(&self) -> usize {
        self.n_features
    }
}

fn candle_error(e: candle_core::Error) -> Error {
    Error::inference(format!("Tensor operation failed: {}", e))
}
