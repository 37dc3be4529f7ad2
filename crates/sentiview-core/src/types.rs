//! Core types for Sentiview

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense numeric feature row produced by a vectorizer for one text
///
/// The width is fixed by the vectorizer vocabulary at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    values: Vec<f32>,
}

impl FeatureRow {
    /// Wrap a vector of feature values
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// All-zero row of the given width
    pub fn zeros(width: usize) -> Self {
        Self {
            values: vec![0.0; width],
        }
    }

    /// Number of features
    pub fn width(&self) -> usize {
        self.values.len()
    }

    /// Feature values
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Mutable access to the feature values
    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Number of non-zero features
    pub fn nnz(&self) -> usize {
        self.values.iter().filter(|v| **v != 0.0).count()
    }
}

impl From<Vec<f32>> for FeatureRow {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// Integer class label predicted for one feature row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prediction(pub i64);

impl Prediction {
    /// The raw label
    pub fn label(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the model loaded at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Registered model name
    pub name: String,

    /// Version identifier reported by `/health`
    pub version: String,

    /// Stage the version was resolved from (e.g. "Production", "None")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    /// Where the artifact was loaded from
    pub source: String,
}

impl ModelVersion {
    /// Create a version record without stage information
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            stage: None,
            source: source.into(),
        }
    }

    /// Attach the stage the version was resolved from
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// `models:/<name>/<version>` style URI, as used in registry logs
    pub fn uri(&self) -> String {
        format!("models:/{}/{}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_row_nnz() {
        let mut row = FeatureRow::zeros(4);
        row.values_mut()[1] = 2.0;
        assert_eq!(row.width(), 4);
        assert_eq!(row.nnz(), 1);
    }

    #[test]
    fn test_prediction_serializes_as_integer() {
        let json = serde_json::to_string(&Prediction(1)).unwrap();
        assert_eq!(json, "1");
    }

    #[test]
    fn test_model_version_uri() {
        let version = ModelVersion::new("my_model", "7", "mlflow-artifacts:/1/abc/artifacts/model")
            .with_stage("Production");
        assert_eq!(version.uri(), "models:/my_model/7");
        assert_eq!(version.stage.as_deref(), Some("Production"));
    }
}
