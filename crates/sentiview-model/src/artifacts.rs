//! Startup loading of the model and vectorizer artifacts

use crate::linear::{LinearModel, Model};
use crate::registry::{validate_tracking_uri, Credentials, RegistryClient, DEFAULT_STAGES};
use crate::vectorizer::{FittedVectorizer, Vectorizer};
use sentiview_core::{Error, ModelVersion, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Where the classifier is loaded from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ModelSource {
    /// Resolve by name and stage from a tracking server's model registry
    Registry {
        tracking_uri: String,

        name: String,

        /// Stages tried in order; the first with any version wins
        #[serde(default = "default_stages")]
        stages: Vec<String>,

        /// File below the version's artifact root
        #[serde(default = "default_artifact_file")]
        artifact_file: String,
    },

    /// Load a model file from the local filesystem
    Local {
        path: PathBuf,

        #[serde(default)]
        name: Option<String>,

        /// Version reported by `/health`
        #[serde(default = "default_local_version")]
        version: String,
    },
}

fn default_stages() -> Vec<String> {
    DEFAULT_STAGES.iter().map(|s| s.to_string()).collect()
}

fn default_artifact_file() -> String {
    "model.json".to_string()
}

fn default_local_version() -> String {
    "local".to_string()
}

impl ModelSource {
    /// Registry sources authenticate; local files do not
    pub fn requires_credentials(&self) -> bool {
        matches!(self, Self::Registry { .. })
    }

    /// Registered model name, or the local file stem
    pub fn model_name(&self) -> String {
        match self {
            Self::Registry { name, .. } => name.clone(),
            Self::Local { path, name, .. } => name.clone().unwrap_or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("model")
                    .to_string()
            }),
        }
    }

    /// Check the source is usable before any network or disk access
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Registry {
                tracking_uri,
                name,
                stages,
                artifact_file,
            } => {
                validate_tracking_uri(tracking_uri)?;
                if name.trim().is_empty() {
                    return Err(Error::config("model.name must not be empty"));
                }
                if stages.is_empty() {
                    return Err(Error::config("model.stages must list at least one stage"));
                }
                if artifact_file.trim().is_empty() {
                    return Err(Error::config("model.artifact_file must not be empty"));
                }
                Ok(())
            }
            Self::Local { path, .. } => {
                if !path.is_file() {
                    return Err(Error::artifact(format!(
                        "Model file not found: {}",
                        path.display()
                    )));
                }
                Ok(())
            }
        }
    }
}

/// A model ready for inference, with the version it was resolved to
pub struct LoadedModel {
    pub model: Arc<dyn Model>,
    pub version: ModelVersion,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("model", &self.model.name())
            .field("n_features", &self.model.n_features())
            .field("version", &self.version)
            .finish()
    }
}

/// Resolve and load the classifier described by `source`
pub async fn load_model(
    source: &ModelSource,
    credentials: Option<Credentials>,
    timeout: Duration,
) -> Result<LoadedModel> {
    source.validate()?;

    match source {
        ModelSource::Registry {
            tracking_uri,
            name,
            stages,
            artifact_file,
        } => {
            let client = RegistryClient::new(tracking_uri, credentials, timeout)?;
            info!("Resolving model '{}' from {}", name, client.tracking_uri());
            let resolved = client.latest_version(name, stages).await?;
            let artifact_uri = client.download_uri(name, &resolved.version).await?;

            let version = ModelVersion::new(name.clone(), resolved.version.clone(), artifact_uri.clone());
            let version = match &resolved.current_stage {
                Some(stage) => version.with_stage(stage.clone()),
                None => version,
            };
            info!("Fetching model from: {}", version.uri());

            let bytes = client.fetch_artifact(&artifact_uri, artifact_file).await?;
            let model = LinearModel::from_slice(name.clone(), &bytes)?;
            info!(
                "Loaded model {} ({} features, classes {:?})",
                version.uri(),
                model.n_features(),
                model.classes()
            );

            Ok(LoadedModel {
                model: Arc::new(model),
                version,
            })
        }
        ModelSource::Local { path, version, .. } => {
            let name = source.model_name();
            let model = LinearModel::from_file(path)?;
            let version = ModelVersion::new(name, version.clone(), path.display().to_string());
            info!(
                "Loaded local model {} ({} features, classes {:?})",
                path.display(),
                model.n_features(),
                model.classes()
            );

            Ok(LoadedModel {
                model: Arc::new(model),
                version,
            })
        }
    }
}

/// Load the fitted vectorizer from a local file
pub fn load_vectorizer(path: impl AsRef<Path>) -> Result<Arc<dyn Vectorizer>> {
    let path = path.as_ref();
    let vectorizer = FittedVectorizer::from_file(path)?;
    info!(
        "Loaded vectorizer {} ({} terms)",
        path.display(),
        vectorizer.width()
    );
    Ok(Arc::new(vectorizer))
}

/// The model must accept exactly the rows the vectorizer produces
pub fn check_compatible(model: &dyn Model, vectorizer: &dyn Vectorizer) -> Result<()> {
    if model.n_features() != vectorizer.width() {
        return Err(Error::artifact(format!(
            "Model '{}' expects {} features but the vectorizer produces {}",
            model.name(),
            model.n_features(),
            vectorizer.width()
        )));
    }
    Ok(())
}
