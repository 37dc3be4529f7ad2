//! Shared application state and startup

use crate::config::ServerConfig;
use crate::predictor::Predictor;
use metrics_exporter_prometheus::PrometheusHandle;
use sentiview_core::Result;
use sentiview_model::{load_model, load_vectorizer, Credentials};
use sentiview_text::{Lemmatizer, TextNormalizer};
use std::sync::Arc;
use tracing::info;

/// State handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub predictor: Arc<Predictor>,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Assemble state from already-loaded parts
    pub fn new(
        config: ServerConfig,
        predictor: Predictor,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            predictor: Arc::new(predictor),
            metrics_handle,
        }
    }

    /// Validate, resolve and load everything the server needs before it binds
    pub async fn initialize(
        config: ServerConfig,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Result<Self> {
        let credentials = validate_startup(&config)?;

        let normalizer = build_normalizer(&config)?;
        let vectorizer = load_vectorizer(&config.vectorizer_path)?;
        let loaded = load_model(&config.model, credentials, config.request_timeout()).await?;

        let predictor = Predictor::new(normalizer, vectorizer, loaded.model, loaded.version)?;
        info!(
            "Serving model {} (stage {})",
            predictor.version().uri(),
            predictor.version().stage.as_deref().unwrap_or("none")
        );

        Ok(Self::new(config, predictor, metrics_handle))
    }
}

/// Explicit startup validation: configuration first, then the registry token
pub fn validate_startup(config: &ServerConfig) -> Result<Option<Credentials>> {
    config.validate()?;

    if config.model.requires_credentials() {
        let credentials = Credentials::from_env(&config.credential_env)?;
        info!("Registry credentials read from {}", config.credential_env);
        Ok(Some(credentials))
    } else {
        Ok(None)
    }
}

fn build_normalizer(config: &ServerConfig) -> Result<TextNormalizer> {
    let mut lemmatizer = match &config.lemmatizer_exceptions {
        Some(path) => {
            let lemmatizer = Lemmatizer::with_exceptions_file(path)?;
            info!(
                "Loaded lemmatizer exceptions from {} ({} total)",
                path.display(),
                lemmatizer.exception_count()
            );
            lemmatizer
        }
        None => Lemmatizer::new(),
    };

    if let Some(path) = &config.noun_index {
        let known = lemmatizer.load_noun_index(path)?;
        info!("Loaded noun index from {} ({} lemmas)", path.display(), known);
    }

    TextNormalizer::with_lemmatizer(lemmatizer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentiview_core::Error;
    use sentiview_model::ModelSource;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_registry_requires_credential_env() {
        let vectorizer = write_temp(r#"{"vocabulary": {"good": 0}}"#);
        let config = ServerConfig {
            vectorizer_path: vectorizer.path().to_path_buf(),
            credential_env: "SENTIVIEW_TEST_STARTUP_UNSET".to_string(),
            ..Default::default()
        };

        let err = validate_startup(&config).unwrap_err();
        assert!(matches!(err, Error::Credentials(_)));
        assert!(err.to_string().contains("SENTIVIEW_TEST_STARTUP_UNSET"));
    }

    #[test]
    fn test_registry_reads_credential_env() {
        std::env::set_var("SENTIVIEW_TEST_STARTUP_TOKEN", "token");
        let vectorizer = write_temp(r#"{"vocabulary": {"good": 0}}"#);
        let config = ServerConfig {
            vectorizer_path: vectorizer.path().to_path_buf(),
            credential_env: "SENTIVIEW_TEST_STARTUP_TOKEN".to_string(),
            ..Default::default()
        };

        let credentials = validate_startup(&config).unwrap();
        assert_eq!(credentials.map(|c| c.token().to_string()).as_deref(), Some("token"));
    }

    #[tokio::test]
    async fn test_initialize_local_artifacts() {
        let vectorizer = write_temp(r#"{"vocabulary": {"good": 0, "bad": 1}}"#);
        let model = write_temp(r#"{"classes": [0, 1], "coef": [[1.0, -1.0]], "intercept": [0.0]}"#);
        let config = ServerConfig {
            model: ModelSource::Local {
                path: model.path().to_path_buf(),
                name: Some("my_model".to_string()),
                version: "2".to_string(),
            },
            vectorizer_path: vectorizer.path().to_path_buf(),
            // Not consulted for local models
            credential_env: "SENTIVIEW_TEST_STARTUP_UNSET".to_string(),
            ..Default::default()
        };

        let state = AppState::initialize(config, None).await.unwrap();
        assert_eq!(state.predictor.version().version, "2");
        assert_eq!(state.predictor.version().name, "my_model");
    }

    #[tokio::test]
    async fn test_initialize_with_noun_index() {
        let vectorizer = write_temp(r#"{"vocabulary": {"go": 0, "seems": 1}}"#);
        let model = write_temp(r#"{"classes": [0, 1], "coef": [[1.0, -1.0]], "intercept": [0.0]}"#);
        let index = write_temp("go n 4 2 @ ~ 4 0 06805594\nmovie n 1 2 @ ~ 1 0 06613686\n");
        let config = ServerConfig {
            model: ModelSource::Local {
                path: model.path().to_path_buf(),
                name: None,
                version: "1".to_string(),
            },
            vectorizer_path: vectorizer.path().to_path_buf(),
            noun_index: Some(index.path().to_path_buf()),
            ..Default::default()
        };

        let state = AppState::initialize(config, None).await.unwrap();
        let outcome = state.predictor.predict("It goes, it seems").await.unwrap();
        assert_eq!(outcome.cleaned, "go seems");
    }

    #[tokio::test]
    async fn test_initialize_rejects_width_mismatch() {
        let vectorizer = write_temp(r#"{"vocabulary": {"good": 0, "bad": 1, "meh": 2}}"#);
        let model = write_temp(r#"{"classes": [0, 1], "coef": [[1.0, -1.0]], "intercept": [0.0]}"#);
        let config = ServerConfig {
            model: ModelSource::Local {
                path: model.path().to_path_buf(),
                name: None,
                version: "1".to_string(),
            },
            vectorizer_path: vectorizer.path().to_path_buf(),
            ..Default::default()
        };

        let err = AppState::initialize(config, None).await.err().expect("initialize should fail");
        assert!(matches!(err, Error::Artifact(_)));
    }
}
