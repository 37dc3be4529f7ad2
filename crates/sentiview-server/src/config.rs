//! Server configuration

use crate::cli::Cli;
use sentiview_core::{Error, Result};
use sentiview_model::{ModelSource, DEFAULT_STAGES};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Where the classifier comes from
    #[serde(default = "default_model")]
    pub model: ModelSource,

    /// Fitted vectorizer artifact
    #[serde(default = "default_vectorizer_path")]
    pub vectorizer_path: PathBuf,

    /// Environment variable holding the registry token
    #[serde(default = "default_credential_env")]
    pub credential_env: String,

    /// Timeout for each registry request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Display names for class labels
    #[serde(default)]
    pub labels: BTreeMap<i64, String>,

    /// Extra lemmatizer exceptions in `noun.exc` format
    #[serde(default)]
    pub lemmatizer_exceptions: Option<PathBuf>,

    /// Noun lemma list (WordNet `index.noun`) restricting lemmatizer output
    #[serde(default)]
    pub noun_index: Option<PathBuf>,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model() -> ModelSource {
    ModelSource::Registry {
        tracking_uri: "http://127.0.0.1:5000".to_string(),
        name: "my_model".to_string(),
        stages: DEFAULT_STAGES.iter().map(|s| s.to_string()).collect(),
        artifact_file: "model.json".to_string(),
    }
}

fn default_vectorizer_path() -> PathBuf {
    PathBuf::from("../models/vectorizer.json")
}

fn default_credential_env() -> String {
    "CAPSTONE_TEST".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            model: default_model(),
            vectorizer_path: default_vectorizer_path(),
            credential_env: default_credential_env(),
            request_timeout_secs: default_request_timeout(),
            labels: BTreeMap::new(),
            lemmatizer_exceptions: None,
            noun_index: None,
            log_format: LogFormat::default(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file, or defaults when it does not exist
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)?;
        serde_yaml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse {}: {}",
                config_path.display(),
                e
            ))
        })
    }

    /// Apply command line overrides
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(listen) = &cli.listen {
            self.listen = listen.clone();
        }

        if let Some(port) = cli.port {
            self.port = port;
        }

        if let Some(vectorizer) = &cli.vectorizer {
            self.vectorizer_path = vectorizer.clone();
        }

        if let Some(path) = &cli.model_file {
            self.model = ModelSource::Local {
                path: path.clone(),
                name: cli.model_name.clone(),
                version: "local".to_string(),
            };
            return;
        }

        if let ModelSource::Registry {
            tracking_uri, name, ..
        } = &mut self.model
        {
            if let Some(uri) = &cli.tracking_uri {
                *tracking_uri = uri.clone();
            }
            if let Some(model_name) = &cli.model_name {
                *name = model_name.clone();
            }
        }
    }

    /// Check everything that can be checked before touching the network
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;

        if !self.vectorizer_path.is_file() {
            return Err(Error::artifact(format!(
                "Vectorizer file not found: {}",
                self.vectorizer_path.display()
            )));
        }

        if let Some(path) = &self.lemmatizer_exceptions {
            if !path.is_file() {
                return Err(Error::config(format!(
                    "Lemmatizer exceptions file not found: {}",
                    path.display()
                )));
            }
        }

        if let Some(path) = &self.noun_index {
            if !path.is_file() {
                return Err(Error::config(format!(
                    "Noun index file not found: {}",
                    path.display()
                )));
            }
        }

        if self.model.requires_credentials() && self.credential_env.trim().is_empty() {
            return Err(Error::config("credential_env must name an environment variable"));
        }

        if self.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be greater than zero"));
        }

        if self.max_body_bytes == 0 {
            return Err(Error::config("max_body_bytes must be greater than zero"));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Display name for a class label, if configured
    pub fn label_name(&self, label: i64) -> Option<&str> {
        self.labels.get(&label).map(String::as_str)
    }
}
