//! Model registry client
//!
//! Talks to an MLflow-compatible tracking server over its REST API to
//! resolve the newest version of a registered model for a list of stages,
//! and to download that version's artifact files.

use sentiview_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Stages tried when none are configured: production first, then unstaged versions
pub const DEFAULT_STAGES: &[&str] = &["Production", "None"];

/// Token used for both the basic-auth username and password
#[derive(Clone)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Read the token from an environment variable; unset or empty is an error
    pub fn from_env(var: &str) -> Result<Self> {
        match std::env::var(var) {
            Ok(token) if !token.trim().is_empty() => Ok(Self::new(token)),
            Ok(_) => Err(Error::credentials(format!(
                "{} environment variable is empty",
                var
            ))),
            Err(_) => Err(Error::credentials(format!(
                "{} environment variable is not set",
                var
            ))),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// One registered model version as reported by the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredVersion {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub current_stage: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatestVersionsResponse {
    #[serde(default)]
    model_versions: Vec<RegisteredVersion>,
}

#[derive(Debug, Deserialize)]
struct DownloadUriResponse {
    artifact_uri: String,
}

/// Where an artifact URI points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    /// Served by the tracking server's artifact proxy
    Proxied(String),
    /// Directly downloadable over HTTP(S)
    Remote(Url),
    /// On the local filesystem
    Local(PathBuf),
}

impl ArtifactLocation {
    /// Classify an artifact URI returned by the registry
    pub fn parse(artifact_uri: &str) -> Result<Self> {
        match Url::parse(artifact_uri) {
            Ok(url) => match url.scheme() {
                "mlflow-artifacts" => Ok(Self::Proxied(
                    url.path().trim_matches('/').to_string(),
                )),
                "http" | "https" => Ok(Self::Remote(url)),
                "file" => url.to_file_path().map(Self::Local).map_err(|_| {
                    Error::artifact(format!("Invalid file URI '{}'", artifact_uri))
                }),
                scheme => Err(Error::artifact(format!(
                    "Unsupported artifact scheme '{}' in '{}'",
                    scheme, artifact_uri
                ))),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(Self::Local(PathBuf::from(artifact_uri)))
            }
            Err(e) => Err(Error::artifact(format!(
                "Invalid artifact URI '{}': {}",
                artifact_uri, e
            ))),
        }
    }
}

/// Client for the tracking server's model registry
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base: String,
    credentials: Option<Credentials>,
}

impl RegistryClient {
    /// Create a client for a tracking server such as `https://host/owner/repo.mlflow`
    pub fn new(
        tracking_uri: &str,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Result<Self> {
        let url = validate_tracking_uri(tracking_uri)?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base: url.as_str().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn tracking_uri(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/2.0/{}", self.base, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some(credentials) => request.basic_auth(credentials.token(), Some(credentials.token())),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::registry(format!(
                "{} returned {}: {}",
                what,
                status,
                body.trim()
            )));
        }

        Ok(response)
    }

    /// Latest versions of `name` in a single stage
    pub async fn get_latest_versions(
        &self,
        name: &str,
        stage: &str,
    ) -> Result<Vec<RegisteredVersion>> {
        let request = self
            .http
            .post(self.endpoint("mlflow/registered-models/get-latest-versions"))
            .json(&json!({ "name": name, "stages": [stage] }));

        let response: LatestVersionsResponse = self
            .send(request, "get-latest-versions")
            .await?
            .json()
            .await
            .map_err(|e| Error::registry(format!("Malformed get-latest-versions response: {}", e)))?;

        debug!(
            "Registry returned {} version(s) of '{}' for stage {}",
            response.model_versions.len(),
            name,
            stage
        );
        Ok(response.model_versions)
    }

    /// Newest version of `name`, trying each stage in order until one has a version
    pub async fn latest_version(&self, name: &str, stages: &[String]) -> Result<RegisteredVersion> {
        for stage in stages {
            let versions = self.get_latest_versions(name, stage).await?;
            if let Some(newest) = newest_version(versions) {
                info!(
                    "Resolved model '{}' to version {} (stage {})",
                    name, newest.version, stage
                );
                return Ok(newest);
            }
        }

        Err(Error::registry(format!(
            "no version of '{}' found in stages [{}]",
            name,
            stages.join(", ")
        )))
    }

    /// Artifact root of a specific model version
    pub async fn download_uri(&self, name: &str, version: &str) -> Result<String> {
        let request = self
            .http
            .get(self.endpoint("mlflow/model-versions/get-download-uri"))
            .query(&[("name", name), ("version", version)]);

        let response: DownloadUriResponse = self
            .send(request, "get-download-uri")
            .await?
            .json()
            .await
            .map_err(|e| Error::registry(format!("Malformed get-download-uri response: {}", e)))?;

        Ok(response.artifact_uri)
    }

    /// Fetch one file below an artifact root
    pub async fn fetch_artifact(&self, artifact_uri: &str, file: &str) -> Result<Vec<u8>> {
        let file = file.trim_start_matches('/');
        match ArtifactLocation::parse(artifact_uri)? {
            ArtifactLocation::Proxied(root) => {
                let path = if root.is_empty() {
                    file.to_string()
                } else {
                    format!("{}/{}", root, file)
                };
                let request = self
                    .http
                    .get(self.endpoint(&format!("mlflow-artifacts/artifacts/{}", path)));
                self.read_bytes(request, file).await
            }
            ArtifactLocation::Remote(url) => {
                let target = format!("{}/{}", url.as_str().trim_end_matches('/'), file);
                self.read_bytes(self.http.get(target), file).await
            }
            ArtifactLocation::Local(root) => {
                let path = root.join(file);
                std::fs::read(&path).map_err(|e| {
                    Error::artifact(format!("Failed to read {}: {}", path.display(), e))
                })
            }
        }
    }

    async fn read_bytes(&self, request: reqwest::RequestBuilder, file: &str) -> Result<Vec<u8>> {
        let bytes = self
            .send(request, &format!("artifact download of {}", file))
            .await?
            .bytes()
            .await
            .map_err(|e| Error::http(format!("Failed to read artifact {}: {}", file, e)))?;
        Ok(bytes.to_vec())
    }
}

/// Parse a tracking URI, accepting only http(s)
pub fn validate_tracking_uri(tracking_uri: &str) -> Result<Url> {
    let url = Url::parse(tracking_uri)
        .map_err(|e| Error::config(format!("Invalid tracking URI '{}': {}", tracking_uri, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(Error::config(format!(
                "Tracking URI scheme '{}' is not supported, use http or https",
                scheme
            )))
        }
    }

    if url.host_str().is_none() {
        return Err(Error::config("Tracking URI must have a host"));
    }

    Ok(url)
}

/// Highest version number among the candidates
fn newest_version(versions: Vec<RegisteredVersion>) -> Option<RegisteredVersion> {
    versions.into_iter().max_by(|a, b| {
        match (a.version.parse::<u64>(), b.version.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => a.version.cmp(&b.version),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(v: &str) -> RegisteredVersion {
        RegisteredVersion {
            name: "my_model".to_string(),
            version: v.to_string(),
            current_stage: None,
            source: None,
            run_id: None,
        }
    }

    #[test]
    fn test_newest_version_is_numeric() {
        let newest = newest_version(vec![version("9"), version("10"), version("2")]).unwrap();
        assert_eq!(newest.version, "10");
        assert!(newest_version(Vec::new()).is_none());
    }

    #[test]
    fn test_artifact_location() {
        assert_eq!(
            ArtifactLocation::parse("mlflow-artifacts:/3/abc/artifacts/model").unwrap(),
            ArtifactLocation::Proxied("3/abc/artifacts/model".to_string())
        );
        assert_eq!(
            ArtifactLocation::parse("models/my_model").unwrap(),
            ArtifactLocation::Local(PathBuf::from("models/my_model"))
        );
        assert!(matches!(
            ArtifactLocation::parse("https://bucket.example.com/model").unwrap(),
            ArtifactLocation::Remote(_)
        ));
        assert!(ArtifactLocation::parse("s3://bucket/model").is_err());
    }

    #[test]
    fn test_validate_tracking_uri() {
        assert!(validate_tracking_uri("https://dagshub.com/owner/repo.mlflow").is_ok());
        assert!(validate_tracking_uri("ftp://dagshub.com/x").is_err());
        assert!(validate_tracking_uri("not a url").is_err());
    }

    #[test]
    fn test_client_endpoints() {
        let client = RegistryClient::new(
            "https://dagshub.com/owner/repo.mlflow/",
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.tracking_uri(), "https://dagshub.com/owner/repo.mlflow");
        assert_eq!(
            client.endpoint("mlflow/model-versions/get-download-uri"),
            "https://dagshub.com/owner/repo.mlflow/api/2.0/mlflow/model-versions/get-download-uri"
        );
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = Credentials::new("secret-token");
        let printed = format!("{:?}", credentials);
        assert!(!printed.contains("secret-token"));
    }

    #[test]
    fn test_credentials_from_env() {
        std::env::set_var("SENTIVIEW_TEST_REGISTRY_TOKEN", "abc");
        let credentials = Credentials::from_env("SENTIVIEW_TEST_REGISTRY_TOKEN").unwrap();
        assert_eq!(credentials.token(), "abc");

        let err = Credentials::from_env("SENTIVIEW_TEST_UNSET_TOKEN").unwrap_err();
        assert!(err.to_string().contains("is not set"));
    }
}
