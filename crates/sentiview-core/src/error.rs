//! Error types for Sentiview

/// Result type alias using Sentiview's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Sentiview operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing or unusable credentials
    #[error("credentials error: {0}")]
    Credentials(String),

    /// Model registry lookups
    #[error("registry error: {0}")]
    Registry(String),

    /// Missing, unreadable or inconsistent model/vectorizer artifacts
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Vectorization or prediction failures
    #[error("inference error: {0}")]
    Inference(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport errors talking to the registry
    #[error("http error: {0}")]
    Http(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new credentials error
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials(msg.into())
    }

    /// Create a new registry error
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    /// Create a new artifact error
    pub fn artifact(msg: impl Into<String>) -> Self {
        Self::Artifact(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Short, stable name of the variant, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Credentials(_) => "credentials",
            Self::Registry(_) => "registry",
            Self::Artifact(_) => "artifact",
            Self::Inference(_) => "inference",
            Self::Io(_) => "io",
            Self::Http(_) => "http",
        }
    }
}
