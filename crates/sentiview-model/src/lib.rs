//! Sentiview Model
//!
//! Collaborators that turn normalized text into a prediction:
//! - [`Vectorizer`]: fitted bag-of-words transform, loaded from a local file
//! - [`Model`]: linear classifier scored with Candle tensors
//! - [`RegistryClient`]: resolves a model version by name and stage from an
//!   MLflow-compatible tracking server and downloads its artifact
//!
//! Everything here is loaded once at startup and is read-only afterwards.

pub mod artifacts;
pub mod linear;
pub mod registry;
pub mod vectorizer;

pub use artifacts::{check_compatible, load_model, load_vectorizer, LoadedModel, ModelSource};
pub use linear::{LinearModel, LinearModelArtifact, Model};
pub use registry::{ArtifactLocation, Credentials, RegisteredVersion, RegistryClient, DEFAULT_STAGES};
pub use vectorizer::{FittedVectorizer, Norm, Vectorizer, VectorizerArtifact, VectorizerKind};
