//! Sentiview Text
//!
//! Deterministic normalization of raw user text into the canonical form the
//! sentiment vectorizer was fitted on.
//!
//! The pipeline is a pure function: no I/O, no shared mutable state. A
//! [`TextNormalizer`] can be built once and shared across threads, or the
//! [`normalize`] free function can be used with the process-wide default.

pub mod lemmatizer;
pub mod normalizer;
pub mod stopwords;

pub use lemmatizer::Lemmatizer;
pub use normalizer::{normalize, Granularity, Stage, TextNormalizer, DIGIT_PATTERN, URL_PATTERN};
pub use stopwords::{is_stop_word, StopWords, ENGLISH_STOP_WORDS};
