//! Fitted bag-of-words vectorizer
//!
//! The vectorizer is fitted by the training pipeline and exported as JSON:
//!
//! ```json
//! {
//!   "kind": "tfidf",
//!   "vocabulary": {"love": 0, "movie": 1, "terrible": 2},
//!   "ngram_range": [1, 1],
//!   "idf": [1.2, 1.0, 1.7],
//!   "norm": "l2"
//! }
//! ```
//!
//! Tokens follow the usual bag-of-words pattern of two or more word
//! characters; terms outside the vocabulary are ignored.

use regex::Regex;
use sentiview_core::{Error, FeatureRow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Token pattern used when the vectorizer was fitted
pub const TOKEN_PATTERN: &str = r"\b\w\w+\b";

/// Maps normalized text to a fixed-width feature row
pub trait Vectorizer: Send + Sync {
    /// Transform one text into a feature row of width [`Vectorizer::width`]
    fn transform(&self, text: &str) -> Result<FeatureRow>;

    /// Vocabulary size
    fn width(&self) -> usize;
}

/// Weighting applied to raw term counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorizerKind {
    /// Raw term counts
    #[default]
    Count,
    /// Term counts scaled by inverse document frequency
    Tfidf,
}

/// Row normalization applied after weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// On-disk form of a fitted vectorizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    #[serde(default)]
    pub kind: VectorizerKind,

    /// Term -> column index
    pub vocabulary: HashMap<String, usize>,

    /// Inclusive word n-gram range
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),

    /// Clip counts to 1
    #[serde(default)]
    pub binary: bool,

    /// Inverse document frequencies, one per column (tfidf only)
    #[serde(default)]
    pub idf: Option<Vec<f32>>,

    /// Replace tf with 1 + ln(tf)
    #[serde(default)]
    pub sublinear_tf: bool,

    #[serde(default)]
    pub norm: Option<Norm>,

    #[serde(default = "default_true")]
    pub lowercase: bool,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_true() -> bool {
    true
}

/// Vectorizer restored from a [`VectorizerArtifact`]
#[derive(Debug, Clone)]
pub struct FittedVectorizer {
    artifact: VectorizerArtifact,
    token_regex: Regex,
}

impl FittedVectorizer {
    /// Load and validate a vectorizer artifact from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::artifact(format!("Failed to read vectorizer {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate a vectorizer artifact from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: VectorizerArtifact = serde_json::from_str(json)
            .map_err(|e| Error::artifact(format!("Invalid vectorizer artifact: {}", e)))?;
        Self::from_artifact(artifact)
    }

    /// Validate an already-parsed artifact
    pub fn from_artifact(artifact: VectorizerArtifact) -> Result<Self> {
        let width = artifact.vocabulary.len();
        if width == 0 {
            return Err(Error::artifact("Vectorizer vocabulary is empty"));
        }

        let mut seen = vec![false; width];
        for (term, &index) in &artifact.vocabulary {
            if index >= width {
                return Err(Error::artifact(format!(
                    "Vocabulary index {} for '{}' is out of range (width {})",
                    index, term, width
                )));
            }
            if seen[index] {
                return Err(Error::artifact(format!(
                    "Vocabulary index {} is assigned more than once",
                    index
                )));
            }
            seen[index] = true;
        }

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(Error::artifact(format!(
                "Invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }

        if artifact.kind == VectorizerKind::Tfidf {
            match &artifact.idf {
                Some(idf) if idf.len() == width => {}
                Some(idf) => {
                    return Err(Error::artifact(format!(
                        "idf has {} entries but vocabulary has {}",
                        idf.len(),
                        width
                    )))
                }
                None => return Err(Error::artifact("tfidf vectorizer is missing idf")),
            }
        }

        let token_regex = Regex::new(TOKEN_PATTERN)
            .map_err(|e| Error::artifact(format!("Failed to compile token pattern: {}", e)))?;

        Ok(Self {
            artifact,
            token_regex,
        })
    }

    pub fn kind(&self) -> VectorizerKind {
        self.artifact.kind
    }

    /// Column index of a term, if it is in the vocabulary
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.artifact.vocabulary.get(term).copied()
    }

    fn tokens<'a>(&self, text: &'a str) -> Vec<std::borrow::Cow<'a, str>> {
        self.token_regex
            .find_iter(text)
            .map(|m| {
                if self.artifact.lowercase {
                    std::borrow::Cow::Owned(m.as_str().to_lowercase())
                } else {
                    std::borrow::Cow::Borrowed(m.as_str())
                }
            })
            .collect()
    }

    fn count_terms(&self, text: &str, row: &mut [f32]) {
        let tokens = self.tokens(text);
        let (min_n, max_n) = self.artifact.ngram_range;

        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            for window in tokens.windows(n) {
                let term = window.join(" ");
                if let Some(index) = self.index_of(&term) {
                    row[index] += 1.0;
                }
            }
        }
    }
}

impl Vectorizer for FittedVectorizer {
    fn transform(&self, text: &str) -> Result<FeatureRow> {
        let mut row = FeatureRow::zeros(self.width());
        let values = row.values_mut();
        self.count_terms(text, values);

        if self.artifact.binary {
            values.iter_mut().filter(|v| **v > 0.0).for_each(|v| *v = 1.0);
        }

        if self.artifact.kind == VectorizerKind::Tfidf {
            if self.artifact.sublinear_tf {
                values
                    .iter_mut()
                    .filter(|v| **v > 0.0)
                    .for_each(|v| *v = 1.0 + v.ln());
            }
            if let Some(idf) = &self.artifact.idf {
                values.iter_mut().zip(idf).for_each(|(v, w)| *v *= w);
            }
        }

        if let Some(norm) = self.artifact.norm {
            let magnitude = match norm {
                Norm::L1 => values.iter().map(|v| v.abs()).sum::<f32>(),
                Norm::L2 => values.iter().map(|v| v * v).sum::<f32>().sqrt(),
            };
            if magnitude > 0.0 {
                values.iter_mut().for_each(|v| *v /= magnitude);
            }
        }

        Ok(row)
    }

    fn width(&self) -> usize {
        self.artifact.vocabulary.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNT_ARTIFACT: &str = r#"{
        "kind": "count",
        "vocabulary": {"love": 0, "movie": 1, "terrible": 2, "love movie": 3},
        "ngram_range": [1, 2]
    }"#;

    #[test]
    fn test_count_with_bigrams() {
        let vectorizer = FittedVectorizer::from_json(COUNT_ARTIFACT).unwrap();
        let row = vectorizer.transform("love movie love").unwrap();
        assert_eq!(row.values(), &[2.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_and_short_tokens_ignored() {
        let vectorizer = FittedVectorizer::from_json(COUNT_ARTIFACT).unwrap();
        let row = vectorizer.transform("a boring film").unwrap();
        assert_eq!(row.nnz(), 0);

        let empty = vectorizer.transform("").unwrap();
        assert_eq!(empty.width(), 4);
        assert_eq!(empty.nnz(), 0);
    }

    #[test]
    fn test_binary_counts() {
        let json = r#"{"vocabulary": {"good": 0, "bad": 1}, "binary": true}"#;
        let vectorizer = FittedVectorizer::from_json(json).unwrap();
        let row = vectorizer.transform("good good good").unwrap();
        assert_eq!(row.values(), &[1.0, 0.0]);
    }

    #[test]
    fn test_tfidf_l2() {
        let json = r#"{
            "kind": "tfidf",
            "vocabulary": {"good": 0, "bad": 1},
            "idf": [3.0, 4.0],
            "norm": "l2"
        }"#;
        let vectorizer = FittedVectorizer::from_json(json).unwrap();
        let row = vectorizer.transform("good bad").unwrap();
        assert!((row.values()[0] - 0.6).abs() < 1e-6);
        assert!((row.values()[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_tfidf_requires_matching_idf() {
        let json = r#"{"kind": "tfidf", "vocabulary": {"good": 0, "bad": 1}, "idf": [1.0]}"#;
        let err = FittedVectorizer::from_json(json).unwrap_err();
        assert!(matches!(err, Error::Artifact(_)));
    }

    #[test]
    fn test_rejects_inconsistent_vocabulary() {
        let duplicate = r#"{"vocabulary": {"good": 0, "bad": 0}}"#;
        assert!(FittedVectorizer::from_json(duplicate).is_err());

        let out_of_range = r#"{"vocabulary": {"good": 5}}"#;
        assert!(FittedVectorizer::from_json(out_of_range).is_err());

        assert!(FittedVectorizer::from_json(r#"{"vocabulary": {}}"#).is_err());
        assert!(FittedVectorizer::from_json("not json").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = FittedVectorizer::from_file("/definitely/not/here/vectorizer.json").unwrap_err();
        assert!(err.to_string().contains("vectorizer"));
    }
}
