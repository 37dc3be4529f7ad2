//! Text normalization pipeline
//!
//! Raw input text is mapped to the canonical form the vectorizer was fitted
//! on by running six stages in a fixed order. Later stages rely on the shape
//! produced by earlier ones, so the order lives in one place: [`Stage::ALL`].
//!
//! | # | stage        | granularity |
//! |---|--------------|-------------|
//! | 1 | lowercase    | token       |
//! | 2 | stop words   | token       |
//! | 3 | digits       | character   |
//! | 4 | punctuation  | character   |
//! | 5 | urls         | substring   |
//! | 6 | lemmatize    | token       |
//!
//! Token stages split on whitespace and rejoin with single spaces. Character
//! stages filter individual chars and can merge or split tokens.

use crate::lemmatizer::Lemmatizer;
use crate::stopwords::StopWords;
use regex::Regex;
use sentiview_core::{Error, Result};
use std::fmt;
use std::sync::OnceLock;

/// Pattern for links; greedy up to the next whitespace
pub const URL_PATTERN: &str = r"https?://\S+|www\.\S+";

/// Decimal digits in any script (Unicode `Nd`); fractions and numeral letters are kept
pub const DIGIT_PATTERN: &str = r"\p{Nd}";

/// Arabic semicolon, which is not ASCII punctuation but is stripped alongside it
const ARABIC_SEMICOLON: char = '\u{061B}';

/// What a stage operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Whitespace-separated tokens, rejoined with single spaces
    Token,
    /// Individual characters
    Character,
    /// Regex matches anywhere in the string
    Substring,
}

/// One step of the normalization pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Lowercase,
    StopWords,
    Digits,
    Punctuation,
    Urls,
    Lemmatize,
}

impl Stage {
    /// Every stage, in execution order
    pub const ALL: [Stage; 6] = [
        Stage::Lowercase,
        Stage::StopWords,
        Stage::Digits,
        Stage::Punctuation,
        Stage::Urls,
        Stage::Lemmatize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Lowercase => "lowercase",
            Self::StopWords => "stop_words",
            Self::Digits => "digits",
            Self::Punctuation => "punctuation",
            Self::Urls => "urls",
            Self::Lemmatize => "lemmatize",
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Self::Lowercase | Self::StopWords | Self::Lemmatize => Granularity::Token,
            Self::Digits | Self::Punctuation => Granularity::Character,
            Self::Urls => Granularity::Substring,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reusable normalizer; all state is read-only after construction
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stop_words: StopWords,
    digit_regex: Regex,
    url_regex: Regex,
    lemmatizer: Lemmatizer,
}

impl TextNormalizer {
    /// Create a normalizer with the built-in stop words and lemmatizer
    pub fn new() -> Result<Self> {
        Self::with_lemmatizer(Lemmatizer::new())
    }

    /// Create a normalizer around a custom lemmatizer
    pub fn with_lemmatizer(lemmatizer: Lemmatizer) -> Result<Self> {
        Ok(Self {
            stop_words: StopWords::english(),
            digit_regex: Regex::new(DIGIT_PATTERN)
                .map_err(|e| Error::config(format!("Failed to compile digit regex: {}", e)))?,
            url_regex: Regex::new(URL_PATTERN)
                .map_err(|e| Error::config(format!("Failed to compile URL regex: {}", e)))?,
            lemmatizer,
        })
    }

    /// Run every stage in order
    pub fn normalize(&self, text: &str) -> String {
        Stage::ALL
            .iter()
            .fold(text.to_string(), |acc, stage| self.apply(*stage, &acc))
    }

    /// Output after each stage, in order
    pub fn trace(&self, text: &str) -> Vec<(Stage, String)> {
        let mut current = text.to_string();
        let mut steps = Vec::with_capacity(Stage::ALL.len());
        for stage in Stage::ALL {
            current = self.apply(stage, &current);
            steps.push((stage, current.clone()));
        }
        steps
    }

    /// Apply a single stage
    pub fn apply(&self, stage: Stage, text: &str) -> String {
        match stage {
            Stage::Lowercase => lower_case(text),
            Stage::StopWords => self.remove_stop_words(text),
            Stage::Digits => self.remove_digits(text),
            Stage::Punctuation => remove_punctuation(text),
            Stage::Urls => self.remove_urls(text),
            Stage::Lemmatize => self.lemmatize(text),
        }
    }

    fn remove_stop_words(&self, text: &str) -> String {
        join_tokens(
            text.split_whitespace()
                .filter(|token| !self.stop_words.contains(token)),
        )
    }

    fn remove_digits(&self, text: &str) -> String {
        self.digit_regex.replace_all(text, "").into_owned()
    }

    fn remove_urls(&self, text: &str) -> String {
        self.url_regex.replace_all(text, "").into_owned()
    }

    fn lemmatize(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|token| self.lemmatizer.lemmatize(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new().expect("Failed to create text normalizer")
    }
}

fn join_tokens<'a>(tokens: impl Iterator<Item = &'a str>) -> String {
    tokens.collect::<Vec<_>>().join(" ")
}

fn lower_case(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn remove_punctuation(text: &str) -> String {
    let spaced: String = text
        .chars()
        .filter(|c| *c != ARABIC_SEMICOLON)
        .map(|c| if c.is_ascii_punctuation() { ' ' } else { c })
        .collect();
    join_tokens(spaced.split_whitespace())
}

/// Normalize text with the process-wide default normalizer
pub fn normalize(text: &str) -> String {
    static DEFAULT: OnceLock<TextNormalizer> = OnceLock::new();
    DEFAULT.get_or_init(TextNormalizer::default).normalize(text)
}
