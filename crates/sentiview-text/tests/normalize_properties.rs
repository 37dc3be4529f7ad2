//! Property tests for the normalization pipeline

use proptest::prelude::*;
use regex::Regex;
use sentiview_text::{is_stop_word, normalize, Lemmatizer, Stage, TextNormalizer, DIGIT_PATTERN};

proptest! {
    #[test]
    fn normalize_is_total(text in "\\PC{0,120}") {
        let _ = normalize(&text);
    }

    #[test]
    fn output_has_no_decimal_digits(text in "\\PC{0,120}") {
        let out = normalize(&text);
        let digit = Regex::new(DIGIT_PATTERN).unwrap();
        prop_assert!(!digit.is_match(&out), "digits left in {:?}", out);
    }

    #[test]
    fn output_is_single_spaced_and_trimmed(text in "\\PC{0,120}") {
        let out = normalize(&text);
        prop_assert_eq!(out.trim(), out.as_str());
        prop_assert!(!out.contains("  "));
        prop_assert!(!out.contains('\t') && !out.contains('\n'));
    }

    #[test]
    fn output_has_no_ascii_punctuation(text in "[ -~]{0,120}") {
        let out = normalize(&text);
        prop_assert!(!out.chars().any(|c| c.is_ascii_punctuation()), "punctuation left in {:?}", out);
    }

    #[test]
    fn ascii_output_is_lowercase(text in "[ -~]{0,120}") {
        let out = normalize(&text);
        prop_assert_eq!(out.to_lowercase(), out);
    }

    #[test]
    fn trace_ends_with_normalize(text in "[ -~]{0,80}") {
        let normalizer = TextNormalizer::new().unwrap();
        let steps = normalizer.trace(&text);
        prop_assert_eq!(steps.len(), Stage::ALL.len());
        prop_assert_eq!(&steps[steps.len() - 1].1, &normalizer.normalize(&text));
    }

    #[test]
    fn canonical_words_are_fixed_points(words in prop::collection::vec("[a-z]{4,8}", 0..8)) {
        // Lowercase, stop-word-free words already in base form survive every stage.
        let lemmatizer = Lemmatizer::new();
        let words: Vec<String> = words
            .into_iter()
            .filter(|w| !is_stop_word(w) && lemmatizer.lemmatize(w) == *w)
            .collect();
        let text = words.join(" ");
        prop_assert_eq!(normalize(&text), text);
    }
}

#[test]
fn shared_normalizer_across_threads() {
    let normalizer = std::sync::Arc::new(TextNormalizer::new().unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let normalizer = normalizer.clone();
            std::thread::spawn(move || normalizer.normalize(&format!("The {} Cats are HERE", i)))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "cat");
    }
}
