//! Noun lemmatizer
//!
//! Reduces inflected nouns to their dictionary base form using WordNet-style
//! noun morphology: an exception table for irregular plurals is consulted
//! first, then suffix detachment rules are applied. Words that only look
//! plural (`glass`, `news`, `specimen`) are left alone.
//!
//! Without a dictionary the rules are guarded by built-in word lists. When a
//! noun index is loaded (the lemma column of WordNet's `index.noun`), a
//! detached form is only accepted if it is a known noun, and the shortest
//! known candidate wins.

use sentiview_core::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Irregular plural -> base form
const NOUN_EXCEPTIONS: &[(&str, &str)] = &[
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("mice", "mouse"),
    ("lice", "louse"),
    ("oxen", "ox"),
    ("data", "datum"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("analyses", "analysis"),
    ("crises", "crisis"),
    ("theses", "thesis"),
    ("hypotheses", "hypothesis"),
    ("diagnoses", "diagnosis"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("appendices", "appendix"),
    ("cacti", "cactus"),
    ("fungi", "fungus"),
    ("alumni", "alumnus"),
    ("stimuli", "stimulus"),
    ("buses", "bus"),
    ("quizzes", "quiz"),
    ("wolves", "wolf"),
    ("knives", "knife"),
    ("lives", "life"),
    ("wives", "wife"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("selves", "self"),
    ("thieves", "thief"),
    ("loaves", "loaf"),
    ("calves", "calf"),
    ("elves", "elf"),
    ("hooves", "hoof"),
    ("scarves", "scarf"),
    ("goes", "go"),
];

/// WordNet noun detachment rules, `(suffix, replacement)`
const NOUN_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("ves", "f"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

/// Words ending in a plural-looking suffix that are base forms or not nouns at all
const INVARIANT_NOUNS: &[&str] = &[
    "sometimes", "towards", "afterwards", "backwards", "forwards", "upwards",
    "downwards", "outwards", "besides", "clothes", "seems",
    "news", "series", "species", "means", "lens", "always", "perhaps", "thanks",
    "physics", "mathematics", "economics", "politics", "ethics", "electronics",
    "linguistics", "genetics", "gymnastics", "aerobics", "acoustics", "logistics",
    "chaos", "cosmos", "ethos", "pathos", "kudos", "bias", "alias", "atlas",
    "canvas", "gas", "christmas", "texas", "whereas", "pancreas", "headquarters",
    "scissors", "trousers", "specimen", "omen", "amen", "abdomen", "semen",
    "stamen", "ramen", "hymen", "regimen", "acumen", "albumen", "bitumen",
    "cyclamen", "dolmen", "lumen", "yemen", "carmen",
];

/// Base forms ending in `ie`, whose plural must not take the `ies -> y` rule
const IE_BASES: &[&str] = &[
    "movie", "cookie", "pie", "tie", "lie", "die", "zombie", "rookie", "hippie",
    "selfie", "calorie", "prairie", "goalie", "brownie", "smoothie", "genie",
    "boogie", "sweetie", "freebie", "newbie", "indie", "veggie", "auntie",
    "hoodie", "techie", "birdie", "eerie", "magpie", "necktie", "walkie",
];

/// Base forms ending in `che`, whose plural must not take the `ches -> ch` rule
const CHE_BASES: &[&str] = &[
    "ache", "headache", "toothache", "heartache", "stomachache", "backache",
    "earache", "niche", "cliche", "creche", "quiche", "avalanche", "moustache",
    "mustache", "psyche", "panache", "microfiche", "cache", "attache", "douche",
];

/// WordNet-style noun lemmatizer
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    exceptions: HashMap<String, String>,
    invariant: HashSet<&'static str>,
    ie_bases: HashSet<&'static str>,
    che_bases: HashSet<&'static str>,
    /// Known noun lemmas; when present, detached forms must appear here
    nouns: Option<HashSet<String>>,
}

impl Lemmatizer {
    /// Create a lemmatizer with the built-in exception table
    pub fn new() -> Self {
        Self {
            exceptions: NOUN_EXCEPTIONS
                .iter()
                .map(|(inflected, base)| (inflected.to_string(), base.to_string()))
                .collect(),
            invariant: INVARIANT_NOUNS.iter().copied().collect(),
            ie_bases: IE_BASES.iter().copied().collect(),
            che_bases: CHE_BASES.iter().copied().collect(),
            nouns: None,
        }
    }

    /// Create a lemmatizer and extend it with a WordNet `noun.exc` style file
    pub fn with_exceptions_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut lemmatizer = Self::new();
        let added = lemmatizer.load_exceptions(path)?;
        debug!("Loaded {} extra noun exceptions", added);
        Ok(lemmatizer)
    }

    /// Merge exceptions from a file with one `inflected base [base...]` entry per line.
    ///
    /// Blank lines and lines starting with `#` are skipped; only the first base
    /// is used. Returns the number of entries read.
    pub fn load_exceptions(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read lemmatizer exceptions {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut count = 0;
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some(inflected), Some(base)) => {
                    self.exceptions
                        .insert(inflected.to_lowercase(), base.to_lowercase());
                    count += 1;
                }
                _ => {
                    return Err(Error::config(format!(
                        "{}:{}: expected '<inflected> <base>'",
                        path.display(),
                        line_no + 1
                    )))
                }
            }
        }

        Ok(count)
    }

    /// Load noun lemmas from a WordNet `index.noun` file or a one-word-per-line list.
    ///
    /// Only the first field of each line is used. Lines starting with a space
    /// (the WordNet license header) or `#` are skipped. Returns the number of
    /// lemmas known afterwards.
    pub fn load_noun_index(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read noun index {}: {}", path.display(), e))
        })?;

        let nouns = self.nouns.get_or_insert_with(HashSet::new);
        for line in content.lines() {
            if line.starts_with(' ') || line.starts_with('#') {
                continue;
            }
            if let Some(lemma) = line.split_whitespace().next() {
                nouns.insert(lemma.to_lowercase());
            }
        }

        if nouns.is_empty() {
            return Err(Error::config(format!(
                "Noun index {} contains no lemmas",
                path.display()
            )));
        }
        Ok(nouns.len())
    }

    /// Number of exception entries
    pub fn exception_count(&self) -> usize {
        self.exceptions.len()
    }

    /// Number of known noun lemmas, if an index is loaded
    pub fn noun_count(&self) -> Option<usize> {
        self.nouns.as_ref().map(HashSet::len)
    }

    /// Map a token to its noun base form; unknown shapes are returned unchanged
    pub fn lemmatize(&self, word: &str) -> String {
        if let Some(nouns) = &self.nouns {
            return self.lemmatize_known(word, nouns);
        }

        if let Some(base) = self.exceptions.get(word) {
            return base.clone();
        }

        if self.invariant.contains(word) || word.chars().count() <= 3 {
            return word.to_string();
        }

        self.detach_suffix(word).unwrap_or_else(|| word.to_string())
    }

    fn lemmatize_known(&self, word: &str, nouns: &HashSet<String>) -> String {
        let candidates: Vec<String> = match self.exceptions.get(word) {
            Some(base) => vec![word.to_string(), base.clone()],
            None => std::iter::once(word.to_string())
                .chain(NOUN_RULES.iter().filter_map(|(suffix, replacement)| {
                    word.strip_suffix(suffix)
                        .map(|stem| format!("{}{}", stem, replacement))
                }))
                .collect(),
        };

        candidates
            .into_iter()
            .filter(|candidate| nouns.contains(candidate))
            .min_by_key(String::len)
            .unwrap_or_else(|| word.to_string())
    }

    fn detach_suffix(&self, word: &str) -> Option<String> {
        // All suffixes are ASCII, so byte slicing after ends_with is on a char boundary.
        let strip = |n: usize| &word[..word.len() - n];

        if word.ends_with("men") {
            return Some(format!("{}an", strip(2)));
        }

        if word.ends_with("ies") {
            let singular = strip(1);
            if self.ie_bases.contains(singular) {
                return Some(singular.to_string());
            }
            return Some(format!("{}y", strip(3)));
        }

        if word.ends_with("ches") || word.ends_with("shes") {
            let singular = strip(1);
            if self.che_bases.contains(singular) {
                return Some(singular.to_string());
            }
            return Some(strip(2).to_string());
        }

        if word.ends_with("sses") || word.ends_with("xes") || word.ends_with("zzes") {
            return Some(strip(2).to_string());
        }

        if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            return None;
        }

        word.strip_suffix('s').map(str::to_string)
    }
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_regular_plurals() {
        let lemmatizer = Lemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("cats"), "cat");
        assert_eq!(lemmatizer.lemmatize("games"), "game");
        assert_eq!(lemmatizer.lemmatize("ideas"), "idea");
        assert_eq!(lemmatizer.lemmatize("boxes"), "box");
        assert_eq!(lemmatizer.lemmatize("classes"), "class");
        assert_eq!(lemmatizer.lemmatize("churches"), "church");
        assert_eq!(lemmatizer.lemmatize("wishes"), "wish");
        assert_eq!(lemmatizer.lemmatize("houses"), "house");
    }

    #[test]
    fn test_ies_plurals() {
        let lemmatizer = Lemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("stories"), "story");
        assert_eq!(lemmatizer.lemmatize("movies"), "movie");
        assert_eq!(lemmatizer.lemmatize("cookies"), "cookie");
    }

    #[test]
    fn test_irregular_plurals() {
        let lemmatizer = Lemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("children"), "child");
        assert_eq!(lemmatizer.lemmatize("women"), "woman");
        assert_eq!(lemmatizer.lemmatize("wolves"), "wolf");
        assert_eq!(lemmatizer.lemmatize("feet"), "foot");
        assert_eq!(lemmatizer.lemmatize("headaches"), "headache");
    }

    #[test]
    fn test_compound_men() {
        let lemmatizer = Lemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("firemen"), "fireman");
        assert_eq!(lemmatizer.lemmatize("specimen"), "specimen");
    }

    #[test]
    fn test_non_plurals_unchanged() {
        let lemmatizer = Lemmatizer::new();
        for word in ["glass", "news", "virus", "analysis", "bus", "amazing", "love", "movie"] {
            assert_eq!(lemmatizer.lemmatize(word), word);
        }
    }

    #[test]
    fn test_non_nouns_keep_their_s() {
        let lemmatizer = Lemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("goes"), "go");
        for word in ["seems", "sometimes", "towards", "clothes"] {
            assert_eq!(lemmatizer.lemmatize(word), word);
        }
    }

    fn noun_index() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  1 This software and database is being provided").unwrap();
        writeln!(file, "cat n 1 2 @ ~ 1 0 02121620").unwrap();
        writeln!(file, "clothes n 1 1 @ 1 0 03051540").unwrap();
        writeln!(file, "go n 4 2 @ ~ 4 0 06805594").unwrap();
        writeln!(file, "story n 6 2 @ ~ 6 0 06369829").unwrap();
        writeln!(file, "movie n 1 2 @ ~ 1 0 06613686").unwrap();
        writeln!(file, "child n 4 2 @ ~ 4 0 09917593").unwrap();
        writeln!(file, "glass n 7 2 @ ~ 7 0 14881303").unwrap();
        writeln!(file, "wolf n 3 2 @ ~ 3 0 02114100").unwrap();
        file
    }

    #[test]
    fn test_noun_index_filters_candidates() {
        let mut lemmatizer = Lemmatizer::new();
        let known = lemmatizer.load_noun_index(noun_index().path()).unwrap();
        assert_eq!(known, 8);
        assert_eq!(lemmatizer.noun_count(), Some(8));

        assert_eq!(lemmatizer.lemmatize("cats"), "cat");
        assert_eq!(lemmatizer.lemmatize("stories"), "story");
        assert_eq!(lemmatizer.lemmatize("movies"), "movie");
        assert_eq!(lemmatizer.lemmatize("wolves"), "wolf");
        assert_eq!(lemmatizer.lemmatize("children"), "child");
        assert_eq!(lemmatizer.lemmatize("goes"), "go");
        assert_eq!(lemmatizer.lemmatize("glasses"), "glass");
        // Detached forms that are not nouns are rejected
        for word in ["seems", "sometimes", "towards", "clothes", "runs"] {
            assert_eq!(lemmatizer.lemmatize(word), word);
        }
    }

    #[test]
    fn test_empty_noun_index_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# nothing here").unwrap();

        let mut lemmatizer = Lemmatizer::new();
        assert!(lemmatizer.load_noun_index(file.path()).is_err());
        assert!(Lemmatizer::new().load_noun_index("/nonexistent/index.noun").is_err());
    }

    #[test]
    fn test_exceptions_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# extra entries").unwrap();
        writeln!(file, "geese goose").unwrap();
        writeln!(file, "corpora corpus").unwrap();
        writeln!(file).unwrap();

        let lemmatizer = Lemmatizer::with_exceptions_file(file.path()).unwrap();
        assert_eq!(lemmatizer.lemmatize("corpora"), "corpus");
        assert_eq!(lemmatizer.exception_count(), NOUN_EXCEPTIONS.len() + 1);
    }

    #[test]
    fn test_malformed_exceptions_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "lonely").unwrap();

        let err = Lemmatizer::with_exceptions_file(file.path()).unwrap_err();
        assert!(err.to_string().contains(":1:"));
    }
}
