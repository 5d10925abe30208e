use std::collections::HashSet;

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::Serialize;

/// Number of documents left with zero tokens after each normalization stage.
/// Diagnostic only; the filter decides what actually gets removed.
#[derive(Debug, Default, Clone, Serialize)]
pub struct StageReport {
    pub after_lowercase: usize,
    pub after_punctuation: usize,
    pub after_digits: usize,
    pub after_stopwords: usize,
    pub after_stemming: usize,
}

/// Applies the cleaning stages in a fixed order: lowercase, strip
/// punctuation, strip digits, remove stopwords, stem. Stopword matching
/// happens after lowercasing and before stemming, so the list entries are
/// passed through the same lowercase/punctuation/digit cleanup at
/// construction time (e.g. "isn't" must match the token "isnt").
///
/// The punctuation stage covers symbol characters too ("$", "=", "<"),
/// which POSIX [:punct:] includes but Unicode \p{P} does not.
pub struct Normalizer {
    stopwords: HashSet<String>,
    stemmer: Stemmer,
    punctuation: Regex,
    digits: Regex,
}

impl Normalizer {
    pub fn new(stopwords: impl IntoIterator<Item = String>) -> Self {
        let punctuation = Regex::new(r"[\p{P}\p{S}]+").unwrap();
        let digits = Regex::new(r"\d+").unwrap();

        let stopwords = stopwords
            .into_iter()
            .map(|w| {
                let lowered = w.to_lowercase();
                let stripped = punctuation.replace_all(&lowered, "");
                digits.replace_all(&stripped, "").into_owned()
            })
            .filter(|w| !w.is_empty())
            .collect();

        Normalizer {
            stopwords,
            stemmer: Stemmer::create(Algorithm::English),
            punctuation,
            digits,
        }
    }

    /// Normalizer with the standard English stopword list.
    pub fn english() -> Self {
        Self::new(stop_words::get(stop_words::LANGUAGE::English))
    }

    /// Run all five stages over a single document.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let no_punct = self.strip_punctuation(&lowered);
        let no_digits = self.strip_digits(&no_punct);
        let content = self.remove_stopwords(&no_digits);
        self.stem(&content)
    }

    /// Run all five stages over the whole corpus, counting how many
    /// documents are empty after each stage.
    pub fn normalize_corpus(&self, docs: &[String]) -> (Vec<String>, StageReport) {
        let mut report = StageReport::default();

        let mut current: Vec<String> = docs.iter().map(|d| d.to_lowercase()).collect();
        report.after_lowercase = count_empty(&current);

        current = current.iter().map(|d| self.strip_punctuation(d)).collect();
        report.after_punctuation = count_empty(&current);

        current = current.iter().map(|d| self.strip_digits(d)).collect();
        report.after_digits = count_empty(&current);

        current = current.iter().map(|d| self.remove_stopwords(d)).collect();
        report.after_stopwords = count_empty(&current);

        current = current.iter().map(|d| self.stem(d)).collect();
        report.after_stemming = count_empty(&current);

        (current, report)
    }

    fn strip_punctuation(&self, text: &str) -> String {
        self.punctuation.replace_all(text, "").into_owned()
    }

    fn strip_digits(&self, text: &str) -> String {
        self.digits.replace_all(text, "").into_owned()
    }

    fn remove_stopwords(&self, text: &str) -> String {
        text.split_whitespace()
            .filter(|token| !self.stopwords.contains(*token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    // A stem can land on a stopword ("sameness" -> "same"), so the stemmed
    // stream is filtered against the list again to keep the output a fixed
    // point of the whole pipeline.
    fn stem(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|token| self.stemmer.stem(token))
            .filter(|token| !self.stopwords.contains(token.as_ref()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn count_empty(docs: &[String]) -> usize {
    docs.iter()
        .filter(|d| d.split_whitespace().next().is_none())
        .count()
}

/// Corpus after empty documents have been dropped. `source_indices[i]` is
/// the position of `docs[i]` in the original input, so per-document results
/// can be joined back to their source rows.
#[derive(Debug, Clone)]
pub struct FilteredCorpus {
    pub docs: Vec<String>,
    pub source_indices: Vec<usize>,
}

/// Drop documents that normalized to nothing, keeping relative order.
pub fn filter_empty(docs: Vec<String>) -> FilteredCorpus {
    let mut kept = Vec::new();
    let mut source_indices = Vec::new();

    for (i, doc) in docs.into_iter().enumerate() {
        if doc.split_whitespace().next().is_some() {
            source_indices.push(i);
            kept.push(doc);
        }
    }

    FilteredCorpus {
        docs: kept,
        source_indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize_all(normalizer: &Normalizer, docs: &[&str]) -> (Vec<String>, StageReport) {
        let owned: Vec<String> = docs.iter().map(|d| d.to_string()).collect();
        normalizer.normalize_corpus(&owned)
    }

    fn the_only() -> Normalizer {
        Normalizer::new(vec!["the".to_string()])
    }

    #[test]
    fn strips_case_punctuation_and_digits() {
        let normalizer = Normalizer::english();
        let out = normalizer.normalize("Starship 3000: the CREW runs!");
        assert!(!out.contains('3'));
        assert!(!out.contains(':'));
        assert!(!out.contains("the"));
        assert!(out.contains("crew"));
    }

    #[test]
    fn strips_symbol_characters_like_posix_punct() {
        let normalizer = the_only();
        let out = normalizer.normalize("win <big|prize> for $100 = glory^");
        for ch in ['<', '|', '>', '$', '=', '^'] {
            assert!(!out.contains(ch), "{ch:?} survived in {out:?}");
        }
        assert!(out.split_whitespace().any(|t| t == "win"));
    }

    #[test]
    fn hero_and_run_survive_normalization() {
        let (normalized, _) =
            normalize_all(&the_only(), &["The Hero ran quickly.", "Running heroes run."]);
        assert_eq!(normalized.len(), 2);
        for doc in &normalized {
            assert!(doc.split_whitespace().next().is_some());
        }
        assert!(normalized[0].split_whitespace().any(|t| t == "hero"));
        assert!(normalized[1].split_whitespace().any(|t| t == "run"));
        for doc in &normalized {
            assert!(doc.split_whitespace().all(|t| t != "the"));
        }
    }

    #[test]
    fn normalization_is_idempotent_on_its_own_output() {
        let normalizer = Normalizer::new(
            ["the", "a", "an", "and"].map(String::from),
        );
        let inputs = [
            "Star wars: the ship runs! 42",
            "A hero runs across 7 galaxies.",
            "Ships, stars, and wars.",
        ];
        for input in inputs {
            let once = normalizer.normalize(input);
            let twice = normalizer.normalize(&once);
            assert_eq!(once, twice, "normalizing {input:?} twice changed the output");
        }
    }

    #[test]
    fn tokens_that_stem_to_a_stopword_are_removed() {
        // "sameness" stems to "same"; with "same" on the list the token must
        // not survive the first pass only to vanish on a second one.
        let normalizer = Normalizer::new(["the", "same"].map(String::from));
        let once = normalizer.normalize("The sameness persists");
        assert_eq!(once, "persist");
        assert_eq!(normalizer.normalize(&once), once);

        assert_eq!(normalizer.normalize("sameness"), "");
    }

    #[test]
    fn pure_stopword_document_becomes_empty_and_is_filtered() {
        let (normalized, report) =
            normalize_all(&the_only(), &["The, the; the.", "Heroes run."]);
        assert_eq!(report.after_stopwords, 1);
        assert_eq!(report.after_stemming, 1);

        let filtered = filter_empty(normalized);
        assert_eq!(filtered.docs.len(), 1);
        assert_eq!(filtered.source_indices, vec![1]);
    }

    #[test]
    fn filter_preserves_relative_order() {
        let docs = vec![
            "alpha ship".to_string(),
            "".to_string(),
            "beta star".to_string(),
            "   ".to_string(),
            "gamma war".to_string(),
        ];
        let filtered = filter_empty(docs);
        assert_eq!(
            filtered.docs,
            vec!["alpha ship", "beta star", "gamma war"]
        );
        assert_eq!(filtered.source_indices, vec![0, 2, 4]);
    }

    #[test]
    fn custom_stopword_list_is_honored() {
        let normalizer = Normalizer::new(vec!["spaceship".to_string()]);
        let out = normalizer.normalize("The spaceship landed");
        assert!(out.split_whitespace().all(|t| t != "spaceship"));
        // "the" is not in the custom list, so it survives
        assert!(out.split_whitespace().any(|t| t == "the"));
    }
}
