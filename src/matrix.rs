use std::collections::HashMap;

use anyhow::{ensure, Result};
use counter::Counter;

use crate::corpus::FilteredCorpus;

/// Sparse document x term count matrix. Term ids are assigned in first-seen
/// order across the corpus, which keeps the column layout stable for a given
/// input and gives downstream tie-breaking a documented order.
#[derive(Debug, Clone)]
pub struct TermFrequencyMatrix {
    vocabulary: Vec<String>,
    term_ids: HashMap<String, usize>,
    rows: Vec<HashMap<usize, usize>>,
}

impl TermFrequencyMatrix {
    pub fn build(corpus: &FilteredCorpus) -> Result<Self> {
        ensure!(
            !corpus.docs.is_empty(),
            "cannot build a term-frequency matrix from an empty corpus"
        );

        let mut vocabulary: Vec<String> = Vec::new();
        let mut term_ids: HashMap<String, usize> = HashMap::new();
        let mut rows = Vec::with_capacity(corpus.docs.len());

        for doc in &corpus.docs {
            for token in doc.split_whitespace() {
                if !term_ids.contains_key(token) {
                    term_ids.insert(token.to_string(), vocabulary.len());
                    vocabulary.push(token.to_string());
                }
            }

            let counts: Counter<&str> = doc.split_whitespace().collect();
            let mut row = HashMap::with_capacity(counts.len());
            for (token, count) in counts.iter() {
                row.insert(term_ids[*token], *count);
            }
            rows.push(row);
        }

        Ok(TermFrequencyMatrix {
            vocabulary,
            term_ids,
            rows,
        })
    }

    pub fn n_docs(&self) -> usize {
        self.rows.len()
    }

    pub fn n_terms(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn term_id(&self, term: &str) -> Option<usize> {
        self.term_ids.get(term).copied()
    }

    pub fn get(&self, doc: usize, term: usize) -> usize {
        self.rows[doc].get(&term).copied().unwrap_or(0)
    }

    pub fn row_sum(&self, doc: usize) -> usize {
        self.rows[doc].values().sum()
    }

    /// Expand a row back into a word-id stream (each term id repeated by its
    /// count, ascending by id). The Gibbs sampler assigns a topic per token
    /// occurrence, so it consumes this rather than the sparse row.
    pub fn doc_tokens(&self, doc: usize) -> Vec<usize> {
        let mut entries: Vec<(usize, usize)> = self.rows[doc]
            .iter()
            .map(|(id, count)| (*id, *count))
            .collect();
        entries.sort_by_key(|(id, _)| *id);

        entries
            .into_iter()
            .flat_map(|(id, count)| std::iter::repeat(id).take(count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::FilteredCorpus;
    use std::collections::HashSet;

    fn corpus(docs: &[&str]) -> FilteredCorpus {
        FilteredCorpus {
            docs: docs.iter().map(|d| d.to_string()).collect(),
            source_indices: (0..docs.len()).collect(),
        }
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let result = TermFrequencyMatrix::build(&corpus(&[]));
        assert!(result.is_err());
    }

    #[test]
    fn vocabulary_covers_exactly_the_observed_tokens() {
        let matrix =
            TermFrequencyMatrix::build(&corpus(&["hero run run", "ship hero", "star"])).unwrap();

        let expected: HashSet<&str> = ["hero", "run", "ship", "star"].into_iter().collect();
        let actual: HashSet<&str> = matrix.vocabulary().iter().map(|s| s.as_str()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn vocabulary_is_in_first_seen_order() {
        let matrix =
            TermFrequencyMatrix::build(&corpus(&["hero run run", "ship hero", "star"])).unwrap();
        assert_eq!(matrix.vocabulary(), ["hero", "run", "ship", "star"]);
        assert_eq!(matrix.term_id("ship"), Some(2));
        assert_eq!(matrix.term_id("missing"), None);
    }

    #[test]
    fn counts_match_occurrences() {
        let matrix = TermFrequencyMatrix::build(&corpus(&["hero run run", "ship hero"])).unwrap();
        let run = matrix.term_id("run").unwrap();
        let hero = matrix.term_id("hero").unwrap();
        let ship = matrix.term_id("ship").unwrap();

        assert_eq!(matrix.get(0, run), 2);
        assert_eq!(matrix.get(0, hero), 1);
        assert_eq!(matrix.get(0, ship), 0);
        assert_eq!(matrix.get(1, ship), 1);
    }

    #[test]
    fn every_row_has_at_least_one_entry() {
        let matrix =
            TermFrequencyMatrix::build(&corpus(&["hero run run", "ship hero", "star"])).unwrap();
        for doc in 0..matrix.n_docs() {
            assert!(matrix.row_sum(doc) >= 1);
        }
    }

    #[test]
    fn doc_tokens_expand_counts() {
        let matrix = TermFrequencyMatrix::build(&corpus(&["hero run run"])).unwrap();
        let hero = matrix.term_id("hero").unwrap();
        let run = matrix.term_id("run").unwrap();
        assert_eq!(matrix.doc_tokens(0), vec![hero, run, run]);
    }
}
