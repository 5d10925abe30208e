use anyhow::{ensure, Result};
use serde::Serialize;

use crate::lda::FittedLda;

/// One (document, topic) cell of the gamma table, joined back to the
/// original input row via `source_index`.
#[derive(Debug, Clone, Serialize)]
pub struct GammaEntry {
    pub document: usize,
    pub source_index: usize,
    pub topic: usize,
    pub gamma: f64,
}

/// One (topic, term) cell of the beta table.
#[derive(Debug, Clone, Serialize)]
pub struct BetaEntry {
    pub topic: usize,
    pub term: String,
    pub beta: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicTerms {
    pub topic: usize,
    pub terms: Vec<(String, f64)>,
}

/// Everything the downstream chart and word-cloud consumers need, in one
/// serializable bundle.
#[derive(Debug, Serialize)]
pub struct TopicExport {
    pub top_terms: Vec<TopicTerms>,
    pub gamma: Vec<GammaEntry>,
    pub beta: Vec<BetaEntry>,
}

/// Top `n` terms per topic, descending by beta. Ties break on the term's
/// vocabulary index, i.e. first-seen order in the corpus.
pub fn top_terms(
    model: &FittedLda,
    vocabulary: &[String],
    n: usize,
) -> Result<Vec<Vec<(String, f64)>>> {
    ensure!(
        vocabulary.len() == model.n_terms(),
        "vocabulary size {} does not match model term count {}",
        vocabulary.len(),
        model.n_terms()
    );
    Ok(top_terms_from_beta(&model.beta(), vocabulary, n))
}

pub(crate) fn top_terms_from_beta(
    beta: &[Vec<f64>],
    vocabulary: &[String],
    n: usize,
) -> Vec<Vec<(String, f64)>> {
    beta.iter()
        .map(|row| {
            let mut pairs: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
            pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
            pairs
                .into_iter()
                .take(n)
                .map(|(id, p)| (vocabulary[id].clone(), p))
                .collect()
        })
        .collect()
}

/// Full gamma table as flat records. `source_indices` comes from the
/// empty-document filter and must cover every surviving document.
pub fn gamma_table(model: &FittedLda, source_indices: &[usize]) -> Result<Vec<GammaEntry>> {
    ensure!(
        source_indices.len() == model.n_docs(),
        "source index mapping covers {} documents but the model has {}",
        source_indices.len(),
        model.n_docs()
    );

    let mut entries = Vec::with_capacity(model.n_docs() * model.n_topics());
    for (document, row) in model.gamma().iter().enumerate() {
        for (topic, &gamma) in row.iter().enumerate() {
            entries.push(GammaEntry {
                document,
                source_index: source_indices[document],
                topic,
                gamma,
            });
        }
    }
    Ok(entries)
}

/// Full beta table as flat records.
pub fn beta_table(model: &FittedLda, vocabulary: &[String]) -> Result<Vec<BetaEntry>> {
    ensure!(
        vocabulary.len() == model.n_terms(),
        "vocabulary size {} does not match model term count {}",
        vocabulary.len(),
        model.n_terms()
    );

    let mut entries = Vec::with_capacity(model.n_topics() * model.n_terms());
    for (topic, row) in model.beta().iter().enumerate() {
        for (term_id, &beta) in row.iter().enumerate() {
            entries.push(BetaEntry {
                topic,
                term: vocabulary[term_id].clone(),
                beta,
            });
        }
    }
    Ok(entries)
}

/// Bundle all derived tables for export.
pub fn export_tables(
    model: &FittedLda,
    vocabulary: &[String],
    source_indices: &[usize],
    n_top_terms: usize,
) -> Result<TopicExport> {
    let top = top_terms(model, vocabulary, n_top_terms)?
        .into_iter()
        .enumerate()
        .map(|(topic, terms)| TopicTerms { topic, terms })
        .collect();

    Ok(TopicExport {
        top_terms: top,
        gamma: gamma_table(model, source_indices)?,
        beta: beta_table(model, vocabulary)?,
    })
}
