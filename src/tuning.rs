use serde::Serialize;

use crate::lda::{LdaConfig, LdaTrainer};
use crate::matrix::TermFrequencyMatrix;

/// Metric row for one candidate topic count. `cao_juan` is the mean pairwise
/// cosine similarity between topic-term distributions (lower means better
/// separated topics); `deveaud` is the mean pairwise symmetric KL divergence
/// (higher is better). A failed fit leaves both metrics unset and records
/// the error instead.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateMetrics {
    pub n_topics: usize,
    pub cao_juan: Option<f64>,
    pub deveaud: Option<f64>,
    pub error: Option<String>,
}

/// Fit one model per candidate topic count, all from the same base config
/// and seed, and report the separation metrics. Picking the final count is
/// left to the caller; this only produces the table. One candidate failing
/// does not abort the others.
pub fn evaluate_topic_counts(
    matrix: &TermFrequencyMatrix,
    candidates: &[usize],
    base: &LdaConfig,
) -> Vec<CandidateMetrics> {
    candidates
        .iter()
        .map(|&k| {
            let config = LdaConfig {
                n_topics: k,
                ..base.clone()
            };
            match LdaTrainer::new(config).fit(matrix) {
                Ok(model) => {
                    let beta = model.beta();
                    CandidateMetrics {
                        n_topics: k,
                        cao_juan: Some(mean_pairwise_cosine(&beta)),
                        deveaud: Some(mean_pairwise_divergence(&beta)),
                        error: None,
                    }
                }
                Err(e) => CandidateMetrics {
                    n_topics: k,
                    cao_juan: None,
                    deveaud: None,
                    error: Some(format!("{e:#}")),
                },
            }
        })
        .collect()
}

fn mean_pairwise_cosine(beta: &[Vec<f64>]) -> f64 {
    mean_over_pairs(beta, cosine_similarity)
}

fn mean_pairwise_divergence(beta: &[Vec<f64>]) -> f64 {
    mean_over_pairs(beta, symmetric_kl)
}

fn mean_over_pairs(rows: &[Vec<f64>], f: fn(&[f64], &[f64]) -> f64) -> f64 {
    let k = rows.len();
    if k < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..k {
        for j in (i + 1)..k {
            total += f(&rows[i], &rows[j]);
            pairs += 1;
        }
    }
    total / pairs as f64
}

fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// Both distributions are beta-smoothed, so every component is positive and
// the divergence stays finite.
fn symmetric_kl(a: &[f64], b: &[f64]) -> f64 {
    let kl = |p: &[f64], q: &[f64]| -> f64 {
        p.iter()
            .zip(q)
            .map(|(&pi, &qi)| pi * (pi / qi).ln())
            .sum()
    };
    0.5 * (kl(a, b) + kl(b, a))
}
