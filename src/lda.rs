use anyhow::{ensure, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::matrix::TermFrequencyMatrix;

#[derive(Debug, Clone)]
pub struct LdaConfig {
    pub n_topics: usize,
    /// Dirichlet prior on document-topic distributions.
    pub alpha: f64,
    /// Dirichlet prior on topic-term distributions.
    pub beta: f64,
    pub iterations: usize,
    pub seed: u64,
}

impl Default for LdaConfig {
    fn default() -> Self {
        LdaConfig {
            n_topics: 10,
            alpha: 0.1,
            beta: 0.01,
            iterations: 500,
            seed: 42,
        }
    }
}

pub struct LdaTrainer {
    config: LdaConfig,
}

/// Fitted model state: the count tables left behind by the final Gibbs
/// sweep. Gamma and beta are derived from these on demand and never stored.
#[derive(Debug)]
pub struct FittedLda {
    n_topics: usize,
    alpha: f64,
    beta_prior: f64,
    n_terms: usize,
    ndk: Vec<Vec<usize>>, // [doc][topic] tokens of doc assigned to topic
    nkw: Vec<Vec<usize>>, // [topic][term] occurrences of term in topic
    nk: Vec<usize>,       // [topic] total tokens assigned to topic
    doc_lengths: Vec<usize>,
}

impl LdaTrainer {
    pub fn new(config: LdaConfig) -> Self {
        LdaTrainer { config }
    }

    /// Fit by collapsed Gibbs sampling. Deterministic for a fixed matrix,
    /// config and seed.
    pub fn fit(&self, matrix: &TermFrequencyMatrix) -> Result<FittedLda> {
        let k = self.config.n_topics;
        let n_docs = matrix.n_docs();
        let n_terms = matrix.n_terms();

        ensure!(n_docs > 0, "term-frequency matrix has no rows");
        ensure!(k >= 2, "topic count must be at least 2, got {k}");
        ensure!(
            k <= n_terms,
            "topic count {k} exceeds vocabulary size {n_terms}"
        );

        let docs: Vec<Vec<usize>> = (0..n_docs).map(|d| matrix.doc_tokens(d)).collect();
        let doc_lengths: Vec<usize> = docs.iter().map(|d| d.len()).collect();

        let mut ndk = vec![vec![0usize; k]; n_docs];
        let mut nkw = vec![vec![0usize; n_terms]; k];
        let mut nk = vec![0usize; k];
        let mut z: Vec<Vec<usize>> = Vec::with_capacity(n_docs);

        let mut rng = StdRng::seed_from_u64(self.config.seed);

        // Random initialization of topic assignments
        for (d, doc) in docs.iter().enumerate() {
            let mut assignments = Vec::with_capacity(doc.len());
            for &w in doc {
                let topic = rng.gen_range(0..k);
                assignments.push(topic);
                ndk[d][topic] += 1;
                nkw[topic][w] += 1;
                nk[topic] += 1;
            }
            z.push(assignments);
        }

        let alpha = self.config.alpha;
        let beta = self.config.beta;
        let vb = n_terms as f64 * beta;

        for it in 0..self.config.iterations {
            for d in 0..n_docs {
                for pos in 0..docs[d].len() {
                    let w = docs[d][pos];
                    let old_topic = z[d][pos];

                    ndk[d][old_topic] -= 1;
                    nkw[old_topic][w] -= 1;
                    nk[old_topic] -= 1;

                    // p(t) ∝ (ndk[d][t] + alpha) * (nkw[t][w] + beta) / (nk[t] + V*beta)
                    let mut weights = vec![0.0f64; k];
                    for (t, weight) in weights.iter_mut().enumerate() {
                        let left = ndk[d][t] as f64 + alpha;
                        let right = (nkw[t][w] as f64 + beta) / (nk[t] as f64 + vb);
                        *weight = left * right;
                    }

                    let new_topic = match WeightedIndex::new(&weights) {
                        Ok(dist) => dist.sample(&mut rng),
                        // all weights zero, only possible with zero priors
                        Err(_) => rng.gen_range(0..k),
                    };

                    z[d][pos] = new_topic;
                    ndk[d][new_topic] += 1;
                    nkw[new_topic][w] += 1;
                    nk[new_topic] += 1;
                }
            }

            if (it + 1) % 50 == 0 {
                log::debug!("gibbs sweep {}/{}", it + 1, self.config.iterations);
            }
        }

        Ok(FittedLda {
            n_topics: k,
            alpha,
            beta_prior: beta,
            n_terms,
            ndk,
            nkw,
            nk,
            doc_lengths,
        })
    }
}

impl FittedLda {
    pub fn n_topics(&self) -> usize {
        self.n_topics
    }

    pub fn n_docs(&self) -> usize {
        self.ndk.len()
    }

    pub fn n_terms(&self) -> usize {
        self.n_terms
    }

    /// Per-document topic distribution.
    /// gamma[d][t] = (ndk[d][t] + alpha) / (N_d + K*alpha); each row sums to 1.
    pub fn gamma(&self) -> Vec<Vec<f64>> {
        let k = self.n_topics as f64;
        self.ndk
            .iter()
            .zip(&self.doc_lengths)
            .map(|(row, &len)| {
                let denom = len as f64 + k * self.alpha;
                row.iter()
                    .map(|&count| (count as f64 + self.alpha) / denom)
                    .collect()
            })
            .collect()
    }

    /// Per-topic term distribution.
    /// beta[t][w] = (nkw[t][w] + beta) / (nk[t] + V*beta); each row sums to 1.
    pub fn beta(&self) -> Vec<Vec<f64>> {
        let vb = self.n_terms as f64 * self.beta_prior;
        self.nkw
            .iter()
            .zip(&self.nk)
            .map(|(row, &total)| {
                let denom = total as f64 + vb;
                row.iter()
                    .map(|&count| (count as f64 + self.beta_prior) / denom)
                    .collect()
            })
            .collect()
    }
}
