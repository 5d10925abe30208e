use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

mod corpus;
mod lda;
mod loader;
mod matrix;
mod results;
mod tuning;

use corpus::{filter_empty, Normalizer};
use lda::{LdaConfig, LdaTrainer};
use matrix::TermFrequencyMatrix;

#[derive(Parser, Debug)]
#[command(version, about = "Discover latent topics in a CSV of plot synopses", long_about = None)]
struct Args {
    path: PathBuf,
    #[clap(short = 'c', long, default_value = "plot_synopsis", help = "CSV column holding the document text")]
    text_column: String,
    #[clap(short = 'k', long, default_value_t = 10, help = "Number of topics to fit")]
    topics: usize,
    #[clap(short = 'n', long, default_value_t = 10, help = "Top terms to print per topic")]
    top_terms: usize,
    #[clap(long, default_value_t = 500, help = "Gibbs sampling iterations")]
    iterations: usize,
    #[clap(long, default_value_t = 42)]
    seed: u64,
    #[clap(long, help = "Evaluate a range of candidate topic counts before fitting")]
    tune: bool,
    #[clap(long, default_value_t = 2)]
    tune_min: usize,
    #[clap(long, default_value_t = 20)]
    tune_max: usize,
    #[clap(long, default_value_t = 2)]
    tune_step: usize,
    #[clap(long, help = "Write the gamma/beta/top-terms tables as JSON")]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("Loading documents from {}...", args.path.display());
    let raw = loader::load_documents(&args.path, &args.text_column)?;
    println!("Loaded {} documents", raw.len());

    let normalizer = Normalizer::english();
    let (normalized, report) = normalizer.normalize_corpus(&raw);
    println!("Empty documents after each stage:");
    println!("  lowercase:    {}", report.after_lowercase);
    println!("  punctuation:  {}", report.after_punctuation);
    println!("  digits:       {}", report.after_digits);
    println!("  stopwords:    {}", report.after_stopwords);
    println!("  stemming:     {}", report.after_stemming);

    let filtered = filter_empty(normalized);
    println!(
        "Removed {} empty documents, {} remain",
        raw.len() - filtered.docs.len(),
        filtered.docs.len()
    );

    let matrix = TermFrequencyMatrix::build(&filtered)?;
    println!(
        "Term-frequency matrix: {} documents x {} terms",
        matrix.n_docs(),
        matrix.n_terms()
    );

    let config = LdaConfig {
        n_topics: args.topics,
        iterations: args.iterations,
        seed: args.seed,
        ..LdaConfig::default()
    };

    if args.tune {
        let candidates: Vec<usize> = (args.tune_min..=args.tune_max)
            .step_by(args.tune_step.max(1))
            .collect();
        println!("Evaluating {} candidate topic counts...", candidates.len());
        let table = tuning::evaluate_topic_counts(&matrix, &candidates, &config);

        println!("{:>6} {:>12} {:>12}", "k", "cao_juan", "deveaud");
        for row in &table {
            match (row.cao_juan, row.deveaud) {
                (Some(c), Some(d)) => println!("{:>6} {:>12.4} {:>12.4}", row.n_topics, c, d),
                _ => println!(
                    "{:>6} failed: {}",
                    row.n_topics,
                    row.error.as_deref().unwrap_or("unknown error")
                ),
            }
        }
        println!("(cao_juan: lower is better, deveaud: higher is better)");
    }

    println!(
        "Fitting LDA with {} topics ({} iterations, seed {})...",
        config.n_topics, config.iterations, config.seed
    );
    let model = LdaTrainer::new(config).fit(&matrix)?;

    let tops = results::top_terms(&model, matrix.vocabulary(), args.top_terms)?;
    println!("Top terms per topic:");
    for (topic, terms) in tops.iter().enumerate() {
        let line = terms
            .iter()
            .map(|(term, beta)| format!("{term} ({beta:.3})"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  Topic {topic:>2}: {line}");
    }

    if let Some(out) = &args.export {
        let export = results::export_tables(
            &model,
            matrix.vocabulary(),
            &filtered.source_indices,
            args.top_terms,
        )?;
        let file =
            File::create(out).with_context(|| format!("failed to create {}", out.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &export)
            .with_context(|| format!("failed to write {}", out.display()))?;
        println!("✅ Wrote topic tables to {}", out.display());
    }

    Ok(())
}
