use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};
use vsm_core::collection::{read_queries, read_relevance, CollectionFiles, QueryId};
use vsm_core::engine::{render_answers, QueryEngine};
use vsm_core::eval::{evaluate, Metric};
use vsm_core::persist::{now_rfc3339, IndexPaths};
use vsm_core::{Scheme, TextNormalization};

#[derive(Parser)]
#[command(name = "search")]
#[command(about = "Rank documents and evaluate weighting schemes over processed indexes", long_about = None)]
struct Cli {
    /// Directory holding the collection files
    #[arg(long, global = true, env = "COLLECTIONS_DIR", default_value = "./collections")]
    collections_dir: PathBuf,
    /// Directory holding processed indexes
    #[arg(long, global = true, env = "PROCESSED_DIR", default_value = "./processed")]
    processed_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the k best documents for a keyword query as `doc:score` pairs
    Query {
        collection: String,
        /// Weighting scheme: tf [n, l], df [n, t], norm [n, c], e.g. ltc
        scheme: Scheme,
        /// Text normalization: l (lemmatization) or s (stemming)
        method: TextNormalization,
        /// Maximum number of answers
        k: NonZeroUsize,
        query: String,
    },
    /// Score n randomly chosen queries from <collection>.QRY with MRR or MAP
    Evaluate {
        collection: String,
        scheme: Scheme,
        method: TextNormalization,
        k: NonZeroUsize,
        /// Number of queries to sample
        n: NonZeroUsize,
        /// mrr or map
        metric: Metric,
        /// Seed for query sampling
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Evaluate every scheme, method and metric and write a JSON report
    Sweep {
        collection: String,
        #[arg(long, default_value = "100")]
        k: NonZeroUsize,
        #[arg(long, default_value = "10")]
        n: NonZeroUsize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "results/evaluation_results.json")]
        output: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct SweepRow {
    metric: String,
    tokenization: char,
    weighting: String,
    score: f64,
}

#[derive(Debug, Serialize)]
struct SweepReport {
    collection: String,
    k: usize,
    queries: Vec<QueryId>,
    created_at: String,
    results: Vec<SweepRow>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let engine = QueryEngine::new(IndexPaths::new(&cli.processed_dir));

    match cli.command {
        Commands::Query { collection, scheme, method, k, query } => {
            let answers = engine.answer(&collection, scheme, method, k.get(), &query)?;
            println!("{}", render_answers(&answers));
            Ok(())
        }
        Commands::Evaluate { collection, scheme, method, k, n, metric, seed } => {
            let files = CollectionFiles::new(&cli.collections_dir, &collection);
            let queries = sample_queries(&files.queries(), n.get(), seed)?;
            let relevance = read_relevance(&files.relevance())?;
            let index = engine.load(&collection, method)?;
            let value = evaluate(&index, &queries, &relevance, method, scheme, k.get(), metric)?;
            println!("{value:.3}");
            Ok(())
        }
        Commands::Sweep { collection, k, n, seed, output } => {
            let files = CollectionFiles::new(&cli.collections_dir, &collection);
            let queries = sample_queries(&files.queries(), n.get(), seed)?;
            let relevance = read_relevance(&files.relevance())?;

            let mut results = Vec::new();
            for method in TextNormalization::ALL {
                let index = engine.load(&collection, method)?;
                for metric in Metric::ALL {
                    for scheme in Scheme::all() {
                        let score = evaluate(&index, &queries, &relevance, method, scheme, k.get(), metric)?;
                        tracing::info!(%metric, %method, %scheme, score, "sweep result");
                        results.push(SweepRow { metric: metric.to_string(), tokenization: method.code(), weighting: scheme.to_string(), score });
                    }
                }
            }

            let report = SweepReport {
                collection,
                k: k.get(),
                queries: queries.into_iter().map(|(id, _)| id).collect(),
                created_at: now_rfc3339(),
                results,
            };
            write_report(&output, &report)?;
            tracing::info!(output = %output.display(), "sweep report written");
            Ok(())
        }
    }
}

/// Sample `n` queries without replacement; one seed yields the same sample every run.
fn sample_queries(path: &Path, n: usize, seed: Option<u64>) -> Result<Vec<(QueryId, String)>> {
    let all = read_queries(path)?;
    if n > all.len() {
        tracing::warn!(requested = n, available = all.len(), "fewer queries than requested, using all");
    }
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    Ok(all.choose_multiple(&mut rng, n).cloned().collect())
}

fn write_report(path: &Path, report: &SweepReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sampling_is_repeatable_and_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Q.QRY");
        fs::write(&path, ".I 1\n.W\none\n.I 2\n.W\ntwo\n.I 3\n.W\nthree\n").unwrap();

        let a = sample_queries(&path, 2, Some(7)).unwrap();
        let b = sample_queries(&path, 2, Some(7)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(sample_queries(&path, 10, Some(7)).unwrap().len(), 3);
    }

    #[test]
    fn cli_rejects_invalid_scheme_and_k() {
        assert!(Cli::try_parse_from(["search", "query", "CISI", "xyz", "s", "5", "q"]).is_err());
        assert!(Cli::try_parse_from(["search", "query", "CISI", "ltc", "x", "5", "q"]).is_err());
        assert!(Cli::try_parse_from(["search", "query", "CISI", "ltc", "s", "0", "q"]).is_err());
        assert!(Cli::try_parse_from(["search", "query", "CISI", "ltc", "l", "5", "q"]).is_ok());
    }
}
