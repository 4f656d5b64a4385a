use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use trialmatch::{
    find_similar_trials, rank_batch, read_queries, read_query, CorpusSnapshot, CorpusStore,
    MemoryCorpusStore, ScoringConfig, TopTrialsResponse, TrialRanker, WeightTable,
};
use trialmatch_storage::{import_corpus, open_corpus};

/// Rank indexed clinical trials by similarity to a candidate trial
#[derive(Parser, Debug)]
#[command(name = "trialmatch")]
#[command(about = "Field-weighted clinical trial similarity ranking", long_about = None)]
struct Args {
    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct ScoringArgs {
    /// Corpus file: a JSON array of trials or a binary snapshot
    #[arg(short, long)]
    corpus: PathBuf,

    /// Weight table JSON; the built-in composite weights when omitted
    #[arg(short, long)]
    weights: Option<PathBuf>,

    /// Scoring config JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of trials returned
    #[arg(short = 'k', long)]
    top_k: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank the corpus against one query trial
    Rank {
        #[command(flatten)]
        scoring: ScoringArgs,

        /// Query trial JSON object
        #[arg(short, long)]
        query: PathBuf,

        /// Disease to match within; defaults to the query's disease
        #[arg(short, long)]
        disease: Option<String>,
    },
    /// Rank the corpus against many query trials in parallel
    RankBatch {
        #[command(flatten)]
        scoring: ScoringArgs,

        /// JSON array of query trials, each naming its disease
        #[arg(long)]
        queries: PathBuf,
    },
    /// Validate a JSON corpus and write it as a binary snapshot
    Import {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Expected embedding dimension
        #[arg(long)]
        dim: Option<usize>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchEntry {
    nct_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<TopTrialsResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .with_context(|| format!("invalid log level '{}'", log_level))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn build_ranker(args: &ScoringArgs) -> anyhow::Result<TrialRanker> {
    let weights = match &args.weights {
        Some(path) => WeightTable::load(path)?,
        None => WeightTable::default(),
    };
    let config = match &args.config {
        Some(path) => ScoringConfig::load(path)?,
        None => ScoringConfig::default(),
    };
    let ranker = TrialRanker::new(weights, config)?;
    Ok(match args.top_k {
        Some(top_k) => ranker.with_top_k(top_k)?,
        None => ranker,
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_corpus(path: &Path, ranker: &TrialRanker) -> anyhow::Result<MemoryCorpusStore> {
    let store = open_corpus(path, ranker.config().expected_dim)
        .with_context(|| format!("cannot open corpus {}", path.display()))?;
    info!("Loaded {} trials from {:?}", store.len(), path);
    Ok(store)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    match args.command {
        Command::Rank {
            scoring,
            query,
            disease,
        } => {
            let ranker = build_ranker(&scoring)?;
            let store = load_corpus(&scoring.corpus, &ranker)?;
            let query = read_query(&query, ranker.config().expected_dim)
                .with_context(|| format!("cannot read query {}", query.display()))?;

            let response = find_similar_trials(&store, &ranker, &query, disease.as_deref())?;
            if let Some(warning) = &response.warning {
                tracing::warn!("{}", warning);
            }
            print_json(&response)?;
        }
        Command::RankBatch { scoring, queries } => {
            let ranker = build_ranker(&scoring)?;
            let store = load_corpus(&scoring.corpus, &ranker)?;
            let queries = read_queries(&queries, ranker.config().expected_dim)
                .with_context(|| format!("cannot read queries {}", queries.display()))?;
            info!("Ranking {} queries", queries.len());

            let entries: Vec<BatchEntry> = queries
                .iter()
                .zip(rank_batch(&store, &ranker, &queries))
                .map(|(query, result)| {
                    let (response, error) = match result {
                        Ok(response) => (Some(response), None),
                        Err(e) => (None, Some(e.to_string())),
                    };
                    BatchEntry {
                        nct_number: query.nct_number.clone(),
                        response,
                        error,
                    }
                })
                .collect();
            print_json(&entries)?;
        }
        Command::Import { input, output, dim } => {
            let store = import_corpus(&input, dim)
                .with_context(|| format!("cannot import {}", input.display()))?;
            CorpusSnapshot::from_store(&store)?.save(&output)?;
            info!(
                "Imported {} trials across {} diseases into {:?}",
                store.len(),
                store.diseases()?.len(),
                output
            );
        }
    }

    Ok(())
}
