//! Data preparation binary.
//!
//! Usage:
//!   prepare [OPTIONS]
//!
//! Examples:
//!   # Prepare with the default experiment layout under ./data
//!   prepare
//!
//!   # Explicit inputs and a custom prune threshold
//!   prepare --source-corpus fr.tok --target-corpus en.tok \
//!           --phrase-table phrase-table.gz --prune-threshold 10000
//!
//! Runs the full data phase (vocabularies, embedding alignment, phrase-pair
//! extraction, train/dev split) and reports the diagnostics; the model
//! training loop is driven separately once an external model is attached.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rnned_train_rs::config::PipelineConfig;
use rnned_train_rs::error::RnnedResult;
use rnned_train_rs::pipeline;

#[derive(Parser)]
#[command(name = "prepare")]
#[command(about = "Prepare phrase-pair training data for the translation scorer")]
#[command(version)]
struct Args {
    /// Tokenized source-language corpus
    #[arg(long, default_value = "data/train.src")]
    source_corpus: PathBuf,

    /// Tokenized target-language corpus
    #[arg(long, default_value = "data/train.tgt")]
    target_corpus: PathBuf,

    /// Source-language word2vec binary embeddings
    #[arg(long, default_value = "data/vectors.src.bin")]
    source_embeddings: PathBuf,

    /// Target-language word2vec binary embeddings
    #[arg(long, default_value = "data/vectors.tgt.bin")]
    target_embeddings: PathBuf,

    /// Gzip-compressed phrase table
    #[arg(long, default_value = "data/phrase-table.gz")]
    phrase_table: PathBuf,

    /// Directory checkpoints are written to
    #[arg(short = 'o', long, default_value = "data/model")]
    output_dir: PathBuf,

    /// Vocabulary size after frequency pruning
    #[arg(long, default_value = "5000")]
    prune_threshold: usize,

    /// Word embedding dimensionality
    #[arg(long, default_value = "50")]
    embedding_dim: usize,

    /// Shuffle and partition seed
    #[arg(long, default_value = "324")]
    seed: u64,
}

fn main() -> RnnedResult<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PipelineConfig {
        source_corpus: args.source_corpus,
        target_corpus: args.target_corpus,
        source_embeddings: args.source_embeddings,
        target_embeddings: args.target_embeddings,
        phrase_table: args.phrase_table,
        output_dir: args.output_dir,
        prune_threshold: args.prune_threshold,
        embedding_dim: args.embedding_dim,
        seed: args.seed,
        ..PipelineConfig::default()
    };

    let data = pipeline::prepare(&config)?;

    tracing::info!(
        source_vocab = data.source_vocab.len(),
        target_vocab = data.target_vocab.len(),
        source_coverage_pct = data.source_coverage * 100.0,
        target_coverage_pct = data.target_coverage * 100.0,
        source_unk_count = data.source_unk_count,
        target_unk_count = data.target_unk_count,
        train = data.train_set.len(),
        dev = data.dev_set.len(),
        "data preparation complete"
    );
    Ok(())
}
