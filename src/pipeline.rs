//! End-to-end data preparation.
//!
//! Runs the full data phase of an experiment: both corpora into pruned
//! vocabularies, both embedding files aligned to them, the phrase table into
//! training examples, and a deterministic train/dev partition. The result
//! carries the diagnostics a researcher checks before committing to a run
//! (vocabulary coverage, embedding OOV counts, partition sizes).

use crate::checkpoint::ModelArtifacts;
use crate::config::PipelineConfig;
use crate::embeddings::{EmbeddingAligner, EmbeddingMatrix};
use crate::error::RnnedResult;
use crate::model::ModelDims;
use crate::partition::partition;
use crate::phrases::{PhrasePair, PhrasePairExtractor};
use crate::vocab::{Vocabulary, VocabularyBuilder};

/// Everything the data phase produces.
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Source-language vocabulary
    pub source_vocab: Vocabulary,
    /// Target-language vocabulary
    pub target_vocab: Vocabulary,
    /// Source embeddings aligned to `source_vocab`
    pub source_embeddings: EmbeddingMatrix,
    /// Target embeddings aligned to `target_vocab`
    pub target_embeddings: EmbeddingMatrix,
    /// Fraction of the source corpus covered by the pruned vocabulary
    pub source_coverage: f64,
    /// Fraction of the target corpus covered by the pruned vocabulary
    pub target_coverage: f64,
    /// Source vocabulary types missing from the embedding file
    pub source_unk_count: i64,
    /// Target vocabulary types missing from the embedding file
    pub target_unk_count: i64,
    /// Training partition (80%)
    pub train_set: Vec<PhrasePair>,
    /// Validation partition (20%)
    pub dev_set: Vec<PhrasePair>,
}

impl PreparedData {
    /// Constructor dimensions for the external sequence model.
    pub fn model_dims(&self, hidden_size: usize) -> ModelDims {
        ModelDims {
            hidden_size,
            target_vocab_size: self.target_vocab.len(),
            embedding_dim: self.target_embeddings.dim(),
        }
    }

    /// Borrow the artifacts the checkpointer persists.
    pub fn artifacts(&self) -> ModelArtifacts<'_> {
        ModelArtifacts {
            source_vocab: &self.source_vocab,
            target_vocab: &self.target_vocab,
            source_embeddings: &self.source_embeddings,
            target_embeddings: &self.target_embeddings,
        }
    }
}

/// Run the data phase for one experiment configuration.
pub fn prepare(config: &PipelineConfig) -> RnnedResult<PreparedData> {
    config.validate()?;

    let builder = VocabularyBuilder::new(config.prune_threshold);
    let (source_coverage, source_vocab) = builder.build_from_path(&config.source_corpus)?;
    let (target_coverage, target_vocab) = builder.build_from_path(&config.target_corpus)?;
    tracing::info!(
        source_coverage_pct = source_coverage * 100.0,
        target_coverage_pct = target_coverage * 100.0,
        source_vocab = source_vocab.len(),
        target_vocab = target_vocab.len(),
        "vocabularies built"
    );

    let aligner = EmbeddingAligner::new(config.embedding_dim);
    let (source_unk_count, source_embeddings) =
        aligner.align_from_path(&config.source_embeddings, &source_vocab)?;
    let (target_unk_count, target_embeddings) =
        aligner.align_from_path(&config.target_embeddings, &target_vocab)?;
    tracing::info!(
        source_unk_count,
        target_unk_count,
        "embeddings aligned to vocabularies"
    );

    let extractor = PhrasePairExtractor::new(
        &source_vocab,
        &target_vocab,
        &source_embeddings,
        &target_embeddings,
    );
    let pairs = extractor.extract_from_path(&config.phrase_table)?;

    let (train_set, dev_set) = partition(pairs, config.seed);
    tracing::info!(
        train = train_set.len(),
        dev = dev_set.len(),
        "examples partitioned"
    );

    Ok(PreparedData {
        source_vocab,
        target_vocab,
        source_embeddings,
        target_embeddings,
        source_coverage,
        target_coverage,
        source_unk_count,
        target_unk_count,
        train_set,
        dev_set,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_embeddings(path: &std::path::Path, dim: usize, entries: &[(&str, Vec<f32>)]) {
        let mut bytes = format!("{} {}\n", entries.len(), dim).into_bytes();
        for (token, vector) in entries {
            bytes.extend_from_slice(token.as_bytes());
            bytes.push(b' ');
            for value in vector {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
            bytes.push(b'\n');
        }
        fs::write(path, bytes).unwrap();
    }

    fn write_gzip(path: &std::path::Path, text: &str) {
        let file = fs::File::create(path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn test_prepare_end_to_end() {
        let dir = tempdir().unwrap();
        let source_corpus = dir.path().join("train.src");
        let target_corpus = dir.path().join("train.tgt");
        let source_vectors = dir.path().join("vectors.src.bin");
        let target_vectors = dir.path().join("vectors.tgt.bin");
        let phrase_table = dir.path().join("phrase-table.gz");

        fs::write(&source_corpus, "a b a\na\n").unwrap();
        fs::write(&target_corpus, "u v\nu\n").unwrap();
        write_embeddings(
            &source_vectors,
            2,
            &[("a", vec![0.1, 0.2]), ("b", vec![0.3, 0.4])],
        );
        write_embeddings(&target_vectors, 2, &[("u", vec![0.5, 0.6])]);
        write_gzip(
            &phrase_table,
            "a b ||| u\na ||| v ||| 0.5\nzz ||| u\na ||| qq\n",
        );

        let config = PipelineConfig::test().with_embedding_dim(2);
        let config = PipelineConfig {
            source_corpus,
            target_corpus,
            source_embeddings: source_vectors,
            target_embeddings: target_vectors,
            phrase_table,
            ..config
        };

        let data = prepare(&config).unwrap();

        // Vocabularies: {UNK, a, b} and {UNK, u, v}, full coverage.
        assert_eq!(data.source_vocab.len(), 3);
        assert_eq!(data.target_vocab.len(), 3);
        assert!((data.source_coverage - 1.0).abs() < 1e-12);
        assert!((data.target_coverage - 1.0).abs() < 1e-12);

        // "v" missing from the target embedding file.
        assert_eq!(data.source_unk_count, 0);
        assert_eq!(data.target_unk_count, 1);

        // Lines 3 and 4 are all-OOV on one side and dropped.
        assert_eq!(data.train_set.len() + data.dev_set.len(), 2);

        let dims = data.model_dims(config.hidden_size);
        assert_eq!(dims.target_vocab_size, 3);
        assert_eq!(dims.embedding_dim, 2);
        assert_eq!(dims.hidden_size, config.hidden_size);
    }

    #[test]
    fn test_prepare_rejects_dimension_mismatch() {
        let dir = tempdir().unwrap();
        let source_corpus = dir.path().join("train.src");
        let target_corpus = dir.path().join("train.tgt");
        let source_vectors = dir.path().join("vectors.src.bin");

        fs::write(&source_corpus, "a\n").unwrap();
        fs::write(&target_corpus, "u\n").unwrap();
        write_embeddings(&source_vectors, 3, &[("a", vec![0.1, 0.2, 0.3])]);

        let config = PipelineConfig {
            source_corpus,
            target_corpus,
            source_embeddings: source_vectors,
            ..PipelineConfig::test().with_embedding_dim(2)
        };

        assert!(prepare(&config).is_err());
    }

    #[test]
    fn test_prepare_validates_config_first() {
        let config = PipelineConfig::test().with_batch_size(0);
        assert!(prepare(&config).is_err());
    }
}
