//! Pipeline configuration.
//!
//! Centralizes the hyperparameters and file locations for one experiment run.
//! Defaults match the reference experiment setup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RnnedError, RnnedResult};

/// Configuration for the data-preparation and training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Initial learning rate
    pub learning_rate: f64,
    /// Mini-batch size
    pub batch_size: usize,
    /// Hidden layer size of the sequence model
    pub hidden_size: usize,
    /// Seed for deterministic shuffling and partitioning
    pub seed: u64,
    /// Word embedding dimensionality (must match the embedding files)
    pub embedding_dim: usize,
    /// Maximum number of training epochs
    pub epochs: usize,
    /// Histogram-pruning threshold for both vocabularies
    pub prune_threshold: usize,
    /// Source-language training corpus (one sentence per line)
    pub source_corpus: PathBuf,
    /// Target-language training corpus (one sentence per line)
    pub target_corpus: PathBuf,
    /// Pretrained source embeddings (word2vec binary format)
    pub source_embeddings: PathBuf,
    /// Pretrained target embeddings (word2vec binary format)
    pub target_embeddings: PathBuf,
    /// Gzip-compressed phrase table
    pub phrase_table: PathBuf,
    /// Directory for model checkpoints
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.0827,
            batch_size: 1000,
            hidden_size: 500,
            seed: 324,
            embedding_dim: 50,
            epochs: 25,
            prune_threshold: 5000,
            source_corpus: PathBuf::from("data/train.src"),
            target_corpus: PathBuf::from("data/train.tgt"),
            source_embeddings: PathBuf::from("data/vectors.src.bin"),
            target_embeddings: PathBuf::from("data/vectors.tgt.bin"),
            phrase_table: PathBuf::from("data/phrase-table.gz"),
            output_dir: PathBuf::from("data/model"),
        }
    }
}

impl PipelineConfig {
    /// Create config for small-scale testing
    pub fn test() -> Self {
        Self {
            learning_rate: 0.1,
            batch_size: 2,
            hidden_size: 8,
            seed: 42,
            embedding_dim: 4,
            epochs: 5,
            prune_threshold: 16,
            ..Self::default()
        }
    }

    /// Set the learning rate
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the mini-batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the shuffle seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the embedding dimensionality
    pub fn with_embedding_dim(mut self, embedding_dim: usize) -> Self {
        self.embedding_dim = embedding_dim;
        self
    }

    /// Set the epoch budget
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the vocabulary prune threshold
    pub fn with_prune_threshold(mut self, prune_threshold: usize) -> Self {
        self.prune_threshold = prune_threshold;
        self
    }

    /// Set the checkpoint output directory
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Validate the configuration before any data is touched.
    pub fn validate(&self) -> RnnedResult<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(RnnedError::config(format!(
                "learning_rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        if self.batch_size == 0 {
            return Err(RnnedError::config("batch_size must be nonzero"));
        }
        if self.embedding_dim == 0 {
            return Err(RnnedError::config("embedding_dim must be nonzero"));
        }
        if self.epochs == 0 {
            return Err(RnnedError::config("epochs must be nonzero"));
        }
        if self.prune_threshold == 0 {
            return Err(RnnedError::config("prune_threshold must be nonzero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hyperparameters() {
        let config = PipelineConfig::default();
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.hidden_size, 500);
        assert_eq!(config.seed, 324);
        assert_eq!(config.embedding_dim, 50);
        assert_eq!(config.epochs, 25);
        assert_eq!(config.prune_threshold, 5000);
        assert!((config.learning_rate - 0.0827).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let config = PipelineConfig::default()
            .with_batch_size(16)
            .with_seed(7)
            .with_embedding_dim(100)
            .with_output_dir("/tmp/out");

        assert_eq!(config.batch_size, 16);
        assert_eq!(config.seed, 7);
        assert_eq!(config.embedding_dim, 100);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(PipelineConfig::default()
            .with_batch_size(0)
            .validate()
            .is_err());
        assert!(PipelineConfig::default()
            .with_embedding_dim(0)
            .validate()
            .is_err());
        assert!(PipelineConfig::default().with_epochs(0).validate().is_err());
        assert!(PipelineConfig::default()
            .with_prune_threshold(0)
            .validate()
            .is_err());
        assert!(PipelineConfig::default()
            .with_learning_rate(0.0)
            .validate()
            .is_err());
        assert!(PipelineConfig::default()
            .with_learning_rate(f64::NAN)
            .validate()
            .is_err());
    }
}
