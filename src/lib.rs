//! Data preparation and training orchestration for a phrase-translation scorer
//!
//! This crate implements the data and control side of training a recurrent
//! phrase-translation model, providing:
//! - Frequency-pruned vocabulary construction from tokenized corpora
//! - Alignment of word2vec binary embeddings to vocabulary index spaces
//! - Phrase-pair extraction from gzip-compressed Moses-style phrase tables
//! - Seeded shuffling and deterministic 80/20 train/dev partitioning
//! - An epoch loop with adaptive learning-rate decay and early stopping
//! - Best/second-best checkpoint rotation with gzip-JSON bundles
//!
//! The sequence model itself is external; the crate drives it through the
//! [`model::SequenceModel`] trait.
//!
//! # Example
//!
//! ```no_run
//! use rnned_train_rs::{pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default();
//! let data = pipeline::prepare(&config).unwrap();
//! let dims = data.model_dims(config.hidden_size);
//! // Construct the external model from `dims`, then hand `data` to a Trainer.
//! ```

pub mod checkpoint;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod model;
pub mod partition;
pub mod phrases;
pub mod pipeline;
pub mod trainer;
pub mod vocab;

pub use checkpoint::{Checkpointer, ModelArtifacts, ModelBundle};
pub use config::PipelineConfig;
pub use embeddings::{EmbeddingAligner, EmbeddingMatrix};
pub use error::{RnnedError, RnnedResult};
pub use model::{ModelDims, SequenceModel};
pub use phrases::{PhrasePair, PhrasePairExtractor};
pub use pipeline::PreparedData;
pub use trainer::{Trainer, TrainingSummary};
pub use vocab::{Vocabulary, VocabularyBuilder};
