//! Model checkpoint persistence.
//!
//! Every validation improvement persists a five-element bundle (both
//! vocabularies, both embedding matrices, the model's opaque state) as
//! gzip-compressed JSON. The previous best is rotated to a second-best slot
//! before the new bundle is published.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::embeddings::EmbeddingMatrix;
use crate::error::RnnedResult;
use crate::model::SequenceModel;
use crate::vocab::Vocabulary;

/// File name of the best checkpoint.
pub const BEST_BUNDLE: &str = "best.mdl";
/// File name the previous best is rotated to.
pub const SECOND_BEST_BUNDLE: &str = "secondBest.mdl";

const BEST_META: &str = "best.meta.json";
const SECOND_BEST_META: &str = "secondBest.meta.json";

/// The data-side artifacts persisted with every checkpoint.
#[derive(Debug, Clone, Copy)]
pub struct ModelArtifacts<'a> {
    /// Source-language vocabulary
    pub source_vocab: &'a Vocabulary,
    /// Target-language vocabulary
    pub target_vocab: &'a Vocabulary,
    /// Source embeddings aligned to `source_vocab`
    pub source_embeddings: &'a EmbeddingMatrix,
    /// Target embeddings aligned to `target_vocab`
    pub target_embeddings: &'a EmbeddingMatrix,
}

/// The serialized checkpoint bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    /// Source-language vocabulary
    pub source_vocab: Vocabulary,
    /// Target-language vocabulary
    pub target_vocab: Vocabulary,
    /// Source embeddings
    pub source_embeddings: EmbeddingMatrix,
    /// Target embeddings
    pub target_embeddings: EmbeddingMatrix,
    /// Opaque model parameter snapshot
    pub model_state: Vec<u8>,
}

impl ModelBundle {
    /// Load a previously saved bundle.
    pub fn load(path: &Path) -> RnnedResult<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(GzDecoder::new(file));
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Checkpoint sidecar metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Epoch the checkpoint was taken at
    pub epoch: usize,
    /// Validation NLL that triggered the save
    pub dev_nll: f64,
    /// Timestamp
    pub timestamp: String,
}

/// Persists model bundles with best/second-best rotation.
#[derive(Debug, Clone)]
pub struct Checkpointer {
    output_dir: PathBuf,
}

impl Checkpointer {
    /// Create a checkpointer writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory the checkpoints are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the current best bundle.
    pub fn best_path(&self) -> PathBuf {
        self.output_dir.join(BEST_BUNDLE)
    }

    /// Path of the rotated second-best bundle.
    pub fn second_best_path(&self) -> PathBuf {
        self.output_dir.join(SECOND_BEST_BUNDLE)
    }

    /// Persist the artifacts and model state to the best slot.
    ///
    /// Rotates any existing best bundle to the second-best slot first; a
    /// missing prior best is not an error, and the rotation is not
    /// transactional with the write.
    pub fn save<M: SequenceModel>(
        &self,
        artifacts: &ModelArtifacts<'_>,
        model: &M,
        epoch: usize,
        dev_nll: f64,
    ) -> RnnedResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let best = self.best_path();
        if best.exists() {
            // Best-effort rotation of bundle and metadata.
            let _ = fs::rename(&best, self.second_best_path());
            let _ = fs::rename(
                self.output_dir.join(BEST_META),
                self.output_dir.join(SECOND_BEST_META),
            );
        }

        let bundle = ModelBundle {
            source_vocab: artifacts.source_vocab.clone(),
            target_vocab: artifacts.target_vocab.clone(),
            source_embeddings: artifacts.source_embeddings.clone(),
            target_embeddings: artifacts.target_embeddings.clone(),
            model_state: model.state_bytes()?,
        };

        // Write to a temp file, then rename into place so the best slot
        // never holds a partial bundle.
        let tmp = self.output_dir.join(format!("{}.tmp", BEST_BUNDLE));
        let file = File::create(&tmp)?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        serde_json::to_writer(&mut encoder, &bundle)?;
        encoder.finish()?;
        fs::rename(&tmp, &best)?;

        let metadata = CheckpointMetadata {
            epoch,
            dev_nll,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        fs::write(
            self.output_dir.join(BEST_META),
            serde_json::to_string_pretty(&metadata)?,
        )?;

        tracing::info!(epoch, dev_nll, path = %best.display(), "checkpoint saved");
        Ok(best)
    }
}
