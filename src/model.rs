//! The external sequence-model seam.
//!
//! The model that actually scores phrase translations lives outside this
//! crate. The pipeline only ever drives it through [`SequenceModel`]: one
//! parameter-update call per mini-batch and one loss evaluation per epoch,
//! plus an opaque state snapshot for checkpointing.

use serde::{Deserialize, Serialize};

use crate::error::RnnedResult;
use crate::phrases::PhrasePair;

/// Dimensions a sequence-model implementation is constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDims {
    /// Hidden layer size
    pub hidden_size: usize,
    /// Target vocabulary size (output dimension)
    pub target_vocab_size: usize,
    /// Word embedding dimensionality
    pub embedding_dim: usize,
}

/// Contract between the training loop and the external model.
///
/// Errors from any method are fatal to the run; the loop performs no retry
/// and no partial-epoch recovery.
pub trait SequenceModel {
    /// Update parameters from one mini-batch at the given learning rate.
    fn train(&mut self, batch: &[PhrasePair], learning_rate: f64) -> RnnedResult<()>;

    /// Average negative log-likelihood over `examples`.
    ///
    /// Must not update model parameters.
    fn evaluate(&mut self, examples: &[PhrasePair]) -> RnnedResult<f64>;

    /// Opaque serialized parameter snapshot for checkpointing.
    fn state_bytes(&self) -> RnnedResult<Vec<u8>>;
}
