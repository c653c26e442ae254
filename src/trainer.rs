//! Training orchestration.
//!
//! Drives epoch iteration over the prepared phrase pairs: per-epoch
//! reshuffle with the fixed run seed, contiguous mini-batches into the
//! external model, dev-set evaluation, strict-improvement checkpointing,
//! learning-rate decay after three stale epochs, and early stopping on
//! learning-rate underflow.

use crate::checkpoint::{Checkpointer, ModelArtifacts};
use crate::config::PipelineConfig;
use crate::error::RnnedResult;
use crate::model::SequenceModel;
use crate::partition::shuffle;
use crate::phrases::PhrasePair;

/// Epochs without improvement before the learning rate is halved.
pub const DECAY_PATIENCE: usize = 3;
/// Multiplier applied to the learning rate on decay.
pub const DECAY_FACTOR: f64 = 0.5;
/// Training stops once the learning rate drops below this.
pub const MIN_LEARNING_RATE: f64 = 1e-5;

/// Mutable per-run session state. Owned by the loop body; nothing outside
/// the trainer reads or writes it.
#[derive(Debug, Clone)]
pub struct TrainingSession {
    /// Current (decayed) learning rate
    pub learning_rate: f64,
    /// Epoch currently running
    pub epoch: usize,
    /// Epoch that produced the best validation loss
    pub best_epoch: usize,
    /// Best validation NLL seen so far
    pub best_nll: f64,
}

impl TrainingSession {
    fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            epoch: 0,
            best_epoch: 0,
            best_nll: f64::INFINITY,
        }
    }
}

/// Outcome of a completed training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    /// Best validation NLL observed
    pub best_nll: f64,
    /// Epoch that produced it
    pub best_epoch: usize,
    /// Number of epochs actually run
    pub epochs_completed: usize,
    /// True if the run stopped on learning-rate underflow rather than
    /// exhausting the epoch budget
    pub stopped_by_lr_underflow: bool,
}

/// Drives the supervised training loop against an external model.
pub struct Trainer {
    config: PipelineConfig,
    train_set: Vec<PhrasePair>,
    dev_set: Vec<PhrasePair>,
    checkpointer: Checkpointer,
}

impl Trainer {
    /// Create a trainer owning the partitioned example sets.
    pub fn new(
        config: PipelineConfig,
        train_set: Vec<PhrasePair>,
        dev_set: Vec<PhrasePair>,
        checkpointer: Checkpointer,
    ) -> Self {
        Self {
            config,
            train_set,
            dev_set,
            checkpointer,
        }
    }

    /// Run the training loop to completion.
    ///
    /// The checkpoint on disk after this returns always corresponds to the
    /// best validation loss observed, never a later worse epoch. Model
    /// failures abort the run with no retry; an invalid configuration is
    /// rejected before the model is touched.
    pub fn run<M: SequenceModel>(
        &mut self,
        model: &mut M,
        artifacts: &ModelArtifacts<'_>,
    ) -> RnnedResult<TrainingSummary> {
        self.config.validate()?;

        let mut session = TrainingSession::new(self.config.learning_rate);
        let mut epochs_completed = 0;
        let mut stopped_by_lr_underflow = false;

        for epoch in 0..self.config.epochs {
            session.epoch = epoch;

            // Every epoch reuses the fixed run seed, so the full run is a
            // deterministic function of (seed, initial order).
            shuffle(&mut self.train_set, self.config.seed);

            for batch in self.train_set.chunks(self.config.batch_size) {
                model.train(batch, session.learning_rate)?;
            }

            let dev_nll = model.evaluate(&self.dev_set)?;
            let improved = dev_nll < session.best_nll;
            if improved {
                session.best_nll = dev_nll;
                session.best_epoch = epoch;
                self.checkpointer.save(artifacts, model, epoch, dev_nll)?;
            }

            tracing::info!(
                epoch,
                dev_nll,
                improved,
                learning_rate = session.learning_rate,
                "epoch complete"
            );

            // Evaluated every epoch, improvement or not.
            if epoch - session.best_epoch >= DECAY_PATIENCE {
                session.learning_rate *= DECAY_FACTOR;
            }

            epochs_completed = epoch + 1;
            if session.learning_rate < MIN_LEARNING_RATE {
                stopped_by_lr_underflow = true;
                break;
            }
        }

        let summary = TrainingSummary {
            best_nll: session.best_nll,
            best_epoch: session.best_epoch,
            epochs_completed,
            stopped_by_lr_underflow,
        };
        tracing::info!(
            best_nll = summary.best_nll,
            best_epoch = summary.best_epoch,
            epochs_completed = summary.epochs_completed,
            "training finished"
        );
        Ok(summary)
    }
}
