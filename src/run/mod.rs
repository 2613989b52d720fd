//! Training runs: the per-epoch driver and the session that owns it.

mod driver;
mod session;

pub use driver::{compile_for, layer_stack, Run, BATCH_SIZE, DEFAULT_WIDTH};
pub use session::Session;

use serde::Serialize;
use uuid::Uuid;

use crate::data::{Dataset, Stats};
use crate::nn::{EpochLogs, Predictor};
use crate::Result;

/// What an epoch callback may look at: the run's data and its current model.
pub struct Scene<'a> {
    pub dataset: &'a Dataset,
    pub stats: &'a Stats,
    pub model: &'a dyn Predictor,
}

pub trait Callbacks {
    /// A new run replaced whatever was there before.
    fn on_run_start(&mut self, _id: Uuid) {}

    /// Called once per finished epoch, before the driver yields.
    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs, scene: &Scene) -> Result<()>;

    fn on_train_end(&mut self, _history: &History) {}

    /// The session moved to `status`. Fires before the first epoch with
    /// [`Status::Training`] and once more when the run settles or aborts.
    fn on_status(&mut self, _status: &Status) {}
}

/// Per-epoch results of a run, append-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct History {
    pub loss: Vec<f64>,
    /// `None` for regression runs.
    pub accuracy: Option<Vec<f64>>,
}

impl History {
    pub fn new(track_accuracy: bool) -> History {
        History {
            loss: Vec::new(),
            accuracy: track_accuracy.then(Vec::new),
        }
    }

    pub fn push(&mut self, logs: &EpochLogs) {
        self.loss.push(logs.loss);
        if let (Some(acc), Some(a)) = (self.accuracy.as_mut(), logs.accuracy) {
            acc.push(a);
        }
    }

    pub fn len(&self) -> usize {
        self.loss.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loss.is_empty()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.loss.last().copied()
    }

    pub fn final_accuracy(&self) -> Option<f64> {
        self.accuracy.as_ref().and_then(|a| a.last().copied())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Training,
    Settled {
        final_loss: Option<f64>,
        final_accuracy: Option<f64>,
    },
    Aborted {
        reason: String,
    },
}

impl Status {
    pub fn is_training(&self) -> bool {
        matches!(self, Status::Training)
    }
}
