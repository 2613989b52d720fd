use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::activation::Activations;
use crate::loss::Losses;
use crate::optimizers::{Hyper, Optimizers};
use crate::Result;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerSpec {
    pub units: usize,
    pub activation: Activations,
    /// Only the first layer of a stack declares its input width.
    pub input_dim: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Accuracy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Compile {
    pub optimizer: Optimizers,
    pub learning_rate: f64,
    pub loss: Losses,
    pub metrics: Vec<Metric>,
}

/// What one epoch of fitting reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochLogs {
    pub loss: f64,
    /// Only present when the model was compiled with [`Metric::Accuracy`].
    pub accuracy: Option<f64>,
}

pub trait Predictor {
    /// Batched inference, one output row per input row.
    fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>>;
}

pub trait Model: Predictor {
    /// Runs exactly one pass over `(x, y)` in batches of `hyper.batch_size`.
    fn fit_epoch(&mut self, x: &Array2<f64>, y: &Array2<f64>, hyper: &Hyper) -> Result<EpochLogs>;

    /// The layer stack the model was built from.
    fn layers(&self) -> &[LayerSpec];

    /// Releases the weights and every buffer the model holds. Idempotent.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}

pub trait Backend {
    type Model: Model;

    fn sequential(&mut self, layers: &[LayerSpec], compile: &Compile) -> Result<Self::Model>;
}
