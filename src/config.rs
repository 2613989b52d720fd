use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::activation::Activations;
use crate::data::DatasetKind;
use crate::loss::Losses;
use crate::optimizers::Optimizers;
use crate::{Error, Result};

/// Most hidden layers the form accepts.
pub const MAX_LAYERS: usize = 10;

/// The configuration form as the user fills it in. Every field may be missing.
///
/// Field names follow the page's form, so a saved form reads like:
///
/// ```json
/// { "dataset": "moons", "lossFunction": "binaryCrossentropy", "epochs": 20,
///   "lr": 0.01, "activationFunction": "relu", "outputActivation": "sigmoid",
///   "optimizer": "adam", "layers": 2, "npl": [8, 8] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub dataset: Option<DatasetKind>,
    pub loss_function: Option<Losses>,
    pub epochs: Option<usize>,
    pub lr: Option<f64>,
    pub activation_function: Option<Activations>,
    pub output_activation: Option<Activations>,
    pub optimizer: Option<Optimizers>,
    pub layers: Option<usize>,
    /// Nodes per layer.
    pub npl: Option<Vec<usize>>,
}

impl Form {
    pub fn from_json(json: &str) -> Result<Form> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Form> {
        Form::from_json(&fs::read_to_string(path)?)
    }

    // merge forms where the second overwrites the first
    pub fn merge(self, other: Form) -> Form {
        Form {
            dataset: other.dataset.or(self.dataset),
            loss_function: other.loss_function.or(self.loss_function),
            epochs: other.epochs.or(self.epochs),
            lr: other.lr.or(self.lr),
            activation_function: other.activation_function.or(self.activation_function),
            output_activation: other.output_activation.or(self.output_activation),
            optimizer: other.optimizer.or(self.optimizer),
            layers: other.layers.or(self.layers),
            npl: other.npl.or(self.npl),
        }
    }

    /// Validates the form. This is the only way to obtain a [`TrainConfig`].
    pub fn submit(&self) -> Result<TrainConfig> {
        let invalid = |msg: &str| Error::InvalidConfig(msg.to_string());

        let dataset = self.dataset.ok_or_else(|| invalid("select a dataset"))?;
        let loss = self.loss_function.ok_or_else(|| invalid("select a loss function"))?;
        let epochs = self
            .epochs
            .filter(|e| *e >= 1)
            .ok_or_else(|| invalid("epochs must be at least 1"))?;
        let learning_rate = self
            .lr
            .filter(|lr| lr.is_finite() && *lr > 0.)
            .ok_or_else(|| invalid("learning rate must be greater than 0"))?;
        let hidden_activation = self
            .activation_function
            .ok_or_else(|| invalid("select a hidden layer activation"))?;
        let output_activation = self
            .output_activation
            .ok_or_else(|| invalid("select an output activation"))?;
        let optimizer = self.optimizer.ok_or_else(|| invalid("select an optimizer"))?;
        let layers = self
            .layers
            .filter(|l| (1..=MAX_LAYERS).contains(l))
            .ok_or_else(|| invalid("number of layers must be between 1 and 10"))?;

        let widths = self.npl.clone().unwrap_or_default();
        if let Some(i) = widths.iter().position(|w| *w == 0) {
            return Err(Error::InvalidConfig(format!(
                "layer {} needs at least one node",
                i + 1
            )));
        }

        Ok(TrainConfig {
            dataset,
            loss,
            optimizer,
            learning_rate,
            epochs,
            layers,
            widths,
            hidden_activation,
            output_activation,
        })
    }
}

/// A validated, immutable training configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainConfig {
    dataset: DatasetKind,
    loss: Losses,
    optimizer: Optimizers,
    learning_rate: f64,
    epochs: usize,
    layers: usize,
    widths: Vec<usize>,
    hidden_activation: Activations,
    output_activation: Activations,
}

impl TrainConfig {
    pub fn dataset(&self) -> DatasetKind {
        self.dataset
    }

    /// The loss the user chose. The driver may override it for regression.
    pub fn loss(&self) -> Losses {
        self.loss
    }

    pub fn optimizer(&self) -> Optimizers {
        self.optimizer
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    /// Hidden layer count.
    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Declared widths. May be shorter than [`TrainConfig::layers`].
    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    pub fn hidden_activation(&self) -> Activations {
        self.hidden_activation
    }

    pub fn output_activation(&self) -> Activations {
        self.output_activation
    }
}
