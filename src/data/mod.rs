//! Toy datasets and the feature scaling applied to them.

mod generate;
mod normalize;

pub use generate::{generate, generate_with, NOISE};
pub use normalize::{Stats, STD_FLOOR};

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::f;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum DatasetKind {
    Moons,
    Circles,
    Linear,
    Iris,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::Moons,
        DatasetKind::Circles,
        DatasetKind::Linear,
        DatasetKind::Iris,
    ];

    /// Sample count the page uses for this dataset.
    pub fn default_size(&self) -> usize {
        match self {
            DatasetKind::Moons | DatasetKind::Circles => 500,
            DatasetKind::Linear => 200,
            DatasetKind::Iris => 150,
        }
    }

    pub fn is_regression(&self) -> bool {
        matches!(self, DatasetKind::Linear)
    }

    pub fn feature_dim(&self) -> usize {
        match self {
            DatasetKind::Linear => 1,
            _ => 2,
        }
    }

    /// 1 marks regression rather than a real class count.
    pub fn class_count(&self) -> usize {
        match self {
            DatasetKind::Linear => 1,
            DatasetKind::Moons | DatasetKind::Circles => 2,
            DatasetKind::Iris => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Labels {
    Classes(Vec<usize>),
    Values(Vec<f64>),
}

impl Labels {
    pub fn len(&self) -> usize {
        match self {
            Labels::Classes(c) => c.len(),
            Labels::Values(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An ordered sample set: one feature row and one label per sample.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub kind: DatasetKind,
    pub features: Array2<f64>,
    pub labels: Labels,
    pub class_count: usize,
    pub feature_dim: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Training targets shaped for the output layer the driver builds:
    /// one value column for regression and binary sets, one-hot otherwise.
    pub fn targets(&self) -> Array2<f64> {
        match &self.labels {
            Labels::Values(v) => Array2::from_shape_fn((v.len(), 1), |(i, _)| v[i]),
            Labels::Classes(c) if self.class_count <= 2 => {
                Array2::from_shape_fn((c.len(), 1), |(i, _)| c[i] as f64)
            }
            Labels::Classes(c) => f::onehot(c, self.class_count),
        }
    }

    /// The feature column `j` as a plain vector.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.features.index_axis(Axis(1), j).to_vec()
    }
}
