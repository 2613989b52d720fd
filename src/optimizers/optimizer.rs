use std::collections::HashMap;

use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, Zip};
use serde::{Deserialize, Serialize};

/// Numerical fuzz added under square roots.
pub const EPSILON: f64 = 1e-7;

/// How one epoch walks the samples. The learning rate lives with the optimizer.
#[derive(Clone, Debug)]
pub struct Hyper {
    pub batch_size: usize,
    pub shuffle: bool,
}

impl Hyper {
    pub fn new() -> Hyper {
        Hyper {
            batch_size: 32,
            shuffle: true,
        }
    }
}

impl Default for Hyper {
    fn default() -> Self {
        Hyper::new()
    }
}

/// Applies gradients to parameters.
///
/// Every parameter tensor owns a `slot` so stateful optimizers can keep
/// their running averages apart. `tick` is called once per batch before
/// the updates of that batch.
pub trait Optimizer {
    fn tick(&mut self) {}
    fn update(&mut self, slot: usize, param: ArrayViewMutD<f64>, grad: ArrayViewD<f64>);
}

struct Moments {
    first: ArrayD<f64>,
    second: ArrayD<f64>,
}

impl Moments {
    fn zeros(grad: &ArrayViewD<f64>) -> Moments {
        Moments {
            first: ArrayD::zeros(grad.raw_dim()),
            second: ArrayD::zeros(grad.raw_dim()),
        }
    }
}

pub struct Sgd {
    learning_rate: f64,
}

impl Optimizer for Sgd {
    fn update(&mut self, _slot: usize, mut param: ArrayViewMutD<f64>, grad: ArrayViewD<f64>) {
        let lr = self.learning_rate;
        param.zip_mut_with(&grad, |p, g| *p -= lr * g);
    }
}

pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    t: i32,
    moments: HashMap<usize, Moments>,
}

impl Optimizer for Adam {
    fn tick(&mut self) {
        self.t += 1;
    }

    fn update(&mut self, slot: usize, param: ArrayViewMutD<f64>, grad: ArrayViewD<f64>) {
        let (b1, b2, lr) = (self.beta1, self.beta2, self.learning_rate);
        let t = self.t.max(1);
        let c1 = 1. - b1.powi(t);
        let c2 = 1. - b2.powi(t);
        let m = self
            .moments
            .entry(slot)
            .or_insert_with(|| Moments::zeros(&grad));

        Zip::from(param)
            .and(&grad)
            .and(&mut m.first)
            .and(&mut m.second)
            .for_each(|p, g, m1, m2| {
                *m1 = b1 * *m1 + (1. - b1) * g;
                *m2 = b2 * *m2 + (1. - b2) * g * g;
                *p -= lr * (*m1 / c1) / ((*m2 / c2).sqrt() + EPSILON);
            });
    }
}

pub struct RmsProp {
    learning_rate: f64,
    rho: f64,
    mean_square: HashMap<usize, ArrayD<f64>>,
}

impl Optimizer for RmsProp {
    fn update(&mut self, slot: usize, param: ArrayViewMutD<f64>, grad: ArrayViewD<f64>) {
        let (rho, lr) = (self.rho, self.learning_rate);
        let ms = self
            .mean_square
            .entry(slot)
            .or_insert_with(|| ArrayD::zeros(grad.raw_dim()));

        Zip::from(param).and(&grad).and(ms).for_each(|p, g, s| {
            *s = rho * *s + (1. - rho) * g * g;
            *p -= lr * g / (*s + EPSILON).sqrt();
        });
    }
}

pub struct AdaGrad {
    learning_rate: f64,
    initial: f64,
    accumulated: HashMap<usize, ArrayD<f64>>,
}

impl Optimizer for AdaGrad {
    fn update(&mut self, slot: usize, param: ArrayViewMutD<f64>, grad: ArrayViewD<f64>) {
        let (lr, initial) = (self.learning_rate, self.initial);
        let acc = self
            .accumulated
            .entry(slot)
            .or_insert_with(|| ArrayD::from_elem(grad.raw_dim(), initial));

        Zip::from(param).and(&grad).and(acc).for_each(|p, g, a| {
            *a += g * g;
            *p -= lr * g / (*a + EPSILON).sqrt();
        });
    }
}

pub struct AdaDelta {
    learning_rate: f64,
    rho: f64,
    moments: HashMap<usize, Moments>,
}

impl Optimizer for AdaDelta {
    fn update(&mut self, slot: usize, param: ArrayViewMutD<f64>, grad: ArrayViewD<f64>) {
        let (rho, lr) = (self.rho, self.learning_rate);
        let m = self
            .moments
            .entry(slot)
            .or_insert_with(|| Moments::zeros(&grad));

        // first: running E[g^2], second: running E[dx^2]
        Zip::from(param)
            .and(&grad)
            .and(&mut m.first)
            .and(&mut m.second)
            .for_each(|p, g, eg, ex| {
                *eg = rho * *eg + (1. - rho) * g * g;
                let dx = (*ex + EPSILON).sqrt() / (*eg + EPSILON).sqrt() * g;
                *ex = rho * *ex + (1. - rho) * dx * dx;
                *p -= lr * dx;
            });
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Optimizers {
    Sgd,
    Adam,
    #[serde(rename = "rmsprop")]
    RmsProp,
    #[serde(rename = "adagrad")]
    AdaGrad,
    #[serde(rename = "adadelta")]
    AdaDelta,
}

impl Optimizers {
    pub fn wake(&self, learning_rate: f64) -> Box<dyn Optimizer> {
        match self {
            Optimizers::Sgd => Box::new(Sgd { learning_rate }),
            Optimizers::Adam => Box::new(Adam {
                learning_rate,
                beta1: 0.9,
                beta2: 0.999,
                t: 0,
                moments: HashMap::new(),
            }),
            Optimizers::RmsProp => Box::new(RmsProp {
                learning_rate,
                rho: 0.9,
                mean_square: HashMap::new(),
            }),
            Optimizers::AdaGrad => Box::new(AdaGrad {
                learning_rate,
                initial: 0.1,
                accumulated: HashMap::new(),
            }),
            Optimizers::AdaDelta => Box::new(AdaDelta {
                learning_rate,
                rho: 0.95,
                moments: HashMap::new(),
            }),
        }
    }
}
