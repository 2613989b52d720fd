use std::fmt::Debug;
use std::rc::Rc;

use ndarray::{Array1, Array2, Axis, Zip};
use serde::{Deserialize, Serialize};

/// Probabilities are clipped into `[EPSILON, 1 - EPSILON]` before taking logs.
pub const EPSILON: f64 = 1e-7;

const HUBER_DELTA: f64 = 1.0;

/// Batched loss over `(batch, outputs)` matrices.
///
/// `a` gives one loss value per row. `d` gives the gradient of each row's
/// loss with respect to that row's predictions; averaging over the batch
/// happens in the layers.
pub trait Loss {
    fn a(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array1<f64>;
    fn d(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array2<f64>;
}

impl Debug for dyn Loss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LossFn")
    }
}

fn elementwise(
    pred: &Array2<f64>,
    target: &Array2<f64>,
    op: impl Fn(f64, f64) -> f64,
) -> Array2<f64> {
    let mut out = Array2::zeros(pred.raw_dim());
    Zip::from(&mut out)
        .and(pred)
        .and(target)
        .for_each(|o, p, t| *o = op(*p, *t));
    out
}

fn row_mean(x: Array2<f64>) -> Array1<f64> {
    let features = x.ncols().max(1) as f64;
    x.sum_axis(Axis(1)) / features
}

pub struct MSE;

impl Loss for MSE {
    fn a(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array1<f64> {
        row_mean(elementwise(pred, target, |p, t| (p - t).powi(2)))
    }

    fn d(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array2<f64> {
        let features = pred.ncols() as f64;
        elementwise(pred, target, |p, t| 2. * (p - t) / features)
    }
}

pub struct MAE;

impl Loss for MAE {
    fn a(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array1<f64> {
        row_mean(elementwise(pred, target, |p, t| (p - t).abs()))
    }

    fn d(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array2<f64> {
        let features = pred.ncols() as f64;
        elementwise(pred, target, |p, t| {
            let e = p - t;
            if e == 0. {
                0.
            } else {
                e.signum() / features
            }
        })
    }
}

pub struct Huber;

impl Loss for Huber {
    fn a(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array1<f64> {
        row_mean(elementwise(pred, target, |p, t| {
            let e = (p - t).abs();
            if e <= HUBER_DELTA {
                0.5 * e * e
            } else {
                HUBER_DELTA * (e - 0.5 * HUBER_DELTA)
            }
        }))
    }

    fn d(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array2<f64> {
        let features = pred.ncols() as f64;
        elementwise(pred, target, |p, t| {
            (p - t).clamp(-HUBER_DELTA, HUBER_DELTA) / features
        })
    }
}

pub struct BinaryCrossEntropy;

impl Loss for BinaryCrossEntropy {
    fn a(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array1<f64> {
        row_mean(elementwise(pred, target, |p, t| {
            let p = p.clamp(EPSILON, 1. - EPSILON);
            -(t * p.ln() + (1. - t) * (1. - p).ln())
        }))
    }

    fn d(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array2<f64> {
        let features = pred.ncols() as f64;
        elementwise(pred, target, |p, t| {
            let p = p.clamp(EPSILON, 1. - EPSILON);
            (-t / p + (1. - t) / (1. - p)) / features
        })
    }
}

/// Expects probability rows (softmax output) and one-hot targets.
pub struct CategoricalCrossEntropy;

impl Loss for CategoricalCrossEntropy {
    fn a(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array1<f64> {
        elementwise(pred, target, |p, t| -t * p.clamp(EPSILON, 1. - EPSILON).ln())
            .sum_axis(Axis(1))
    }

    fn d(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array2<f64> {
        elementwise(pred, target, |p, t| -t / p.clamp(EPSILON, 1. - EPSILON))
    }
}

/// Targets in `{0, 1}` are mapped to `{-1, 1}` first.
pub struct Hinge;

impl Loss for Hinge {
    fn a(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array1<f64> {
        row_mean(elementwise(pred, target, |p, t| {
            let t = 2. * t - 1.;
            (1. - t * p).max(0.)
        }))
    }

    fn d(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array2<f64> {
        let features = pred.ncols() as f64;
        elementwise(pred, target, |p, t| {
            let t = 2. * t - 1.;
            if 1. - t * p > 0. {
                -t / features
            } else {
                0.
            }
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Losses {
    MeanSquaredError,
    MeanAbsoluteError,
    HuberLoss,
    BinaryCrossentropy,
    CategoricalCrossentropy,
    Hinge,
}

impl Losses {
    pub fn wake(&self) -> Rc<dyn Loss> {
        match self {
            Losses::MeanSquaredError => Rc::new(MSE),
            Losses::MeanAbsoluteError => Rc::new(MAE),
            Losses::HuberLoss => Rc::new(Huber),
            Losses::BinaryCrossentropy => Rc::new(BinaryCrossEntropy),
            Losses::CategoricalCrossentropy => Rc::new(CategoricalCrossEntropy),
            Losses::Hinge => Rc::new(Hinge),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn check_gradient(loss: &dyn Loss, pred: Array2<f64>, target: Array2<f64>) {
        let analytic = loss.d(&pred, &target);
        let h = 1e-6;
        for ((r, c), g) in analytic.indexed_iter() {
            let mut up = pred.clone();
            up[[r, c]] += h;
            let mut down = pred.clone();
            down[[r, c]] -= h;
            let numeric = (loss.a(&up, &target)[r] - loss.a(&down, &target)[r]) / (2. * h);
            assert!((g - numeric).abs() < 1e-4, "{} vs {}", g, numeric);
        }
    }

    #[test]
    fn mse_per_row() {
        let l = MSE.a(&array![[1., 3.], [0., 0.]], &array![[0., 1.], [0., 0.]]);
        assert_eq!(l, array![2.5, 0.]);
    }

    #[test]
    fn gradients_match_finite_differences() {
        let pred = array![[0.3, 0.6], [0.8, 0.1]];
        let target = array![[0., 1.], [1., 0.]];
        check_gradient(&MSE, pred.clone(), target.clone());
        check_gradient(&BinaryCrossEntropy, pred.clone(), target.clone());
        check_gradient(&CategoricalCrossEntropy, pred.clone(), target.clone());

        let wide = array![[2.5, -0.4], [0.3, -3.]];
        check_gradient(&Huber, wide.clone(), target.clone());
        check_gradient(&MAE, wide.clone(), target.clone());
        check_gradient(&Hinge, wide, target);
    }

    #[test]
    fn bce_is_finite_at_the_edges() {
        let l = BinaryCrossEntropy.a(&array![[0.], [1.]], &array![[1.], [0.]]);
        assert!(l.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn hinge_maps_zero_labels_to_minus_one() {
        let l = Hinge.a(&array![[-2.], [0.5]], &array![[0.], [1.]]);
        assert_eq!(l, array![0., 0.5]);
    }
}
