use std::fmt::{self, Debug};
use std::rc::Rc;

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::f;

pub trait Activation {
    /// Applies the activation to pre-activations `z`.
    fn a(&self, z: &Array2<f64>) -> Array2<f64>;

    /// Elementwise derivative at `z`.
    fn d(&self, z: &Array2<f64>) -> Array2<f64>;

    /// Pulls `grad` (dL/da) back through the activation, giving dL/dz.
    ///
    /// `a` is the forward output for the same `z`. Elementwise activations
    /// just multiply by [`Activation::d`].
    fn chain(&self, z: &Array2<f64>, _a: &Array2<f64>, grad: Array2<f64>) -> Array2<f64> {
        grad * self.d(z)
    }
}

impl Debug for dyn Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActivationFn")
    }
}

pub struct Relu;

impl Activation for Relu {
    fn a(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(f::relu)
    }

    fn d(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|v| if v > 0. { 1. } else { 0. })
    }
}

pub struct LeakyRelu;

impl Activation for LeakyRelu {
    fn a(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(f::leaky_relu)
    }

    fn d(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|v| if v > 0. { 1. } else { f::LEAKY_ALPHA })
    }
}

pub struct Sigmoid;

impl Activation for Sigmoid {
    fn a(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(f::sigmoid)
    }

    fn d(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|v| {
            let s = f::sigmoid(v);
            s * (1. - s)
        })
    }
}

pub struct Tanh;

impl Activation for Tanh {
    fn a(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(f64::tanh)
    }

    fn d(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|v| 1. - v.tanh().powi(2))
    }
}

pub struct Identity;

impl Activation for Identity {
    fn a(&self, z: &Array2<f64>) -> Array2<f64> {
        z.clone()
    }

    fn d(&self, z: &Array2<f64>) -> Array2<f64> {
        Array2::ones(z.raw_dim())
    }
}

/// Row-wise softmax.
pub struct Softmax;

impl Activation for Softmax {
    fn a(&self, z: &Array2<f64>) -> Array2<f64> {
        let max_vals = z.map_axis(Axis(1), |row| row.fold(f64::NEG_INFINITY, |m, v| m.max(*v)));
        let exps = (z - &max_vals.insert_axis(Axis(1))).mapv(f64::exp);
        let sum_exps = exps.sum_axis(Axis(1)).insert_axis(Axis(1));
        exps / &sum_exps
    }

    /// Diagonal of the jacobian only; [`Activation::chain`] uses the full one.
    fn d(&self, z: &Array2<f64>) -> Array2<f64> {
        self.a(z).mapv(|s| s * (1. - s))
    }

    fn chain(&self, _z: &Array2<f64>, a: &Array2<f64>, grad: Array2<f64>) -> Array2<f64> {
        // dz_i = s_i * (g_i - sum_j g_j s_j)
        let dot = (&grad * a).sum_axis(Axis(1)).insert_axis(Axis(1));
        (grad - &dot) * a
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Activations {
    Relu,
    Sigmoid,
    Tanh,
    LeakyRelu,
    #[serde(alias = "identity")]
    Linear,
    Softmax,
}

impl Activations {
    pub fn wake(&self) -> Rc<dyn Activation> {
        match self {
            Activations::Relu => Rc::new(Relu),
            Activations::Sigmoid => Rc::new(Sigmoid),
            Activations::Tanh => Rc::new(Tanh),
            Activations::LeakyRelu => Rc::new(LeakyRelu),
            Activations::Linear => Rc::new(Identity),
            Activations::Softmax => Rc::new(Softmax),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn softmax_rows_sum_to_one() {
        let z = array![[1., 2., 3.], [1000., 1000., 1000.]];
        let s = Softmax.a(&z);
        for row in s.rows() {
            assert!((row.sum() - 1.).abs() < 1e-12);
        }
        assert!((s[[1, 0]] - 1. / 3.).abs() < 1e-12);
    }

    #[test]
    fn softmax_chain_matches_finite_difference() {
        let z = array![[0.3, -1.2, 0.8]];
        let grad = array![[0.5, -0.25, 1.0]];
        let a = Softmax.a(&z);
        let analytic = Softmax.chain(&z, &a, grad.clone());

        let h = 1e-6;
        for j in 0..3 {
            let mut zp = z.clone();
            zp[[0, j]] += h;
            let mut zm = z.clone();
            zm[[0, j]] -= h;
            let fp = (Softmax.a(&zp) * &grad).sum();
            let fm = (Softmax.a(&zm) * &grad).sum();
            let numeric = (fp - fm) / (2. * h);
            assert!((analytic[[0, j]] - numeric).abs() < 1e-6);
        }
    }

    #[test]
    fn relu_derivative_is_a_step() {
        let z = array![[-1., 0., 2.]];
        assert_eq!(Relu.d(&z), array![[0., 0., 1.]]);
        assert_eq!(LeakyRelu.a(&z), array![[-0.2, 0., 2.]]);
    }

    #[test]
    fn ids_are_camel_case() {
        let a: Activations = serde_json::from_str("\"leakyRelu\"").unwrap();
        assert_eq!(a, Activations::LeakyRelu);
        assert_eq!(serde_json::to_string(&Activations::Linear).unwrap(), "\"linear\"");
    }
}
