use ndarray::{Array1, Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use crate::activation::Activations;

/// Fully connected layer, `a = act(x · w + b)`.
#[derive(Debug, Clone)]
pub struct Layer {
    pub x: Array2<f64>,
    pub z: Array2<f64>,
    pub a: Array2<f64>,
    pub w: Array2<f64>,
    pub b: Array1<f64>,
    pub grad_w: Array2<f64>,
    pub grad_b: Array1<f64>,
    pub activation: Activations,
}

impl Layer {
    /// Glorot-uniform weights, zero bias.
    pub fn new(d_in: usize, d_out: usize, activation: Activations) -> Layer {
        let limit = (6. / (d_in + d_out) as f64).sqrt();
        let w_shape = (d_in, d_out);

        Layer {
            x: Array2::zeros((0, d_in)),
            z: Array2::zeros((0, d_out)),
            a: Array2::zeros((0, d_out)),
            w: Array2::random(w_shape, Uniform::new_inclusive(-limit, limit)),
            b: Array1::zeros(d_out),
            grad_w: Array2::zeros(w_shape),
            grad_b: Array1::zeros(d_out),
            activation,
        }
    }

    pub fn d_in(&self) -> usize {
        self.w.nrows()
    }

    pub fn d_out(&self) -> usize {
        self.w.ncols()
    }

    /// Inference only, nothing is cached.
    pub fn predict(&self, x: &Array2<f64>) -> Array2<f64> {
        let z = x.dot(&self.w) + &self.b;
        self.activation.wake().a(&z)
    }

    /// Forward pass that keeps `x`, `z` and `a` around for [`Layer::backward`].
    pub fn forward(&mut self, x: Array2<f64>) -> Array2<f64> {
        let z = x.dot(&self.w) + &self.b;
        let a = self.activation.wake().a(&z);

        self.x = x;
        self.z = z;
        self.a = a.clone();
        a
    }

    /// Takes dL/da for every row of the last batch, stores the batch-mean
    /// parameter gradients and returns dL/dx.
    pub fn backward(&mut self, grad_output: Array2<f64>) -> Array2<f64> {
        let batch_size = self.x.nrows().max(1) as f64;

        let grad_z = self.activation.wake().chain(&self.z, &self.a, grad_output);
        let grad_input = grad_z.dot(&self.w.t());

        // Mean gradients instead of accumulating
        self.grad_w = self.x.t().dot(&grad_z) / batch_size;
        self.grad_b = grad_z.sum_axis(Axis(0)) / batch_size;

        grad_input
    }

    /// Drops every array the layer holds.
    pub fn release(&mut self) {
        let d_in = self.d_in();
        let d_out = self.d_out();
        self.x = Array2::zeros((0, d_in));
        self.z = Array2::zeros((0, d_out));
        self.a = Array2::zeros((0, d_out));
        self.w = Array2::zeros((0, 0));
        self.b = Array1::zeros(0);
        self.grad_w = Array2::zeros((0, 0));
        self.grad_b = Array1::zeros(0);
    }
}
