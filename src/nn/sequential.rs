use std::rc::Rc;

use ndarray::{Array2, Axis};
use rand::{seq::SliceRandom, thread_rng};

use crate::f;
use crate::layers::Dense;
use crate::loss::{Loss, Losses};
use crate::optimizers::{Hyper, Optimizer};
use crate::{Error, Result};

use super::types::{Backend, Compile, EpochLogs, LayerSpec, Metric, Model, Predictor};

pub type Web = Vec<Dense>;

/// A plain stack of dense layers trained by backpropagation.
pub struct Sequential {
    specs: Vec<LayerSpec>,
    web: Web,
    loss: Losses,
    optimizer: Box<dyn Optimizer>,
    metrics: Vec<Metric>,
    disposed: bool,
}

impl Sequential {
    pub fn new(layers: &[LayerSpec], compile: &Compile) -> Result<Sequential> {
        Ok(Sequential {
            specs: layers.to_vec(),
            web: Sequential::weave(layers)?,
            loss: compile.loss,
            optimizer: compile.optimizer.wake(compile.learning_rate),
            metrics: compile.metrics.clone(),
            disposed: false,
        })
    }

    fn weave(layers: &[LayerSpec]) -> Result<Web> {
        let first = layers
            .first()
            .ok_or_else(|| Error::Shape("a model needs at least one layer".to_string()))?;
        let mut p_dim = first
            .input_dim
            .ok_or_else(|| Error::Shape("the first layer must declare its input width".to_string()))?;

        if p_dim == 0 {
            return Err(Error::Shape("input width must be positive".to_string()));
        }

        let mut web = Web::with_capacity(layers.len());
        for (i, spec) in layers.iter().enumerate() {
            if spec.units == 0 {
                return Err(Error::Shape(format!("layer {} has zero units", i)));
            }
            web.push(Dense::new(p_dim, spec.units, spec.activation));
            p_dim = spec.units;
        }

        Ok(web)
    }

    fn d_in(&self) -> usize {
        self.web.first().map(|l| l.d_in()).unwrap_or(0)
    }

    fn d_out(&self) -> usize {
        self.web.last().map(|l| l.d_out()).unwrap_or(0)
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<()> {
        if self.disposed {
            return Err(Error::Disposed);
        }
        if x.ncols() != self.d_in() {
            return Err(Error::Shape(format!(
                "expected {} input columns, got {}",
                self.d_in(),
                x.ncols()
            )));
        }
        Ok(())
    }

    pub fn forward(&mut self, mut x: Array2<f64>) -> Array2<f64> {
        for layer in self.web.iter_mut() {
            x = layer.forward(x);
        }
        x
    }

    pub fn backwards(&mut self, y_pred: &Array2<f64>, y: &Array2<f64>, loss: Rc<dyn Loss>) {
        let mut grad_output = loss.d(y_pred, y);

        for (i, layer) in self.web.iter_mut().enumerate().rev() {
            grad_output = layer.backward(grad_output);

            self.optimizer
                .update(2 * i, layer.w.view_mut().into_dyn(), layer.grad_w.view().into_dyn());
            self.optimizer
                .update(2 * i + 1, layer.b.view_mut().into_dyn(), layer.grad_b.view().into_dyn());
        }
    }
}

impl Predictor for Sequential {
    fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_input(x)?;

        let mut out = x.to_owned();
        for layer in self.web.iter() {
            out = layer.predict(&out);
        }
        Ok(out)
    }
}

impl Model for Sequential {
    fn fit_epoch(&mut self, x: &Array2<f64>, y: &Array2<f64>, hyper: &Hyper) -> Result<EpochLogs> {
        self.check_input(x)?;
        if y.nrows() != x.nrows() || y.ncols() != self.d_out() {
            return Err(Error::Shape(format!(
                "targets are {:?}, expected ({}, {})",
                y.dim(),
                x.nrows(),
                self.d_out()
            )));
        }

        let n = x.nrows();
        let mut indices = (0..n).collect::<Vec<usize>>();
        if hyper.shuffle {
            indices.shuffle(&mut thread_rng());
        }

        let loss = self.loss.wake();
        let track_accuracy = self.metrics.contains(&Metric::Accuracy);
        let mut total_loss = 0.;
        let mut total_correct = 0.;

        for batch in indices.chunks(hyper.batch_size.max(1)) {
            let batch_x = x.select(Axis(0), batch);
            let batch_y = y.select(Axis(0), batch);

            self.optimizer.tick();
            let y_pred = self.forward(batch_x);

            total_loss += loss.a(&y_pred, &batch_y).sum();
            if track_accuracy {
                total_correct += f::accuracy(&y_pred, &batch_y) * batch.len() as f64;
            }

            self.backwards(&y_pred, &batch_y, loss.clone());
        }

        let ct = n.max(1) as f64;
        Ok(EpochLogs {
            loss: total_loss / ct,
            accuracy: track_accuracy.then(|| total_correct / ct),
        })
    }

    fn layers(&self) -> &[LayerSpec] {
        &self.specs
    }

    fn dispose(&mut self) {
        for layer in self.web.iter_mut() {
            layer.release();
        }
        self.web.clear();
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// In-process ndarray backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct Native;

impl Backend for Native {
    type Model = Sequential;

    fn sequential(&mut self, layers: &[LayerSpec], compile: &Compile) -> Result<Sequential> {
        Sequential::new(layers, compile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activations;
    use crate::optimizers::Optimizers;
    use ndarray::{array, Array1};

    fn stack(hidden: &[usize], out: usize, out_activation: Activations, d_in: usize) -> Vec<LayerSpec> {
        let mut specs = hidden
            .iter()
            .enumerate()
            .map(|(i, units)| LayerSpec {
                units: *units,
                activation: Activations::Tanh,
                input_dim: (i == 0).then_some(d_in),
            })
            .collect::<Vec<_>>();
        specs.push(LayerSpec {
            units: out,
            activation: out_activation,
            input_dim: None,
        });
        specs
    }

    #[test]
    fn zero_width_is_a_shape_error() {
        let compile = Compile {
            optimizer: Optimizers::Sgd,
            learning_rate: 0.1,
            loss: Losses::MeanSquaredError,
            metrics: vec![],
        };
        let specs = stack(&[4, 0], 1, Activations::Linear, 1);
        assert!(matches!(Native.sequential(&specs, &compile), Err(Error::Shape(_))));
    }

    #[test]
    fn predict_checks_columns() {
        let compile = Compile {
            optimizer: Optimizers::Sgd,
            learning_rate: 0.1,
            loss: Losses::MeanSquaredError,
            metrics: vec![],
        };
        let model = Native
            .sequential(&stack(&[3], 1, Activations::Linear, 2), &compile)
            .unwrap();
        assert_eq!(model.predict(&Array2::zeros((5, 2))).unwrap().dim(), (5, 1));
        assert!(model.predict(&Array2::zeros((5, 3))).is_err());
    }

    #[test]
    fn learns_a_line() {
        let compile = Compile {
            optimizer: Optimizers::Adam,
            learning_rate: 0.05,
            loss: Losses::MeanSquaredError,
            metrics: vec![],
        };
        let mut model = Native
            .sequential(&stack(&[8], 1, Activations::Linear, 1), &compile)
            .unwrap();

        let xs = Array1::linspace(-1., 1., 64).insert_axis(Axis(1));
        let ys = xs.mapv(|x| 0.8 * x + 0.3);
        let hyper = Hyper::new();

        let first = model.fit_epoch(&xs, &ys, &hyper).unwrap();
        let mut last = first;
        for _ in 0..150 {
            last = model.fit_epoch(&xs, &ys, &hyper).unwrap();
        }

        assert!(first.accuracy.is_none());
        assert!(last.loss < first.loss);
        assert!(last.loss < 0.02, "loss stayed at {}", last.loss);
    }

    #[test]
    fn separates_xor_with_accuracy() {
        let compile = Compile {
            optimizer: Optimizers::Adam,
            learning_rate: 0.05,
            loss: Losses::BinaryCrossentropy,
            metrics: vec![Metric::Accuracy],
        };
        let mut model = Native
            .sequential(&stack(&[8], 1, Activations::Sigmoid, 2), &compile)
            .unwrap();

        let xs = array![[0., 0.], [0., 1.], [1., 0.], [1., 1.]];
        let ys = array![[0.], [1.], [1.], [0.]];
        let hyper = Hyper::new();

        let mut logs = model.fit_epoch(&xs, &ys, &hyper).unwrap();
        for _ in 0..1000 {
            logs = model.fit_epoch(&xs, &ys, &hyper).unwrap();
        }

        assert_eq!(logs.accuracy, Some(1.));
    }

    #[test]
    fn dispose_blocks_further_use() {
        let compile = Compile {
            optimizer: Optimizers::Sgd,
            learning_rate: 0.1,
            loss: Losses::MeanSquaredError,
            metrics: vec![],
        };
        let mut model = Native
            .sequential(&stack(&[2], 1, Activations::Linear, 1), &compile)
            .unwrap();
        model.dispose();
        model.dispose();

        assert!(model.is_disposed());
        assert!(matches!(model.predict(&Array2::zeros((1, 1))), Err(Error::Disposed)));
    }
}
