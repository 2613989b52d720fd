use ndarray::Array2;
use tracing::{debug, info};
use uuid::Uuid;

use crate::activation::Activations;
use crate::config::TrainConfig;
use crate::data::{self, Dataset, Stats};
use crate::loss::Losses;
use crate::nn::{Backend, Compile, EpochLogs, LayerSpec, Metric, Model};
use crate::optimizers::Hyper;
use crate::{Error, Result};

use super::{Callbacks, History, Scene};

/// Width of a hidden layer the user gave no width for.
pub const DEFAULT_WIDTH: usize = 8;

pub const BATCH_SIZE: usize = 32;

/// Hidden layers from the config plus an output layer fitted to the dataset.
pub fn layer_stack(config: &TrainConfig, dataset: &Dataset) -> Vec<LayerSpec> {
    let mut specs = (0..config.layers())
        .map(|i| LayerSpec {
            units: config.widths().get(i).copied().unwrap_or(DEFAULT_WIDTH),
            activation: config.hidden_activation(),
            input_dim: (i == 0).then_some(dataset.feature_dim),
        })
        .collect::<Vec<LayerSpec>>();

    let (units, activation) = match dataset.class_count {
        0 | 1 => (1, Activations::Linear),
        2 => (1, Activations::Sigmoid),
        k => (k, Activations::Softmax),
    };
    if activation != config.output_activation() {
        debug!(
            "output activation {:?} replaced by {:?} for {} classes",
            config.output_activation(),
            activation,
            dataset.class_count
        );
    }

    specs.push(LayerSpec {
        units,
        activation,
        input_dim: None,
    });
    specs
}

/// Regression always trains on mean squared error and never tracks accuracy.
pub fn compile_for(config: &TrainConfig) -> Compile {
    let regression = config.dataset().is_regression();
    Compile {
        optimizer: config.optimizer(),
        learning_rate: config.learning_rate(),
        loss: if regression {
            Losses::MeanSquaredError
        } else {
            config.loss()
        },
        metrics: if regression {
            vec![]
        } else {
            vec![Metric::Accuracy]
        },
    }
}

/// One training run: the dataset, its scaling, the model and what it has learned so far.
///
/// The model is released on [`Run::teardown`] or when the run is dropped,
/// whichever comes first.
pub struct Run<M: Model> {
    id: Uuid,
    config: TrainConfig,
    dataset: Dataset,
    stats: Stats,
    xs: Array2<f64>,
    ys: Array2<f64>,
    model: M,
    hyper: Hyper,
    history: History,
    epoch: usize,
    released: bool,
}

impl<M: Model> Run<M> {
    /// Generates the configured dataset at its default size and builds the model.
    pub fn start<B>(backend: &mut B, config: TrainConfig) -> Result<Run<M>>
    where
        B: Backend<Model = M>,
    {
        let kind = config.dataset();
        let dataset = data::generate(kind, kind.default_size());
        Run::with_dataset(backend, config, dataset)
    }

    pub fn with_dataset<B>(backend: &mut B, config: TrainConfig, dataset: Dataset) -> Result<Run<M>>
    where
        B: Backend<Model = M>,
    {
        let stats = Stats::fit(&dataset.features)?;
        let xs = stats.apply(&dataset.features)?;
        let ys = dataset.targets();

        let layers = layer_stack(&config, &dataset);
        let compile = compile_for(&config);
        let model = backend.sequential(&layers, &compile)?;

        let id = Uuid::new_v4();
        info!(
            "run {} started: {:?} x{}, layers {:?}, {:?} / {:?} lr {}",
            id,
            dataset.kind,
            dataset.len(),
            layers.iter().map(|l| l.units).collect::<Vec<_>>(),
            compile.loss,
            compile.optimizer,
            compile.learning_rate
        );

        let hyper = Hyper {
            batch_size: BATCH_SIZE,
            shuffle: true,
        };

        Ok(Run {
            id,
            history: History::new(compile.metrics.contains(&Metric::Accuracy)),
            config,
            dataset,
            stats,
            xs,
            ys,
            model,
            hyper,
            epoch: 0,
            released: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Epochs finished so far.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn is_finished(&self) -> bool {
        self.epoch >= self.config.epochs()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Fits one epoch, reports it to `callbacks` and yields to the runtime.
    ///
    /// Returns `None` once every configured epoch has run.
    pub async fn step<C>(&mut self, callbacks: &mut C) -> Result<Option<EpochLogs>>
    where
        C: Callbacks + ?Sized,
    {
        if self.released {
            return Err(Error::Disposed);
        }
        if self.is_finished() {
            return Ok(None);
        }

        let logs = self.model.fit_epoch(&self.xs, &self.ys, &self.hyper)?;
        self.history.push(&logs);

        let scene = Scene {
            dataset: &self.dataset,
            stats: &self.stats,
            model: &self.model,
        };
        callbacks.on_epoch_end(self.epoch, &logs, &scene)?;

        debug!(
            "run {} epoch {}/{}: loss {:.5} accuracy {:?}",
            self.id,
            self.epoch + 1,
            self.config.epochs(),
            logs.loss,
            logs.accuracy
        );
        self.epoch += 1;

        tokio::task::yield_now().await;
        Ok(Some(logs))
    }

    /// Steps until every epoch has run.
    pub async fn train<C>(&mut self, callbacks: &mut C) -> Result<&History>
    where
        C: Callbacks + ?Sized,
    {
        while self.step(callbacks).await?.is_some() {}

        callbacks.on_train_end(&self.history);
        info!(
            "run {} settled after {} epochs: loss {:?} accuracy {:?}",
            self.id,
            self.epoch,
            self.history.final_loss(),
            self.history.final_accuracy()
        );
        Ok(&self.history)
    }

    /// Disposes the model and drops the training buffers. Idempotent.
    pub fn teardown(&mut self) {
        if self.released {
            return;
        }
        self.model.dispose();
        self.xs = Array2::zeros((0, 0));
        self.ys = Array2::zeros((0, 0));
        self.released = true;
        debug!("run {} released", self.id);
    }
}

impl<M: Model> Drop for Run<M> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Form;
    use crate::data::DatasetKind;
    use crate::nn::Native;
    use crate::optimizers::Optimizers;

    fn config(dataset: DatasetKind, out: Activations, widths: Vec<usize>, layers: usize) -> TrainConfig {
        Form {
            dataset: Some(dataset),
            loss_function: Some(Losses::CategoricalCrossentropy),
            epochs: Some(2),
            lr: Some(0.01),
            activation_function: Some(Activations::Relu),
            output_activation: Some(out),
            optimizer: Some(Optimizers::Adam),
            layers: Some(layers),
            npl: Some(widths),
        }
        .submit()
        .unwrap()
    }

    struct Silent(usize);

    impl Callbacks for Silent {
        fn on_epoch_end(&mut self, _: usize, _: &EpochLogs, _: &Scene) -> Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    #[test]
    fn missing_widths_default_to_eight() {
        let c = config(DatasetKind::Iris, Activations::Softmax, vec![5], 3);
        let dataset = data::generate(DatasetKind::Iris, 30);
        let specs = layer_stack(&c, &dataset);

        assert_eq!(
            specs.iter().map(|s| s.units).collect::<Vec<_>>(),
            vec![5, 8, 8, 3]
        );
        assert_eq!(specs[0].input_dim, Some(2));
        assert!(specs[1..].iter().all(|s| s.input_dim.is_none()));
        assert_eq!(specs[3].activation, Activations::Softmax);
    }

    #[test]
    fn output_layer_follows_class_count() {
        let c = config(DatasetKind::Moons, Activations::Softmax, vec![4], 1);

        let moons = data::generate(DatasetKind::Moons, 10);
        let out = *layer_stack(&c, &moons).last().unwrap();
        assert_eq!((out.units, out.activation), (1, Activations::Sigmoid));

        let linear = data::generate(DatasetKind::Linear, 10);
        let out = *layer_stack(&c, &linear).last().unwrap();
        assert_eq!((out.units, out.activation), (1, Activations::Linear));
    }

    #[test]
    fn regression_forces_mse_without_accuracy() {
        let compile = compile_for(&config(DatasetKind::Linear, Activations::Linear, vec![4], 1));
        assert_eq!(compile.loss, Losses::MeanSquaredError);
        assert!(compile.metrics.is_empty());

        let compile = compile_for(&config(DatasetKind::Iris, Activations::Softmax, vec![4], 1));
        assert_eq!(compile.loss, Losses::CategoricalCrossentropy);
        assert_eq!(compile.metrics, vec![Metric::Accuracy]);
    }

    #[tokio::test]
    async fn steps_exactly_the_configured_epochs() {
        let c = config(DatasetKind::Iris, Activations::Softmax, vec![6], 1);
        let dataset = data::generate(DatasetKind::Iris, 60);
        let mut run = Run::with_dataset(&mut Native, c, dataset).unwrap();
        let mut callbacks = Silent(0);

        assert!(run.step(&mut callbacks).await.unwrap().is_some());
        let history = run.train(&mut callbacks).await.unwrap().clone();

        assert_eq!(callbacks.0, 2);
        assert_eq!(history.len(), 2);
        assert_eq!(history.accuracy.as_ref().map(Vec::len), Some(2));
        assert!(run.step(&mut callbacks).await.unwrap().is_none());

        run.teardown();
        run.teardown();
        assert!(run.is_released());
        assert!(run.model().is_disposed());
        assert!(matches!(run.step(&mut callbacks).await, Err(Error::Disposed)));
    }
}
