use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser};
use plotly::common::{Mode, Title};
use plotly::{Layout, Plot, Scatter};
use serde::de::DeserializeOwned;
use tracing::info;
use uuid::Uuid;

use gradvis::config::Form;
use gradvis::data::DatasetKind;
use gradvis::nn::{EpochLogs, Native};
use gradvis::render::{FrameRenderer, Raster, Rgba};
use gradvis::run::{Callbacks, Scene, Session, Status};
use gradvis::util;
use gradvis::{Activations, Losses, Optimizers};

/// Train a small feedforward network on a toy dataset and draw it learning.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// JSON form to start from; flags override its fields
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// moons, circles, linear or iris
    #[arg(long, value_parser = form_id::<DatasetKind>)]
    dataset: Option<DatasetKind>,
    #[arg(long, value_parser = form_id::<Losses>)]
    loss: Option<Losses>,
    #[arg(short, long)]
    epochs: Option<usize>,
    #[arg(long)]
    lr: Option<f64>,
    /// Hidden layer activation
    #[arg(long, value_parser = form_id::<Activations>)]
    activation: Option<Activations>,
    #[arg(long, value_parser = form_id::<Activations>)]
    output_activation: Option<Activations>,
    #[arg(long, value_parser = form_id::<Optimizers>)]
    optimizer: Option<Optimizers>,
    /// Hidden layer count
    #[arg(long)]
    layers: Option<usize>,
    /// Nodes per hidden layer, comma separated
    #[arg(long, value_delimiter = ',')]
    npl: Option<Vec<usize>>,
    /// Directory for the final frames and the loss chart
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,
    /// Also write one boundary frame per epoch
    #[arg(long, requires = "out")]
    frames: bool,
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn form(&self) -> Form {
        Form {
            dataset: self.dataset,
            loss_function: self.loss,
            epochs: self.epochs,
            lr: self.lr,
            activation_function: self.activation,
            output_activation: self.output_activation,
            optimizer: self.optimizer,
            layers: self.layers,
            npl: self.npl.clone(),
        }
    }
}

/// Parses a flag with the same camelCase ids the JSON form uses.
fn form_id<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).map_err(|e| e.to_string())
}

/// Draws every frame and optionally saves each main frame to disk.
struct Exporter {
    frames: FrameRenderer<Raster>,
    dir: Option<PathBuf>,
}

impl Callbacks for Exporter {
    fn on_run_start(&mut self, id: Uuid) {
        self.frames.on_run_start(id);
    }

    fn on_status(&mut self, status: &Status) {
        self.frames.on_status(status);
    }

    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs, scene: &Scene) -> gradvis::Result<()> {
        self.frames.on_epoch_end(epoch, logs, scene)?;
        if let Some(dir) = &self.dir {
            let path = dir.join(format!("boundary_{:04}.ppm", epoch));
            self.frames.main().write_ppm(&path, Rgba::BLACK)?;
        }
        Ok(())
    }
}

fn write_outputs(dir: &Path, frames: &FrameRenderer<Raster>) -> anyhow::Result<()> {
    frames.main().write_ppm(&dir.join("boundary.ppm"), Rgba::BLACK)?;
    frames.loss().write_ppm(&dir.join("loss.ppm"), Rgba::BLACK)?;

    let losses = frames.curve().values().to_vec();
    let epochs = (1..=losses.len()).collect::<Vec<usize>>();

    let mut plot = Plot::new();
    plot.add_trace(Scatter::new(epochs, losses).mode(Mode::Lines).name("loss"));
    plot.set_layout(Layout::new().title(Title::new("Training loss")));
    plot.write_html(dir.join("loss.html"));

    info!("frames written to {}", dir.display());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    util::init_logging(cli.verbose)?;

    let base = match &cli.config {
        Some(path) => Form::load(path).with_context(|| format!("reading {}", path.display()))?,
        None => Form::default(),
    };
    let form = base.merge(cli.form());

    if let Some(dir) = &cli.out {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let exporter = Exporter {
        frames: FrameRenderer::rasters(),
        dir: cli.out.clone().filter(|_| cli.frames),
    };
    let mut session = Session::new(Native, exporter);
    session.submit(&form)?;

    // frames are written even when training fails part way
    let trained = session.train().await;
    if let Some(dir) = &cli.out {
        write_outputs(dir, &session.callbacks().frames)?;
    }
    trained?;

    if let Status::Settled {
        final_loss,
        final_accuracy,
    } = session.status()
    {
        match (final_loss, final_accuracy) {
            (Some(loss), Some(acc)) => println!("loss {:.5}  accuracy {:.2}%", loss, acc * 100.),
            (Some(loss), None) => println!("loss {:.5}", loss),
            _ => {}
        }
    }

    session.unmount();
    Ok(())
}
