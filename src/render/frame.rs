use tracing::trace;
use uuid::Uuid;

use crate::nn::EpochLogs;
use crate::run::{Callbacks, Scene, Status};
use crate::Result;

use super::{
    draw_decision_boundary, draw_regression_line, LossCurve, Raster, Surface, LOSS_HEIGHT,
    LOSS_WIDTH, MAIN_SIZE,
};

/// How many frames of each kind were drawn since the last reset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameCounts {
    pub boundary: usize,
    pub regression: usize,
}

/// Repaints the main and loss surfaces after every epoch.
pub struct FrameRenderer<S: Surface> {
    main: S,
    loss: S,
    curve: LossCurve,
    counts: FrameCounts,
    training: bool,
}

impl<S: Surface> FrameRenderer<S> {
    pub fn new(main: S, loss: S) -> FrameRenderer<S> {
        FrameRenderer {
            main,
            loss,
            curve: LossCurve::new(),
            counts: FrameCounts::default(),
            training: false,
        }
    }

    pub fn main(&self) -> &S {
        &self.main
    }

    pub fn loss(&self) -> &S {
        &self.loss
    }

    pub fn curve(&self) -> &LossCurve {
        &self.curve
    }

    pub fn counts(&self) -> FrameCounts {
        self.counts
    }

    /// Whether a run is training right now.
    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Blank surfaces and an empty curve, ready for a new run.
    pub fn reset(&mut self) {
        self.main.clear();
        self.loss.clear();
        self.curve.reset();
        self.counts = FrameCounts::default();
    }

    pub fn render(&mut self, logs: &EpochLogs, scene: &Scene) -> Result<()> {
        self.curve.push(logs.loss);
        self.curve.draw(&mut self.loss);

        if scene.dataset.kind.is_regression() {
            draw_regression_line(&mut self.main, scene.model, scene.dataset, scene.stats)?;
            self.counts.regression += 1;
        } else {
            draw_decision_boundary(&mut self.main, scene.model, scene.dataset, scene.stats)?;
            self.counts.boundary += 1;
        }

        Ok(())
    }
}

impl FrameRenderer<Raster> {
    /// In-memory surfaces at the page's sizes.
    pub fn rasters() -> FrameRenderer<Raster> {
        FrameRenderer::new(
            Raster::new(MAIN_SIZE, MAIN_SIZE),
            Raster::new(LOSS_WIDTH, LOSS_HEIGHT),
        )
    }
}

impl<S: Surface> Callbacks for FrameRenderer<S> {
    fn on_run_start(&mut self, _id: Uuid) {
        self.reset();
    }

    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs, scene: &Scene) -> Result<()> {
        self.render(logs, scene)?;
        trace!(epoch, frames = self.curve.len(), "frame drawn");
        Ok(())
    }

    fn on_status(&mut self, status: &Status) {
        self.training = status.is_training();
    }
}
