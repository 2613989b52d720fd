use super::{Path, Rgba, Surface};

const LEFT: f64 = 30.;
const BASELINE: f64 = 140.;
const PLOT_WIDTH: f64 = 450.;
const Y_SCALE: f64 = 100.;

/// Loss values of the current run, one per finished epoch.
///
/// Only grows while a run trains; [`LossCurve::reset`] starts the next run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LossCurve {
    losses: Vec<f64>,
}

impl LossCurve {
    pub fn new() -> LossCurve {
        LossCurve::default()
    }

    pub fn push(&mut self, loss: f64) {
        self.losses.push(loss);
    }

    pub fn reset(&mut self) {
        self.losses.clear();
    }

    pub fn values(&self) -> &[f64] {
        &self.losses
    }

    pub fn len(&self) -> usize {
        self.losses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.losses.is_empty()
    }

    /// Redraws the whole curve. Values are not rescaled, so large losses run off the top.
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface.clear();

        let mut axes = Path::new();
        axes.move_to(LEFT, 0.)
            .line_to(LEFT, surface.height() as f64)
            .move_to(LEFT, BASELINE)
            .line_to(surface.width() as f64, BASELINE);
        surface.stroke_path(&axes, Rgba::GRAY, 1.);

        let len = self.losses.len() as f64;
        let mut line = Path::new();
        for (i, loss) in self.losses.iter().enumerate() {
            line.line_to(LEFT + i as f64 / len * PLOT_WIDTH, BASELINE - loss * Y_SCALE);
        }
        surface.stroke_path(&line, Rgba::LIME, 2.);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Raster, LOSS_HEIGHT, LOSS_WIDTH};

    #[test]
    fn grows_then_resets() {
        let mut curve = LossCurve::new();
        for (i, loss) in [0.9, 0.5, 0.3].iter().enumerate() {
            curve.push(*loss);
            assert_eq!(curve.len(), i + 1);
        }
        assert_eq!(curve.values(), &[0.9, 0.5, 0.3]);

        curve.reset();
        assert!(curve.is_empty());
    }

    #[test]
    fn draws_axes_and_line() {
        let mut surface = Raster::new(LOSS_WIDTH, LOSS_HEIGHT);
        let mut curve = LossCurve::new();
        curve.push(0.5);
        curve.push(0.5);
        curve.draw(&mut surface);

        assert_eq!(surface.pixel(30, 10), Rgba::GRAY);
        assert_eq!(surface.pixel(400, 140), Rgba::GRAY);
        // flat at 140 - 50
        assert_eq!(surface.pixel(150, 90), Rgba::LIME);
        assert_eq!(surface.pixel(300, 90), Rgba::TRANSPARENT);
    }

    #[test]
    fn huge_losses_are_not_clipped_into_view() {
        let mut surface = Raster::new(LOSS_WIDTH, LOSS_HEIGHT);
        let mut curve = LossCurve::new();
        curve.push(50.);
        curve.push(60.);
        curve.draw(&mut surface);

        let lime = (0..LOSS_HEIGHT)
            .flat_map(|y| (0..LOSS_WIDTH).map(move |x| (x, y)))
            .filter(|(x, y)| surface.pixel(*x, *y) == Rgba::LIME)
            .count();
        assert_eq!(lime, 0);
    }

    #[test]
    fn diverged_losses_draw_in_bounded_time() {
        let lime = |surface: &Raster| {
            (0..LOSS_HEIGHT)
                .flat_map(|y| (0..LOSS_WIDTH).map(move |x| (x, y)))
                .filter(|(x, y)| surface.pixel(*x, *y) == Rgba::LIME)
                .count()
        };

        // the first segment climbs straight off the top from (30, 90)
        let mut surface = Raster::new(LOSS_WIDTH, LOSS_HEIGHT);
        let mut curve = LossCurve::new();
        curve.push(0.5);
        curve.push(1e12);
        curve.draw(&mut surface);
        assert_eq!(surface.pixel(30, 40), Rgba::LIME);
        assert!(lime(&surface) > 0);

        let mut surface = Raster::new(LOSS_WIDTH, LOSS_HEIGHT);
        let mut curve = LossCurve::new();
        for loss in [0.5, f64::INFINITY, f64::NAN, 0.5] {
            curve.push(loss);
        }
        curve.draw(&mut surface);
        assert_eq!(lime(&surface), 0);
        assert_eq!(surface.pixel(30, 10), Rgba::GRAY);
    }
}
