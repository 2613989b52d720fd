use ndarray::{Array1, Axis};

use crate::data::{Dataset, Stats};
use crate::nn::Predictor;
use crate::Result;

use super::{draw_axes, Path, Rgba, Surface};

/// Points the fitted curve is sampled at.
pub const CURVE_POINTS: usize = 100;

const POINT_RADIUS: f64 = 3.;

/// Draws the samples of a one-feature regression set and the model's curve over `[-1, 1]`.
pub fn draw_regression_line<S: Surface + ?Sized>(
    surface: &mut S,
    model: &dyn Predictor,
    dataset: &Dataset,
    stats: &Stats,
) -> Result<()> {
    let (w, h) = (surface.width() as f64, surface.height() as f64);
    let targets = dataset.targets();
    let (y_min, y_max) = targets
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let span = (y_max - y_min).max(f64::EPSILON);

    let to_px = |x: f64| (x + 1.) / 2. * w;
    let to_py = |y: f64| h - (y - y_min) / span * h;

    surface.clear();
    draw_axes(surface);

    for (row, y) in dataset.features.axis_iter(Axis(0)).zip(targets.column(0)) {
        surface.fill_circle(to_px(row[0]), to_py(*y), POINT_RADIUS, Rgba::CYAN);
    }

    let xs = Array1::linspace(-1., 1., CURVE_POINTS).insert_axis(Axis(1));
    let ys = model.predict(&stats.apply(&xs)?)?;

    let mut curve = Path::new();
    for (x, y) in xs.column(0).iter().zip(ys.column(0)) {
        curve.line_to(to_px(*x), to_py(*y));
    }
    surface.stroke_path(&curve, Rgba::ORANGE, 2.);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DatasetKind, Labels};
    use crate::render::{Raster, MAIN_SIZE};
    use ndarray::{array, Array2};

    /// Predicts the raw (normalized) input.
    struct Echo;

    impl Predictor for Echo {
        fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
            Ok(x.clone())
        }
    }

    #[test]
    fn curve_follows_the_model() {
        let dataset = Dataset {
            kind: DatasetKind::Linear,
            features: array![[-1.], [1.]],
            labels: Labels::Values(vec![-1., 1.]),
            class_count: 1,
            feature_dim: 1,
        };
        let stats = Stats {
            mean: array![0.],
            std: array![1.],
        };
        let mut surface = Raster::new(MAIN_SIZE, MAIN_SIZE);
        draw_regression_line(&mut surface, &Echo, &dataset, &stats).unwrap();

        // y = x runs corner to corner
        assert_eq!(surface.pixel(125, 375), Rgba::ORANGE);
        assert_eq!(surface.pixel(375, 125), Rgba::ORANGE);
        assert_eq!(surface.pixel(125, 125), Rgba::TRANSPARENT);
        assert_eq!(surface.pixel(250, 40), Rgba::GRAY);
    }

    /// Every prediction has blown up.
    struct Diverged;

    impl Predictor for Diverged {
        fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
            Ok(Array2::from_shape_fn(x.raw_dim(), |(i, _)| {
                if i % 2 == 0 {
                    f64::INFINITY
                } else {
                    -1e300
                }
            }))
        }
    }

    #[test]
    fn diverged_model_still_draws_the_samples() {
        let dataset = Dataset {
            kind: DatasetKind::Linear,
            features: array![[-0.5], [0.5]],
            labels: Labels::Values(vec![0., 1.]),
            class_count: 1,
            feature_dim: 1,
        };
        let stats = Stats {
            mean: array![0.],
            std: array![1.],
        };
        let mut surface = Raster::new(MAIN_SIZE, MAIN_SIZE);
        draw_regression_line(&mut surface, &Diverged, &dataset, &stats).unwrap();

        assert_eq!(surface.pixel(125, 499), Rgba::CYAN);
        assert_eq!(surface.pixel(375, 1), Rgba::CYAN);
    }
}
