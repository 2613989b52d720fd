use ndarray::{Array2, Axis};

use crate::data::{Dataset, Labels, Stats};
use crate::f;
use crate::nn::Predictor;
use crate::Result;

use super::{class_color, ImageData, Path, Rgba, Surface, REGION_ALPHA};

/// Cells per side of the decision grid.
pub const GRID: usize = 150;

/// Padding added around the feature bounding box, in feature units.
pub const MARGIN: f64 = 0.5;

const POINT_RADIUS: f64 = 4.;

/// Feature-space rectangle shown on the main surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    /// Bounding box of the first two feature columns, padded by [`MARGIN`].
    pub fn around(features: &Array2<f64>) -> Bounds {
        let cols = f::column_bounds(features);
        let (x_min, x_max) = cols.first().copied().unwrap_or((0., 0.));
        let (y_min, y_max) = cols.get(1).copied().unwrap_or((0., 0.));

        Bounds {
            x_min: x_min - MARGIN,
            x_max: x_max + MARGIN,
            y_min: y_min - MARGIN,
            y_max: y_max + MARGIN,
        }
    }

    /// Maps a feature point onto a `w`×`h` surface, y pointing down.
    pub fn to_pixel(&self, x: f64, y: f64, w: f64, h: f64) -> (f64, f64) {
        (
            (x - self.x_min) / (self.x_max - self.x_min) * w,
            h - (y - self.y_min) / (self.y_max - self.y_min) * h,
        )
    }
}

/// Cell centres of an `n`×`n` grid over `bounds`, row-major with row 0 at `y_max`.
pub fn grid_points(bounds: &Bounds, n: usize) -> Array2<f64> {
    let dx = (bounds.x_max - bounds.x_min) / n as f64;
    let dy = (bounds.y_max - bounds.y_min) / n as f64;

    Array2::from_shape_fn((n * n, 2), |(k, c)| {
        let (row, col) = (k / n, k % n);
        match c {
            0 => bounds.x_min + (col as f64 + 0.5) * dx,
            _ => bounds.y_max - (row as f64 + 0.5) * dy,
        }
    })
}

/// One class per output row: a 0.5 threshold for a single unit, arg-max otherwise.
pub fn classify(output: &Array2<f64>) -> Vec<usize> {
    if output.ncols() == 1 {
        output.column(0).iter().map(|p| usize::from(*p > 0.5)).collect()
    } else {
        output.axis_iter(Axis(0)).map(f::argmax).collect()
    }
}

pub fn draw_axes<S: Surface + ?Sized>(surface: &mut S) {
    let (w, h) = (surface.width() as f64, surface.height() as f64);
    let mut axes = Path::new();
    axes.move_to(0., h / 2.)
        .line_to(w, h / 2.)
        .move_to(w / 2., 0.)
        .line_to(w / 2., h);
    surface.stroke_path(&axes, Rgba::GRAY, 1.);
}

/// Paints the predicted class regions under the samples of a classification set.
pub fn draw_decision_boundary<S: Surface + ?Sized>(
    surface: &mut S,
    model: &dyn Predictor,
    dataset: &Dataset,
    stats: &Stats,
) -> Result<()> {
    let bounds = Bounds::around(&dataset.features);
    let grid = stats.apply(&grid_points(&bounds, GRID))?;
    let classes = classify(&model.predict(&grid)?);

    let mut image = ImageData::new(GRID, GRID);
    for (k, class) in classes.iter().enumerate() {
        image.put(k % GRID, k / GRID, class_color(*class).with_alpha(REGION_ALPHA));
    }

    let (w, h) = (surface.width() as f64, surface.height() as f64);
    surface.clear();
    surface.draw_image(&image, 0., 0., w, h);
    draw_axes(surface);

    if let Labels::Classes(labels) = &dataset.labels {
        for (row, label) in dataset.features.axis_iter(Axis(0)).zip(labels) {
            let (px, py) = bounds.to_pixel(row[0], row[1], w, h);
            surface.fill_circle(px, py, POINT_RADIUS, class_color(*label));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Raster, MAIN_SIZE, PALETTE};
    use ndarray::array;

    /// Class 1 above the x axis, class 0 below, on raw features.
    struct UpperHalf;

    impl Predictor for UpperHalf {
        fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
            Ok(x.map_axis(Axis(1), |r| if r[1] > 0. { 0.9 } else { 0.1 })
                .insert_axis(Axis(1)))
        }
    }

    fn identity_stats() -> Stats {
        Stats {
            mean: array![0., 0.],
            std: array![1., 1.],
        }
    }

    #[test]
    fn grid_starts_top_left() {
        let b = Bounds { x_min: 0., x_max: 2., y_min: 0., y_max: 2. };
        let g = grid_points(&b, 2);
        assert_eq!(g, array![[0.5, 1.5], [1.5, 1.5], [0.5, 0.5], [1.5, 0.5]]);
    }

    #[test]
    fn classify_by_output_width() {
        assert_eq!(classify(&array![[0.2], [0.5], [0.51]]), vec![0, 0, 1]);
        assert_eq!(classify(&array![[0.1, 0.7, 0.2], [0.6, 0.3, 0.1]]), vec![1, 0]);
    }

    #[test]
    fn regions_and_points_share_orientation() {
        let dataset = Dataset {
            kind: crate::data::DatasetKind::Moons,
            features: array![[-1., -1.], [1., 1.]],
            labels: Labels::Classes(vec![0, 1]),
            class_count: 2,
            feature_dim: 2,
        };
        let mut surface = Raster::new(MAIN_SIZE, MAIN_SIZE);
        draw_decision_boundary(&mut surface, &UpperHalf, &dataset, &identity_stats()).unwrap();

        let region = |x, y| {
            let p = surface.pixel(x, y);
            Rgba(p.0, p.1, p.2, 255)
        };
        assert_eq!(region(20, 20), PALETTE[1]);
        assert_eq!(region(20, 480), PALETTE[0]);
        assert_eq!(surface.pixel(20, 20).3, REGION_ALPHA);

        // samples sit in the corners of the padded box, on top of their own region
        let (top_right, bottom_left) = (surface.pixel(416, 83), surface.pixel(83, 416));
        assert_eq!(top_right, PALETTE[1]);
        assert_eq!(bottom_left, PALETTE[0]);
        assert_eq!(surface.pixel(250, 10), Rgba::GRAY);
    }
}
