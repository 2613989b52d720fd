//! Drawing: a small 2D surface abstraction and the per-epoch frames drawn on it.

mod boundary;
mod frame;
mod loss_curve;
mod palette;
mod raster;
mod regression;

pub use boundary::{classify, draw_axes, draw_decision_boundary, grid_points, Bounds, GRID, MARGIN};
pub use frame::{FrameCounts, FrameRenderer};
pub use loss_curve::LossCurve;
pub use palette::{class_color, PALETTE, REGION_ALPHA};
pub use raster::Raster;
pub use regression::{draw_regression_line, CURVE_POINTS};

use ndarray::Array3;

/// Side of the square boundary / regression surface.
pub const MAIN_SIZE: usize = 500;
pub const LOSS_WIDTH: usize = 500;
pub const LOSS_HEIGHT: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba(255, 255, 255, 255);
    pub const GRAY: Rgba = Rgba(128, 128, 128, 255);
    pub const CYAN: Rgba = Rgba(0, 255, 255, 255);
    pub const ORANGE: Rgba = Rgba(255, 165, 0, 255);
    pub const LIME: Rgba = Rgba(0, 255, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Rgba {
        Rgba(r, g, b, 255)
    }

    pub const fn with_alpha(self, a: u8) -> Rgba {
        Rgba(self.0, self.1, self.2, a)
    }
}

/// Polylines in surface pixels, built the way a canvas path is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    subpaths: Vec<Vec<(f64, f64)>>,
}

impl Path {
    pub fn new() -> Path {
        Path::default()
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.subpaths.push(vec![(x, y)]);
        self
    }

    /// Starts a subpath when there is none yet.
    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        match self.subpaths.last_mut() {
            Some(sub) => sub.push((x, y)),
            None => self.subpaths.push(vec![(x, y)]),
        }
        self
    }

    pub fn subpaths(&self) -> &[Vec<(f64, f64)>] {
        &self.subpaths
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.iter().all(|s| s.len() < 2)
    }
}

/// An off-screen RGBA pixel buffer, `(height, width, 4)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub data: Array3<u8>,
}

impl ImageData {
    pub fn new(width: usize, height: usize) -> ImageData {
        ImageData {
            data: Array3::zeros((height, width, 4)),
        }
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn get(&self, x: usize, y: usize) -> Rgba {
        Rgba(
            self.data[[y, x, 0]],
            self.data[[y, x, 1]],
            self.data[[y, x, 2]],
            self.data[[y, x, 3]],
        )
    }

    pub fn put(&mut self, x: usize, y: usize, c: Rgba) {
        self.data[[y, x, 0]] = c.0;
        self.data[[y, x, 1]] = c.1;
        self.data[[y, x, 2]] = c.2;
        self.data[[y, x, 3]] = c.3;
    }
}

/// A fixed-size 2D drawing context.
///
/// Coordinates are pixels with the origin top-left. Anything outside the
/// surface is silently dropped.
pub trait Surface {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn stroke_path(&mut self, path: &Path, color: Rgba, line_width: f64);
    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Rgba);

    /// Scales `image` into the rectangle `(dx, dy, dw, dh)`, blending over
    /// what is already there.
    fn draw_image(&mut self, image: &ImageData, dx: f64, dy: f64, dw: f64, dh: f64);

    fn clear(&mut self) {
        let (w, h) = (self.width() as f64, self.height() as f64);
        self.clear_rect(0., 0., w, h);
    }
}
