use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path as FsPath;

use ndarray::{s, Array3};

use crate::Result;

use super::{ImageData, Path, Rgba, Surface};

/// In-memory RGBA surface, `(height, width, 4)`, starting fully transparent.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pixels: Array3<u8>,
}

impl Raster {
    pub fn new(width: usize, height: usize) -> Raster {
        Raster {
            pixels: Array3::zeros((height, width, 4)),
        }
    }

    pub fn pixels(&self) -> &Array3<u8> {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        let p = self.pixels.slice(s![y, x, ..]);
        Rgba(p[0], p[1], p[2], p[3])
    }

    /// Count of pixels with any coverage.
    pub fn painted(&self) -> usize {
        self.pixels
            .slice(s![.., .., 3])
            .iter()
            .filter(|a| **a > 0)
            .count()
    }

    fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width() && (y as usize) < self.height()
    }

    fn blend(&mut self, x: usize, y: usize, src: Rgba) {
        if src.3 == 0 {
            return;
        }
        if src.3 == 255 {
            self.set(x, y, src);
            return;
        }

        let dst = self.pixel(x, y);
        let sa = src.3 as f64 / 255.;
        let da = dst.3 as f64 / 255.;
        let oa = sa + da * (1. - sa);
        let channel = |s: u8, d: u8| {
            let v = (s as f64 * sa + d as f64 * da * (1. - sa)) / oa;
            v.round().clamp(0., 255.) as u8
        };

        self.set(
            x,
            y,
            Rgba(
                channel(src.0, dst.0),
                channel(src.1, dst.1),
                channel(src.2, dst.2),
                (oa * 255.).round() as u8,
            ),
        );
    }

    fn set(&mut self, x: usize, y: usize, c: Rgba) {
        let mut p = self.pixels.slice_mut(s![y, x, ..]);
        p[0] = c.0;
        p[1] = c.1;
        p[2] = c.2;
        p[3] = c.3;
    }

    /// Pixels covered by a segment swept with a square pen of `line_width`.
    ///
    /// The segment is clipped to the surface first, so the work never exceeds
    /// the surface size however far off it the endpoints lie.
    fn segment_cover(&self, from: (f64, f64), to: (f64, f64), line_width: f64, cover: &mut HashSet<(usize, usize)>) {
        let half = (line_width / 2.).max(0.5);
        let window = (-half, -half, self.width() as f64 + half, self.height() as f64 + half);
        let (from, to) = match clip_segment(from, to, window) {
            Some(clipped) => clipped,
            None => return,
        };

        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = (dx.abs().max(dy.abs()) * 2.).ceil().max(1.) as usize;

        for k in 0..=steps {
            let t = k as f64 / steps as f64;
            let (cx, cy) = (from.0 + dx * t, from.1 + dy * t);

            let (x0, x1) = ((cx - half).round() as i64, (cx + half).round() as i64);
            let (y0, y1) = ((cy - half).round() as i64, (cy + half).round() as i64);
            for py in y0..y1.max(y0 + 1) {
                for px in x0..x1.max(x0 + 1) {
                    if self.in_bounds(px, py) {
                        cover.insert((px as usize, py as usize));
                    }
                }
            }
        }
    }

    /// Binary PPM (P6) of the surface composited over `background`.
    pub fn to_ppm(&self, background: Rgba) -> Vec<u8> {
        let (h, w) = (self.height(), self.width());
        let mut out = format!("P6\n{} {}\n255\n", w, h).into_bytes();
        out.reserve(w * h * 3);

        for y in 0..h {
            for x in 0..w {
                let p = self.pixel(x, y);
                let a = p.3 as f64 / 255.;
                let mix = |s: u8, b: u8| (s as f64 * a + b as f64 * (1. - a)).round() as u8;
                out.extend([mix(p.0, background.0), mix(p.1, background.1), mix(p.2, background.2)]);
            }
        }
        out
    }

    pub fn write_ppm(&self, path: &FsPath, background: Rgba) -> Result<()> {
        let mut file = fs::File::create(path)?;
        file.write_all(&self.to_ppm(background))?;
        Ok(())
    }
}

impl Surface for Raster {
    fn width(&self) -> usize {
        self.pixels.dim().1
    }

    fn height(&self) -> usize {
        self.pixels.dim().0
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let x0 = x.max(0.).round() as usize;
        let y0 = y.max(0.).round() as usize;
        let x1 = ((x + w).round().max(0.) as usize).min(self.width());
        let y1 = ((y + h).round().max(0.) as usize).min(self.height());
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        self.pixels.slice_mut(s![y0..y1, x0..x1, ..]).fill(0);
    }

    fn stroke_path(&mut self, path: &Path, color: Rgba, line_width: f64) {
        let mut cover = HashSet::new();
        for sub in path.subpaths() {
            for pair in sub.windows(2) {
                self.segment_cover(pair[0], pair[1], line_width, &mut cover);
            }
        }
        for (x, y) in cover {
            self.blend(x, y, color);
        }
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Rgba) {
        if !cx.is_finite() || !cy.is_finite() {
            return;
        }
        let r2 = radius * radius;
        let (w, h) = (self.width() as i64, self.height() as i64);
        let y0 = ((cy - radius).floor() as i64).max(0);
        let y1 = ((cy + radius).ceil() as i64).min(h - 1);
        let x0 = ((cx - radius).floor() as i64).max(0);
        let x1 = ((cx + radius).ceil() as i64).min(w - 1);

        for py in y0..=y1 {
            for px in x0..=x1 {
                let (ddx, ddy) = (px as f64 + 0.5 - cx, py as f64 + 0.5 - cy);
                if ddx * ddx + ddy * ddy <= r2 && self.in_bounds(px, py) {
                    self.blend(px as usize, py as usize, color);
                }
            }
        }
    }

    fn draw_image(&mut self, image: &ImageData, dx: f64, dy: f64, dw: f64, dh: f64) {
        let (iw, ih) = (image.width(), image.height());
        if iw == 0 || ih == 0 || dw <= 0. || dh <= 0. {
            return;
        }

        let x0 = dx.max(0.).round() as usize;
        let y0 = dy.max(0.).round() as usize;
        let x1 = ((dx + dw).round().max(0.) as usize).min(self.width());
        let y1 = ((dy + dh).round().max(0.) as usize).min(self.height());

        for py in y0..y1 {
            let sy = (((py as f64 + 0.5 - dy) / dh * ih as f64) as usize).min(ih - 1);
            for px in x0..x1 {
                let sx = (((px as f64 + 0.5 - dx) / dw * iw as f64) as usize).min(iw - 1);
                self.blend(px, py, image.get(sx, sy));
            }
        }
    }
}

/// Liang-Barsky clip of a segment to `(x_min, y_min, x_max, y_max)`.
///
/// `None` when nothing of it is inside, or when an endpoint (or the extent
/// between them) is not finite.
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    (x_min, y_min, x_max, y_max): (f64, f64, f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    if ![from.0, from.1, dx, dy].iter().all(|v| v.is_finite()) {
        return None;
    }

    let (mut t0, mut t1) = (0f64, 1f64);
    for (p, q) in [
        (-dx, from.0 - x_min),
        (dx, x_max - from.0),
        (-dy, from.1 - y_min),
        (dy, y_max - from.1),
    ] {
        if p == 0. {
            if q < 0. {
                return None;
            }
            continue;
        }

        let r = q / p;
        if p < 0. {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((
        (from.0 + t0 * dx, from.1 + t0 * dy),
        (from.0 + t1 * dx, from.1 + t1 * dy),
    ))
}
