use std::f64::consts::PI;

use ndarray::Array2;
use rand::{thread_rng, Rng};

use super::{Dataset, DatasetKind, Labels};

/// Relative radius jitter of the moons and circles.
pub const NOISE: f64 = 0.1;

/// `n` fresh samples of `kind` from an unseeded source.
pub fn generate(kind: DatasetKind, n: usize) -> Dataset {
    generate_with(kind, n, &mut thread_rng())
}

pub fn generate_with<R: Rng + ?Sized>(kind: DatasetKind, n: usize, rng: &mut R) -> Dataset {
    let (rows, labels) = match kind {
        DatasetKind::Moons => moons(n, NOISE, rng),
        DatasetKind::Circles => circles(n, NOISE, rng),
        DatasetKind::Linear => linear(n, rng),
        DatasetKind::Iris => iris(n, rng),
    };

    let feature_dim = kind.feature_dim();
    let features = Array2::from_shape_fn((rows.len(), feature_dim), |(i, j)| rows[i][j]);

    Dataset {
        kind,
        features,
        labels,
        class_count: kind.class_count(),
        feature_dim,
    }
}

fn jitter<R: Rng + ?Sized>(radius: f64, noise: f64, rng: &mut R) -> f64 {
    radius + (rng.gen::<f64>() - 0.5) * noise
}

/// Two interleaved crescents. The second is the first mirrored and shifted.
fn moons<R: Rng + ?Sized>(n: usize, noise: f64, rng: &mut R) -> (Vec<[f64; 2]>, Labels) {
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);

    for _ in 0..n {
        let angle = PI * rng.gen::<f64>();
        let label = if rng.gen::<f64>() > 0.5 { 1 } else { 0 };
        let r = jitter(1., noise, rng);

        let (cos, sin) = (angle.cos() * r, angle.sin() * r);
        if label == 0 {
            x.push([cos, sin]);
        } else {
            x.push([1. - cos, 1. - sin - 0.5]);
        }
        y.push(label);
    }

    (x, Labels::Classes(y))
}

/// Inner ring (radius 0.5) for the first half, outer ring (radius 1) after.
fn circles<R: Rng + ?Sized>(n: usize, noise: f64, rng: &mut R) -> (Vec<[f64; 2]>, Labels) {
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);

    for i in 0..n {
        let label = if (i as f64) < n as f64 / 2. { 0 } else { 1 };
        let radius = if label == 0 { 0.5 } else { 1. };
        let angle = rng.gen::<f64>() * 2. * PI;
        let r = jitter(radius, noise, rng);

        x.push([r * angle.cos(), r * angle.sin()]);
        y.push(label);
    }

    (x, Labels::Classes(y))
}

fn linear<R: Rng + ?Sized>(n: usize, rng: &mut R) -> (Vec<[f64; 2]>, Labels) {
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);

    for _ in 0..n {
        let v = rng.gen::<f64>() * 2. - 1.;
        let noise = (rng.gen::<f64>() - 0.5) * 0.1;
        // second slot unused, the dataset is one feature wide
        x.push([v, 0.]);
        y.push(0.8 * v + 0.3 + noise);
    }

    (x, Labels::Values(y))
}

/// Three overlapping square blobs, balanced. Not the real Iris measurements.
fn iris<R: Rng + ?Sized>(n: usize, rng: &mut R) -> (Vec<[f64; 2]>, Labels) {
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);

    for i in 0..n {
        let class = (i * 3 / n).min(2);
        let x1 = rng.gen::<f64>() * 2. + class as f64 * 0.5;
        let x2 = rng.gen::<f64>() * 2. + (2 - class) as f64 * 0.5;
        x.push([x1, x2]);
        y.push(class);
    }

    (x, Labels::Classes(y))
}
