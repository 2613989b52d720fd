use ndarray::{Array2, ArrayView1, Axis};
use ndarray_stats::QuantileExt;

pub fn argmax(d: ArrayView1<f64>) -> usize {
    let mut max_ix = 0;
    let mut max = f64::NEG_INFINITY;

    for (i, v) in d.iter().enumerate() {
        if *v > max {
            max = *v;
            max_ix = i;
        }
    }

    max_ix
}

/// One-hot rows for `labels`, `size` columns wide. Out of range labels give a zero row.
pub fn onehot(labels: &[usize], size: usize) -> Array2<f64> {
    let mut oh = Array2::zeros((labels.len(), size));
    for (row, label) in labels.iter().enumerate() {
        if *label < size {
            oh[[row, *label]] = 1.;
        }
    }
    oh
}

/// `(min, max)` of every column, ignoring NaNs. An empty column gives NaNs.
pub fn column_bounds(x: &Array2<f64>) -> Vec<(f64, f64)> {
    x.axis_iter(Axis(1))
        .map(|col| (*col.min_skipnan(), *col.max_skipnan()))
        .collect()
}
