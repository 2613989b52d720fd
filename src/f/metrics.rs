use ndarray::{Array2, Axis};

use super::argmax;

/// Fraction of rows predicted correctly, in `[0, 1]`.
///
/// A single output column is read as a probability thresholded at 0.5, wider
/// outputs are compared by arg-max against one-hot targets.
pub fn accuracy(pred: &Array2<f64>, target: &Array2<f64>) -> f64 {
    let rows = pred.nrows();
    if rows == 0 {
        return 0.;
    }

    let correct = if pred.ncols() == 1 {
        pred.iter()
            .zip(target.iter())
            .filter(|(p, t)| (**p > 0.5) == (**t > 0.5))
            .count()
    } else {
        pred.axis_iter(Axis(0))
            .zip(target.axis_iter(Axis(0)))
            .filter(|(p, t)| argmax(p.view()) == argmax(t.view()))
            .count()
    };

    correct as f64 / rows as f64
}
