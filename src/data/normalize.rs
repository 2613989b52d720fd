use ndarray::{Array1, Array2, Axis};

use crate::{Error, Result};

/// Smallest standard deviation ever used as a divisor.
pub const STD_FLOOR: f64 = 1e-6;

/// Per-feature mean and population standard deviation of a sample set.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl Stats {
    pub fn fit(features: &Array2<f64>) -> Result<Stats> {
        let mean = features.mean_axis(Axis(0)).ok_or(Error::EmptyDataset)?;
        let std = features.std_axis(Axis(0), 0.);
        Ok(Stats { mean, std })
    }

    /// `(x - mean) / max(std, STD_FLOOR)` per column.
    pub fn apply(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        if features.ncols() != self.mean.len() {
            return Err(Error::Shape(format!(
                "stats cover {} features, got {}",
                self.mean.len(),
                features.ncols()
            )));
        }

        let divisor = self.std.mapv(|s| s.max(STD_FLOOR));
        Ok((features - &self.mean) / &divisor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn scaled_columns_are_standard(
            rows in prop::collection::vec((-100f64..100., -5f64..5.), 2..200)
        ) {
            let x = Array2::from_shape_fn((rows.len(), 2), |(i, j)| if j == 0 { rows[i].0 } else { rows[i].1 });
            let stats = Stats::fit(&x).unwrap();
            let scaled = stats.apply(&x).unwrap();
            let again = Stats::fit(&scaled).unwrap();

            prop_assert!(scaled.iter().all(|v| v.is_finite()));
            for j in 0..2 {
                if stats.std[j] > 1e-3 {
                    prop_assert!(again.mean[j].abs() < 1e-9);
                    prop_assert!((again.std[j] - 1.).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn constant_column_stays_finite() {
        let x = array![[1., 4.], [2., 4.], [3., 4.]];
        let stats = Stats::fit(&x).unwrap();
        assert_eq!(stats.std[1], 0.);

        let scaled = stats.apply(&x).unwrap();
        assert!(scaled.iter().all(|v| v.is_finite()));
        assert!(scaled.column(1).iter().all(|v| *v == 0.));

        let off = stats.apply(&array![[2., 5.]]).unwrap();
        assert_eq!(off[[0, 1]], 1. / STD_FLOOR);
    }

    #[test]
    fn population_std() {
        let stats = Stats::fit(&array![[0.], [2.]]).unwrap();
        assert_eq!(stats.mean, array![1.]);
        assert_eq!(stats.std, array![1.]);
    }

    #[test]
    fn empty_and_mismatched() {
        assert!(matches!(Stats::fit(&Array2::zeros((0, 2))), Err(Error::EmptyDataset)));
        let stats = Stats::fit(&array![[1., 2.]]).unwrap();
        assert!(stats.apply(&array![[1.]]).is_err());
    }
}
