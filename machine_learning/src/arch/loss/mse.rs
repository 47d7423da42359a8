use ndarray::{Array2, ArrayView2};

use super::{LossFn, loss_fn::check_shapes};
use crate::Result;

/// Mean squared error loss function.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mse;

impl Mse {
    /// Returns a new `Mse`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Mse {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32> {
        check_shapes(&y_pred, &y)?;

        let loss = (&y_pred - &y)
            .mapv(|x| x.powi(2))
            .mean()
            .unwrap_or_default();

        Ok(loss)
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>> {
        check_shapes(&y_pred, &y)?;

        let n = y_pred.len().max(1) as f32;
        Ok((&y_pred - &y) * (2.0 / n))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::MlErr;

    #[test]
    fn loss_is_the_mean_of_squared_errors() {
        let y_pred = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![[1.0, 0.0], [0.0, 4.0]];

        let loss = Mse.loss(y_pred.view(), y.view()).unwrap();
        assert_eq!(loss, (4.0 + 9.0) / 4.0);
    }

    #[test]
    fn loss_prime_scales_the_residual() {
        let y_pred = array![[2.0], [0.0]];
        let y = array![[1.0], [1.0]];

        let d = Mse.loss_prime(y_pred.view(), y.view()).unwrap();
        assert_eq!(d, array![[1.0], [-1.0]]);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let y_pred = array![[1.0, 2.0]];
        let y = array![[1.0], [2.0]];

        let err = Mse.loss(y_pred.view(), y.view()).unwrap_err();
        assert_eq!(err, MlErr::size_mismatch("prediction rows", 1, 2));
        assert!(Mse.loss_prime(y_pred.view(), y.view()).is_err());
    }

    #[test]
    fn perfect_predictions_have_zero_loss() {
        let y = array![[0.5], [-1.5], [3.0]];
        assert_eq!(Mse.loss(y.view(), y.view()).unwrap(), 0.0);
    }
}
