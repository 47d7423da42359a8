use ndarray::{Array2, ArrayView2};

use crate::{MlErr, Result};

/// A differentiable scalar measure of the error between a prediction and its target.
pub trait LossFn {
    /// Computes the loss of `y_pred` against `y`.
    ///
    /// # Returns
    /// The loss or an error if the shapes of `y_pred` and `y` differ.
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32>;

    /// Computes the derivative of the loss with respect to every element of `y_pred`.
    ///
    /// # Returns
    /// An array shaped like `y_pred` or an error if the shapes of `y_pred` and `y` differ.
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>>;
}

/// Checks that a prediction and its target have the same shape.
pub(super) fn check_shapes(y_pred: &ArrayView2<f32>, y: &ArrayView2<f32>) -> Result<()> {
    if y_pred.nrows() != y.nrows() {
        return Err(MlErr::size_mismatch(
            "prediction rows",
            y_pred.nrows(),
            y.nrows(),
        ));
    }

    if y_pred.ncols() != y.ncols() {
        return Err(MlErr::size_mismatch(
            "prediction columns",
            y_pred.ncols(),
            y.ncols(),
        ));
    }

    Ok(())
}
