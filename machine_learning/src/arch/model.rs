use ndarray::{Array2, ArrayView2};

use super::{Tape, loss::LossFn};
use crate::{MlErr, Result, optimization::Optimizer};

/// A differentiable function whose parameters live outside of it, in a flat slice.
pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Returns the width of the model's input.
    fn input_size(&self) -> usize;

    /// Returns the width of the model's output.
    fn output_size(&self) -> usize;

    /// Evaluates the model without recording anything for differentiation.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - The input data, one sample per row.
    fn forward(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Evaluates the model and records the `Tape` needed by `backward`.
    fn forward_taped(&self, params: &[f32], x: ArrayView2<f32>) -> Result<(Array2<f32>, Tape)>;

    /// Computes the gradient of a scalar with respect to every parameter.
    ///
    /// # Arguments
    /// * `params` - The parameters the tape was recorded with.
    /// * `tape` - The tape returned by `forward_taped`.
    /// * `d` - The derivative of the scalar with respect to the model's output.
    /// * `grad` - The buffer the gradient is written to, laid out like `params`.
    fn backward(&self, params: &[f32], tape: &Tape, d: Array2<f32>, grad: &mut [f32])
    -> Result<()>;

    /// Runs one training phase over the provided batches. **`params` gets updated** once per
    /// batch according to the optimization algorithm.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `grad` - A buffer for writing the computed gradient on each batch pass.
    /// * `optimizer` - The optimizer that dictates how to update the weights on each gradient calculation.
    /// * `loss_fn` - The loss function.
    /// * `batches` - The batches of data.
    ///
    /// # Returns
    /// The mean of the batch losses.
    fn backprop<'a, O, L, I>(
        &self,
        params: &mut [f32],
        grad: &mut [f32],
        optimizer: &mut O,
        loss_fn: &L,
        batches: I,
    ) -> Result<f32>
    where
        O: Optimizer,
        L: LossFn,
        I: Iterator<Item = (ArrayView2<'a, f32>, ArrayView2<'a, f32>)>,
    {
        if grad.len() != params.len() {
            return Err(MlErr::size_mismatch("gradient", grad.len(), params.len()));
        }

        // The epoch loss is approximated by averaging the loss of each batch, measured before
        // that batch's update.
        let mut total_loss = 0.0;
        let mut num_batches = 0;

        for (x, y) in batches {
            grad.fill(0.0);

            let (y_pred, tape) = self.forward_taped(params, x)?;
            total_loss += loss_fn.loss(y_pred.view(), y)?;
            num_batches += 1;

            let d = loss_fn.loss_prime(y_pred.view(), y)?;
            self.backward(params, &tape, d, grad)?;

            optimizer.update_params(grad, params)?;
        }

        if num_batches == 0 {
            return Err(MlErr::EmptyDataset { what: "training" });
        }

        Ok(total_loss / num_batches as f32)
    }

    /// Measures the loss of the model over `x` and `y` without touching any parameter.
    fn evaluate<L>(&self, params: &[f32], loss_fn: &L, x: ArrayView2<f32>, y: ArrayView2<f32>)
    -> Result<f32>
    where
        L: LossFn,
    {
        let y_pred = self.forward(params, x)?;
        loss_fn.loss(y_pred.view(), y)
    }
}
