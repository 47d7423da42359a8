use std::num::NonZeroUsize;

use ndarray::{Array2, ArrayView2};

use super::LossHistory;
use crate::{Result, dataset::Dataset};

/// A type-erased training loop, as handed out by the `TrainerBuilder`.
pub trait Trainer {
    /// Trains the parameters for exactly `epochs` epochs.
    ///
    /// # Arguments
    /// * `params` - The model's parameters, updated in place.
    /// * `train` - The partition the gradients are computed from.
    /// * `validation` - The partition the model is evaluated on after each epoch.
    /// * `epochs` - The amount of epochs to run.
    ///
    /// # Returns
    /// The per epoch training and validation losses.
    fn run(
        &mut self,
        params: &mut [f32],
        train: &Dataset,
        validation: &Dataset,
        epochs: NonZeroUsize,
    ) -> Result<LossHistory>;

    /// Measures the loss of the model over `dataset` without touching the parameters.
    fn validate(&self, params: &[f32], dataset: &Dataset) -> Result<f32>;

    /// Evaluates the model over `x`.
    fn predict(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Returns the amount of parameters of the trained model.
    fn size(&self) -> usize;
}
