use ndarray::{Array1, ArrayView1, ArrayViewMut1, Zip};

use super::{Optimizer, optimizer::check_lens};
use crate::{MlErr, Result};

/// Gradient descent that steps along an exponentially decaying sum of past gradients.
#[derive(Debug, Clone)]
pub struct GradientDescentWithMomentum {
    learning_rate: f32,
    momentum: f32,
    velocity: Array1<f32>,
}

impl GradientDescentWithMomentum {
    /// Creates a new `GradientDescentWithMomentum` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `momentum` - The fraction of the previous velocity kept on every step, in `[0, 1)`.
    ///
    /// # Returns
    /// A new `GradientDescentWithMomentum` instance.
    pub fn new(len: usize, learning_rate: f32, momentum: f32) -> Self {
        Self {
            learning_rate,
            momentum,
            velocity: Array1::zeros(len),
        }
    }
}

impl Optimizer for GradientDescentWithMomentum {
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_lens(grad, params)?;

        if self.velocity.len() != params.len() {
            return Err(MlErr::size_mismatch(
                "optimizer state",
                self.velocity.len(),
                params.len(),
            ));
        }

        // v <- mu * v + g
        self.velocity *= self.momentum;
        self.velocity += &ArrayView1::from(grad);

        ArrayViewMut1::from(params).scaled_add(-self.learning_rate, &self.velocity);
        Ok(())
    }
}
