use super::{Optimizer, optimizer::check_lens};
use crate::Result;

/// Gradient descent optimization algorithm.
#[derive(Debug, Clone)]
pub struct GradientDescent {
    learning_rate: f32,
}

impl GradientDescent {
    /// Creates a new `GradientDescent` optimizer.
    ///
    /// # Arguments
    /// * `learning_rate` - The *length* of the steps taken on `update_params`.
    ///
    /// # Returns
    /// A new `GradientDescent` instance.
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for GradientDescent {
    /// Makes a step in the opposite direction of the gradient, with a length of `learning_rate`.
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_lens(grad, params)?;

        let lr = self.learning_rate;

        for (p, g) in params.iter_mut().zip(grad) {
            *p -= lr * g;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_against_the_gradient() {
        let mut optimizer = GradientDescent::new(0.5);
        let mut params = [1.0, 2.0];

        optimizer.update_params(&[2.0, -4.0], &mut params).unwrap();
        assert_eq!(params, [0.0, 4.0]);
    }

    #[test]
    fn zero_learning_rate_is_a_no_op() {
        let mut optimizer = GradientDescent::new(0.0);
        let mut params = [1.0, 2.0];

        optimizer.update_params(&[10.0, -10.0], &mut params).unwrap();
        assert_eq!(params, [1.0, 2.0]);
    }

    #[test]
    fn mismatched_lengths_fail() {
        let mut optimizer = GradientDescent::new(0.1);
        let mut params = [1.0, 2.0];

        assert!(optimizer.update_params(&[1.0], &mut params).is_err());
    }
}
