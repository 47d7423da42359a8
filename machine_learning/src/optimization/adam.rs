use ndarray::{Array1, ArrayView1, ArrayViewMut1, Zip};

use super::{Optimizer, optimizer::check_lens};
use crate::{MlErr, Result};

/// Adam: gradient descent scaled per parameter by bias-corrected running estimates of the
/// gradient's first and second moments.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    steps: i32,
    first_moment: Array1<f32>,
    second_moment: Array1<f32>,
}

impl Adam {
    /// Creates a new `Adam` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `beta1`, `beta2` - Decay rates of the moment estimates, in `[0, 1)`.
    /// * `epsilon` - Positive term keeping the denominator away from zero.
    ///
    /// # Returns
    /// A new `Adam` instance.
    pub fn new(len: usize, learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            steps: 0,
            first_moment: Array1::zeros(len),
            second_moment: Array1::zeros(len),
        }
    }
}

impl Optimizer for Adam {
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_lens(grad, params)?;

        if self.first_moment.len() != params.len() {
            return Err(MlErr::size_mismatch(
                "optimizer state",
                self.first_moment.len(),
                params.len(),
            ));
        }

        self.steps = self.steps.saturating_add(1);

        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let m_correction = 1. - b1.powi(self.steps);
        let v_correction = 1. - b2.powi(self.steps);
        let lr = self.learning_rate;

        Zip::from(ArrayViewMut1::from(params))
            .and(ArrayView1::from(grad))
            .and(&mut self.first_moment)
            .and(&mut self.second_moment)
            .for_each(|p, &g, m, v| {
                *m += (1. - b1) * (g - *m);
                *v += (1. - b2) * (g * g - *v);

                let m_hat = *m / m_correction;
                let v_hat = *v / v_correction;
                *p -= lr * m_hat / (v_hat.sqrt() + eps);
            });

        Ok(())
    }
}
