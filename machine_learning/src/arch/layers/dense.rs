use ndarray::{linalg, prelude::*};

use crate::{MlErr, Result, arch::activations::ActFn};

/// What a training-mode forward pass remembers about a dense layer: its input and its
/// pre-activation.
#[derive(Clone, Debug)]
pub struct LayerTape {
    x: Array2<f32>,
    z: Array2<f32>,
}

/// A fully connected layer `a = act_fn(x · w + b)`.
///
/// The layer owns no parameters, it reads them from the slice given on each call. The slice
/// holds `n * m` weights in row-major order (`n` inputs by `m` outputs) followed by `m` biases.
#[derive(Clone, Debug, PartialEq)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    size: usize,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `dim` - The amount of inputs and outputs of the layer.
    /// * `act_fn` - The activation applied to the outputs, `None` for a linear layer.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self {
            dim,
            size: (dim.0 + 1) * dim.1,
            act_fn,
        }
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    pub fn act_fn(&self) -> Option<ActFn> {
        self.act_fn
    }

    /// Computes the layer's output without remembering anything.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `x` - The input, one sample per row.
    ///
    /// # Returns
    /// The activations or an error if `params` or `x` have the wrong size.
    pub fn forward(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let z = self.affine(params, x)?;

        Ok(match self.act_fn {
            Some(act_fn) => z.mapv_into(|z| act_fn.f(z)),
            None => z,
        })
    }

    /// Computes the layer's output and the tape needed to differentiate it.
    pub fn forward_taped(
        &self,
        params: &[f32],
        x: ArrayView2<f32>,
    ) -> Result<(Array2<f32>, LayerTape)> {
        let z = self.affine(params, x)?;

        let a = match self.act_fn {
            Some(act_fn) => z.mapv(|z| act_fn.f(z)),
            None => z.clone(),
        };

        let tape = LayerTape { x: x.to_owned(), z };
        Ok((a, tape))
    }

    /// Writes the gradient of this layer's parameters and propagates the delta backwards.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `grad` - This layer's slice of the gradient, it gets overwritten.
    /// * `tape` - The tape recorded by `forward_taped` for this layer.
    /// * `d` - The derivative of the loss with respect to this layer's output.
    ///
    /// # Returns
    /// The derivative of the loss with respect to this layer's input.
    pub fn backward(
        &self,
        params: &[f32],
        grad: &mut [f32],
        tape: &LayerTape,
        mut d: Array2<f32>,
    ) -> Result<Array2<f32>> {
        if d.dim() != tape.z.dim() {
            return Err(MlErr::size_mismatch("layer delta", d.len(), tape.z.len()));
        }

        if let Some(act_fn) = self.act_fn {
            d.zip_mut_with(&tape.z, |d, &z| *d *= act_fn.df(z));
        }

        let (w, _) = self.view_params(params)?;
        let (mut dw, mut db) = self.view_grad(grad)?;

        linalg::general_mat_mul(1.0, &tape.x.t(), &d, 0.0, &mut dw);
        db.assign(&d.sum_axis(Axis(0)));

        Ok(d.dot(&w.t()))
    }

    fn affine(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(MlErr::size_mismatch("layer input", x.ncols(), self.dim.0));
        }

        let (w, b) = self.view_params(params)?;
        Ok(x.dot(&w) + &b)
    }

    /// Gives a view of the raw gradient slice as the delta weights and delta biases of this layer.
    ///
    /// # Arguments
    /// * `grad` - A gradient slice.
    ///
    /// # Returns
    /// A tuple containing the delta weights and delta biases.
    fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> Result<(ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>)> {
        if grad.len() != self.size {
            return Err(MlErr::size_mismatch("layer gradient", grad.len(), self.size));
        }

        let w_size = self.size - self.dim.1;
        let (dw_raw, db_raw) = grad.split_at_mut(w_size);
        let dw = ArrayViewMut2::from_shape(self.dim, dw_raw)
            .map_err(|_| MlErr::size_mismatch("layer gradient", w_size, self.dim.0 * self.dim.1))?;
        let db = ArrayViewMut1::from(db_raw);
        Ok((dw, db))
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    ///
    /// # Arguments
    /// * `params` - A slice of parameters.
    ///
    /// # Returns
    /// A tuple containing the weights and biases.
    fn view_params<'a>(
        &self,
        params: &'a [f32],
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        if params.len() != self.size {
            return Err(MlErr::size_mismatch("layer parameters", params.len(), self.size));
        }

        let w_size = self.size - self.dim.1;
        let weights = ArrayView2::from_shape(self.dim, &params[..w_size])
            .map_err(|_| MlErr::size_mismatch("layer parameters", w_size, self.dim.0 * self.dim.1))?;
        let biases = ArrayView1::from(&params[w_size..]);
        Ok((weights, biases))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_applies_weights_then_biases() {
        // w = [[1, 2], [3, 4]], b = [0.5, -1]
        let params = [1.0, 2.0, 3.0, 4.0, 0.5, -1.0];
        let dense = Dense::new((2, 2), None);
        let x = array![[1.0, 1.0], [2.0, 0.0]];

        let y = dense.forward(&params, x.view()).unwrap();
        assert_eq!(y, array![[4.5, 5.0], [2.5, 3.0]]);
    }

    #[test]
    fn forward_applies_the_activation() {
        let params = [1.0, -1.0, 0.0, 0.0];
        let dense = Dense::new((1, 2), Some(ActFn::relu()));
        let x = array![[2.0]];

        let y = dense.forward(&params, x.view()).unwrap();
        assert_eq!(y, array![[2.0, 0.0]]);
    }

    #[test]
    fn taped_and_pure_forward_agree() {
        let params = [0.3, -0.7, 0.2, 0.9, 0.1, -0.4, 0.05, 0.0, -0.2];
        let dense = Dense::new((2, 3), Some(ActFn::tanh()));
        let x = array![[0.5, -1.0], [1.5, 2.0]];

        let pure = dense.forward(&params, x.view()).unwrap();
        let (taped, _) = dense.forward_taped(&params, x.view()).unwrap();
        assert_eq!(pure, taped);
    }

    #[test]
    fn wrong_input_width_is_rejected() {
        let dense = Dense::new((3, 1), None);
        let params = [0.0; 4];
        let x = array![[1.0, 2.0]];

        let err = dense.forward(&params, x.view()).unwrap_err();
        assert_eq!(err, MlErr::size_mismatch("layer input", 2, 3));
    }

    #[test]
    fn wrong_parameter_count_is_rejected() {
        let dense = Dense::new((2, 2), None);
        let x = array![[1.0, 2.0]];

        assert!(dense.forward(&[0.0; 5], x.view()).is_err());
    }

    #[test]
    fn backward_matches_finite_differences() {
        const EPS: f32 = 1e-2;

        let dense = Dense::new((2, 2), Some(ActFn::sigmoid(1.0)));
        let params = vec![0.4, -0.3, 0.8, 0.1, -0.2, 0.3];
        let x = array![[0.5, -1.0], [1.0, 2.0], [-0.5, 0.25]];

        // loss = sum of outputs, so the output delta is all ones
        let loss = |p: &[f32]| dense.forward(p, x.view()).unwrap().sum();

        let (a, tape) = dense.forward_taped(&params, x.view()).unwrap();
        let mut grad = vec![0.0; dense.size()];
        let dx = dense
            .backward(&params, &mut grad, &tape, Array2::ones(a.dim()))
            .unwrap();
        assert_eq!(dx.dim(), x.dim());

        for i in 0..params.len() {
            let mut hi = params.clone();
            let mut lo = params.clone();
            hi[i] += EPS;
            lo[i] -= EPS;

            let numeric = (loss(&hi) - loss(&lo)) / (2.0 * EPS);
            assert!(
                (numeric - grad[i]).abs() < 1e-2,
                "param {i}: numeric {numeric}, analytic {}",
                grad[i]
            );
        }
    }
}
