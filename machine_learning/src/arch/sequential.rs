use ndarray::{Array2, ArrayView2};

use super::{Model, Tape, activations::ActFn, layers::Dense};
use crate::{MlErr, Result};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequential {
    layers: Vec<Dense>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance or an error if there are no layers or two adjacent layers
    /// disagree on their sizes.
    pub fn new<I>(layers: I) -> Result<Self>
    where
        I: IntoIterator<Item = Dense>,
    {
        let layers: Vec<_> = layers.into_iter().collect();

        if layers.is_empty() {
            return Err(MlErr::invalid_hyperparameter(
                "layers",
                "a model needs at least one layer",
            ));
        }

        for pair in layers.windows(2) {
            let (_, m) = pair[0].dim();
            let (n, _) = pair[1].dim();

            if m != n {
                return Err(MlErr::size_mismatch("adjacent layers", n, m));
            }
        }

        Ok(Self { layers })
    }

    /// Builds a multilayer perceptron: `hidden_layers` dense layers of width `hidden_size`
    /// followed by the activation, and a linear output layer.
    ///
    /// # Arguments
    /// * `input_size` - The amount of features of each sample.
    /// * `hidden_size` - The amount of units per hidden layer.
    /// * `hidden_layers` - The amount of hidden layers, zero gives a linear model.
    /// * `output_size` - The amount of targets of each sample.
    /// * `act_fn` - The activation of the hidden layers.
    pub fn mlp(
        input_size: usize,
        hidden_size: usize,
        hidden_layers: usize,
        output_size: usize,
        act_fn: Option<ActFn>,
    ) -> Result<Self> {
        let mut layers = Vec::with_capacity(hidden_layers + 1);
        let mut fan_in = input_size;

        for _ in 0..hidden_layers {
            layers.push(Dense::new((fan_in, hidden_size), act_fn));
            fan_in = hidden_size;
        }

        layers.push(Dense::new((fan_in, output_size), None));
        Self::new(layers)
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    fn check_params(&self, params: &[f32]) -> Result<()> {
        let size = self.size();

        if params.len() != size {
            return Err(MlErr::size_mismatch("model parameters", params.len(), size));
        }

        Ok(())
    }
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.layers.iter().map(|layer| layer.size()).sum()
    }

    fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.dim().0)
    }

    fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.dim().1)
    }

    fn forward(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_params(params)?;

        let mut rest = params;
        let mut a = x.to_owned();

        for layer in &self.layers {
            let (head, tail) = rest.split_at(layer.size());
            a = layer.forward(head, a.view())?;
            rest = tail;
        }

        Ok(a)
    }

    fn forward_taped(&self, params: &[f32], x: ArrayView2<f32>) -> Result<(Array2<f32>, Tape)> {
        self.check_params(params)?;

        let mut tape = Tape::with_capacity(self.layers.len());
        let mut rest = params;
        let mut a = x.to_owned();

        for layer in &self.layers {
            let (head, tail) = rest.split_at(layer.size());
            let (next, layer_tape) = layer.forward_taped(head, a.view())?;
            tape.push(layer_tape);
            a = next;
            rest = tail;
        }

        Ok((a, tape))
    }

    fn backward(
        &self,
        params: &[f32],
        tape: &Tape,
        mut d: Array2<f32>,
        grad: &mut [f32],
    ) -> Result<()> {
        self.check_params(params)?;

        if grad.len() != params.len() {
            return Err(MlErr::size_mismatch("gradient", grad.len(), params.len()));
        }

        if tape.len() != self.layers.len() {
            return Err(MlErr::size_mismatch("tape", tape.len(), self.layers.len()));
        }

        let mut end = params.len();

        for (layer, layer_tape) in self.layers.iter().zip(tape.layers()).rev() {
            let start = end - layer.size();
            d = layer.backward(&params[start..end], &mut grad[start..end], layer_tape, d)?;
            end = start;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::{
        arch::loss::{LossFn, Mse},
        optimization::GradientDescent,
    };

    fn params_for(model: &Sequential) -> Vec<f32> {
        (0..model.size())
            .map(|i| ((i as f32 * 0.37).sin()) * 0.5)
            .collect()
    }

    #[test]
    fn mlp_has_the_expected_shape() {
        let model = Sequential::mlp(2, 4, 2, 1, Some(ActFn::relu())).unwrap();

        assert_eq!(model.layers().len(), 3);
        assert_eq!(model.input_size(), 2);
        assert_eq!(model.output_size(), 1);
        assert_eq!(model.size(), (2 + 1) * 4 + (4 + 1) * 4 + (4 + 1));
        assert_eq!(model.layers()[2].act_fn(), None);
    }

    #[test]
    fn incompatible_layers_are_rejected() {
        let layers = [Dense::new((2, 3), None), Dense::new((4, 1), None)];
        let err = Sequential::new(layers).unwrap_err();
        assert_eq!(err, MlErr::size_mismatch("adjacent layers", 4, 3));
    }

    #[test]
    fn an_empty_model_is_rejected() {
        assert!(Sequential::new(Vec::<Dense>::new()).is_err());
    }

    #[test]
    fn wrong_parameter_count_is_rejected() {
        let model = Sequential::mlp(1, 2, 1, 1, None).unwrap();
        let x = array![[1.0]];

        let err = model.forward(&[0.0; 3], x.view()).unwrap_err();
        assert_eq!(err, MlErr::size_mismatch("model parameters", 3, model.size()));
    }

    #[test]
    fn backward_matches_finite_differences() {
        const EPS: f32 = 1e-2;

        let model = Sequential::mlp(2, 3, 2, 1, Some(ActFn::tanh())).unwrap();
        let params = params_for(&model);
        let x = array![[0.5, -1.0], [1.0, 2.0], [-0.5, 0.25], [0.0, 1.0]];
        let y = array![[1.0], [-1.0], [0.5], [0.0]];

        let loss = |p: &[f32]| {
            let y_pred = model.forward(p, x.view()).unwrap();
            Mse.loss(y_pred.view(), y.view()).unwrap()
        };

        let (y_pred, tape) = model.forward_taped(&params, x.view()).unwrap();
        let d = Mse.loss_prime(y_pred.view(), y.view()).unwrap();
        let mut grad = vec![0.0; model.size()];
        model.backward(&params, &tape, d, &mut grad).unwrap();

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

    #[test]
    fn evaluate_leaves_parameters_untouched() {
        let model = Sequential::mlp(1, 4, 1, 1, Some(ActFn::sigmoid(1.0))).unwrap();
        let params = params_for(&model);
        let before = params.clone();
        let x = array![[0.1], [0.2], [0.3]];
        let y = array![[1.0], [2.0], [3.0]];

        let first = model.evaluate(&params, &Mse, x.view(), y.view()).unwrap();
        let second = model.evaluate(&params, &Mse, x.view(), y.view()).unwrap();

        assert_eq!(first, second);
        assert_eq!(params, before);
    }

    #[test]
    fn backprop_updates_once_per_batch() {
        let model = Sequential::mlp(1, 2, 1, 1, Some(ActFn::tanh())).unwrap();
        let mut params = params_for(&model);
        let before = params.clone();
        let mut grad = vec![0.0; model.size()];
        let mut optimizer = GradientDescent::new(0.1);

        let x = array![[0.1], [0.2]];
        let y = array![[0.3], [0.5]];
        let batches = std::iter::once((x.view(), y.view()));

        let loss = model
            .backprop(&mut params, &mut grad, &mut optimizer, &Mse, batches)
            .unwrap();

        assert!(loss >= 0.0);
        assert_ne!(params, before);
    }

    #[test]
    fn backprop_without_batches_fails() {
        let model = Sequential::mlp(1, 2, 1, 1, None).unwrap();
        let mut params = params_for(&model);
        let mut grad = vec![0.0; model.size()];
        let mut optimizer = GradientDescent::new(0.1);

        let err = model
            .backprop(
                &mut params,
                &mut grad,
                &mut optimizer,
                &Mse,
                std::iter::empty::<(ArrayView2<f32>, ArrayView2<f32>)>(),
            )
            .unwrap_err();
        assert_eq!(err, MlErr::EmptyDataset { what: "training" });
    }
}
