use std::num::NonZeroUsize;

use log::{debug, info, warn};
use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{LossHistory, Trainer};
use crate::{
    MlErr, Result,
    arch::{Model, loss::LossFn},
    dataset::Dataset,
    optimization::Optimizer,
};

/// A model `Trainer`. Contains the relevant components needed for training a model,
/// including the model itself.
pub struct ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    model: M,
    optimizer: O,
    loss_fn: L,
    grad: Vec<f32>,

    batch_size: Option<NonZeroUsize>,
    shuffle: bool,
    log_every: usize,
    rng: R,
}

impl<M, O, L, R> ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    /// Returns a new `ModelTrainer`.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained.
    /// * `optimizer` - The optimizer, bound to the model's parameter count.
    /// * `loss_fn` - The loss function used to measure the difference between a model's output and the expected one.
    /// * `batch_size` - The amount of samples per gradient step, `None` for the whole partition.
    /// * `shuffle` - Whether to shuffle the training partition before every epoch.
    /// * `log_every` - The amount of epochs between progress logs, zero disables them.
    /// * `rng` - A random number generator, used for shuffling.
    pub fn new(
        model: M,
        optimizer: O,
        loss_fn: L,
        batch_size: Option<NonZeroUsize>,
        shuffle: bool,
        log_every: usize,
        rng: R,
    ) -> Self {
        Self {
            grad: vec![0.0; model.size()],
            model,
            optimizer,
            loss_fn,
            batch_size,
            shuffle,
            log_every,
            rng,
        }
    }

    /// Performs `epochs` epochs of training its model, using its optimizer, loss function and
    /// batch size, evaluating the validation partition after each one.
    ///
    /// A partition that fits in a single batch is never shuffled. With smaller batches the
    /// summation order changes every epoch, so losses may drift by a few ULPs even with a
    /// zero learning rate.
    ///
    /// # Arguments
    /// * `params` - The model's parameters, updated in place.
    /// * `train` - The training partition.
    /// * `validation` - The validation partition.
    /// * `epochs` - The amount of epochs to run, there's no early stopping.
    ///
    /// # Returns
    /// The loss history or an error if the partitions or the parameters don't fit the model.
    pub fn run(
        &mut self,
        params: &mut [f32],
        train: &Dataset,
        validation: &Dataset,
        epochs: NonZeroUsize,
    ) -> Result<LossHistory> {
        self.check_params(params)?;
        self.check_partition("training", train)?;
        self.check_partition("validation", validation)?;

        let batch_size = match self.batch_size {
            Some(batch_size) => batch_size,
            None => NonZeroUsize::new(train.len()).ok_or(MlErr::EmptyDataset { what: "training" })?,
        };

        let epochs = epochs.get();
        let mut history = LossHistory::with_capacity(epochs);
        let mut train = train.clone();
        let mut diverged = false;

        debug!(
            "training {} parameters over {} samples, batch size {batch_size}",
            params.len(),
            train.len()
        );

        for epoch in 1..=epochs {
            if self.shuffle && batch_size.get() < train.len() {
                train.shuffle(&mut self.rng);
            }

            let train_loss = self.model.backprop(
                params,
                &mut self.grad,
                &mut self.optimizer,
                &self.loss_fn,
                train.batches(batch_size),
            )?;

            let validation_loss = self.validate(params, validation)?;
            history.record(train_loss, validation_loss);

            if !diverged && !(train_loss.is_finite() && validation_loss.is_finite()) {
                diverged = true;
                warn!(
                    "loss is no longer finite at epoch {epoch}: train={train_loss} validation={validation_loss}"
                );
            }

            if self.log_every > 0 && (epoch % self.log_every == 0 || epoch == epochs) {
                info!(epoch = epoch; "train={train_loss:.6} validation={validation_loss:.6}");
            }
        }

        Ok(history)
    }

    /// Measures the loss of the model over `dataset` without touching the parameters.
    pub fn validate(&self, params: &[f32], dataset: &Dataset) -> Result<f32> {
        self.check_partition("validation", dataset)?;
        self.model
            .evaluate(params, &self.loss_fn, dataset.x(), dataset.y())
    }

    fn check_params(&self, params: &[f32]) -> Result<()> {
        let size = self.model.size();

        if params.len() != size {
            return Err(MlErr::size_mismatch("model parameters", params.len(), size));
        }

        Ok(())
    }

    fn check_partition(&self, what: &'static str, dataset: &Dataset) -> Result<()> {
        if dataset.is_empty() {
            return Err(MlErr::EmptyDataset { what });
        }

        if dataset.x_size() != self.model.input_size() {
            return Err(MlErr::size_mismatch(
                "dataset features",
                dataset.x_size(),
                self.model.input_size(),
            ));
        }

        if dataset.y_size() != self.model.output_size() {
            return Err(MlErr::size_mismatch(
                "dataset targets",
                dataset.y_size(),
                self.model.output_size(),
            ));
        }

        Ok(())
    }
}

impl<M, O, L, R> Trainer for ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    fn run(
        &mut self,
        params: &mut [f32],
        train: &Dataset,
        validation: &Dataset,
        epochs: NonZeroUsize,
    ) -> Result<LossHistory> {
        ModelTrainer::run(self, params, train, validation, epochs)
    }

    fn validate(&self, params: &[f32], dataset: &Dataset) -> Result<f32> {
        ModelTrainer::validate(self, params, dataset)
    }

    fn predict(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.model.forward(params, x)
    }

    fn size(&self) -> usize {
        self.model.size()
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        arch::{Sequential, activations::ActFn, loss::Mse},
        initialization::ParamGen,
        optimization::GradientDescent,
    };

    fn linear_dataset(n: usize) -> Dataset {
        let data = (0..n)
            .flat_map(|i| {
                let x = i as f32 / n as f32;
                [x, 2. * x + 1.]
            })
            .collect();

        Dataset::new(data, 1, 1).unwrap()
    }

    fn trainer(
        lr: f32,
        batch_size: Option<usize>,
        shuffle: bool,
    ) -> (ModelTrainer<Sequential, GradientDescent, Mse, StdRng>, Vec<f32>) {
        let model = Sequential::mlp(1, 4, 1, 1, Some(ActFn::tanh())).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let params = ParamGen::XavierUniform
            .generate(model.layers(), &mut rng)
            .unwrap();

        let trainer = ModelTrainer::new(
            model,
            GradientDescent::new(lr),
            Mse,
            batch_size.and_then(NonZeroUsize::new),
            shuffle,
            0,
            rng,
        );

        (trainer, params)
    }

    #[test]
    fn histories_have_one_entry_per_epoch() {
        let (mut trainer, mut params) = trainer(0.05, Some(8), true);
        let epochs = NonZeroUsize::new(17).unwrap();

        let history = trainer
            .run(&mut params, &linear_dataset(40), &linear_dataset(10), epochs)
            .unwrap();

        assert_eq!(history.train().len(), 17);
        assert_eq!(history.validation().len(), 17);
        assert!(history.train().iter().all(|&l| l >= 0.));
        assert!(history.validation().iter().all(|&l| l >= 0.));
    }

    #[test]
    fn zero_learning_rate_keeps_the_loss_constant() {
        let (mut trainer, mut params) = trainer(0.0, None, false);
        let before = params.clone();
        let epochs = NonZeroUsize::new(5).unwrap();

        let history = trainer
            .run(&mut params, &linear_dataset(20), &linear_dataset(5), epochs)
            .unwrap();

        assert_eq!(params, before);
        assert!(history.train().windows(2).all(|w| w[0] == w[1]));
        assert!(history.validation().windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn full_batch_shuffle_keeps_a_zero_learning_rate_flat() {
        let (mut trainer, mut params) = trainer(0.0, None, true);
        let epochs = NonZeroUsize::new(8).unwrap();

        let history = trainer
            .run(&mut params, &linear_dataset(37), &linear_dataset(9), epochs)
            .unwrap();

        let first = history.train()[0];
        assert!(history.train().iter().all(|l| l.to_bits() == first.to_bits()));
        let first = history.validation()[0];
        assert!(history.validation().iter().all(|l| l.to_bits() == first.to_bits()));
    }

    #[test]
    fn validation_does_not_touch_the_parameters() {
        let (trainer, params) = trainer(0.1, None, true);
        let before = params.clone();
        let validation = linear_dataset(12);

        let first = trainer.validate(&params, &validation).unwrap();
        let second = trainer.validate(&params, &validation).unwrap();

        assert_eq!(first, second);
        assert_eq!(params, before);
    }

    #[test]
    fn wrong_feature_count_aborts_the_run() {
        let (mut trainer, mut params) = trainer(0.1, None, true);
        let wide = Dataset::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 2, 1).unwrap();
        let epochs = NonZeroUsize::new(3).unwrap();

        let err = trainer
            .run(&mut params, &wide, &linear_dataset(4), epochs)
            .unwrap_err();
        assert_eq!(err, MlErr::size_mismatch("dataset features", 2, 1));
    }

    #[test]
    fn wrong_parameter_count_aborts_the_run() {
        let (mut trainer, _) = trainer(0.1, None, true);
        let mut params = vec![0.0; 3];
        let epochs = NonZeroUsize::new(1).unwrap();

        assert!(
            trainer
                .run(&mut params, &linear_dataset(4), &linear_dataset(4), epochs)
                .is_err()
        );
    }

    #[test]
    fn divergence_is_recorded_not_reported() {
        let (mut trainer, mut params) = trainer(1e6, None, true);
        let epochs = NonZeroUsize::new(30).unwrap();

        let history = trainer
            .run(&mut params, &linear_dataset(20), &linear_dataset(5), epochs)
            .unwrap();

        assert_eq!(history.len(), 30);
    }
}
