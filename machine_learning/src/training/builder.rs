use log::debug;
use rand::{SeedableRng, rngs::StdRng};

use super::{ActFnSpec, LossFnSpec, ModelSpec, OptimizerSpec, Trainer, TrainerSpec};
use crate::{
    MlErr, Result,
    arch::{
        Model, Sequential,
        activations::ActFn,
        loss::{LossFn, Mse},
    },
    optimization::{Adam, GradientDescent, GradientDescentWithMomentum, Optimizer},
    training::ModelTrainer,
};

/// Builds `Trainer`s given a specification.
#[derive(Default)]
pub struct TrainerBuilder;

impl TrainerBuilder {
    /// Creates a new `TrainerBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new `Trainer` following a spec, along with the initial parameters of its model.
    ///
    /// Both the initial parameters and the shuffling order come from a single generator seeded
    /// with `spec.seed`, so the same spec always yields the same run.
    ///
    /// # Arguments
    /// * `spec` - The specification for the trainer.
    ///
    /// # Returns
    /// The trainer and the parameters, or an error if the spec is invalid.
    pub fn build(&self, spec: &TrainerSpec) -> Result<(Box<dyn Trainer>, Vec<f32>)> {
        self.validate(spec)?;

        let mut rng = self.generate_rng(spec.seed);
        let model = self.resolve_model(&spec.model)?;
        let params = spec.init.generate(model.layers(), &mut rng)?;

        debug!(
            "built a model with {} layers and {} parameters",
            model.layers().len(),
            model.size()
        );

        let trainer = self.resolve_optimizer(spec, model, rng);
        Ok((trainer, params))
    }

    fn validate(&self, spec: &TrainerSpec) -> Result<()> {
        let lr = spec.learning_rate;

        if !lr.is_finite() || lr < 0. {
            return Err(MlErr::invalid_hyperparameter(
                "learning_rate",
                format!("must be finite and non-negative, got {lr}"),
            ));
        }

        if spec.model.input_size == 0 {
            return Err(MlErr::invalid_hyperparameter("input_size", "must be positive"));
        }

        if spec.model.output_size == 0 {
            return Err(MlErr::invalid_hyperparameter("output_size", "must be positive"));
        }

        if let OptimizerSpec::GradientDescentWithMomentum { momentum } = spec.optimizer {
            if !(0. ..1.).contains(&momentum) {
                return Err(MlErr::invalid_hyperparameter(
                    "momentum",
                    format!("must be in [0, 1), got {momentum}"),
                ));
            }
        }

        if let OptimizerSpec::Adam {
            beta1,
            beta2,
            epsilon,
        } = spec.optimizer
        {
            for (name, beta) in [("beta1", beta1), ("beta2", beta2)] {
                if !(0. ..1.).contains(&beta) {
                    return Err(MlErr::invalid_hyperparameter(
                        name,
                        format!("must be in [0, 1), got {beta}"),
                    ));
                }
            }

            if !epsilon.is_finite() || epsilon <= 0. {
                return Err(MlErr::invalid_hyperparameter(
                    "epsilon",
                    format!("must be finite and positive, got {epsilon}"),
                ));
            }
        }

        Ok(())
    }

    fn resolve_model(&self, spec: &ModelSpec) -> Result<Sequential> {
        let act_fn = match spec.act_fn {
            ActFnSpec::Sigmoid => Some(ActFn::sigmoid(1.)),
            ActFnSpec::Tanh => Some(ActFn::tanh()),
            ActFnSpec::Relu => Some(ActFn::relu()),
            ActFnSpec::Identity => None,
        };

        Sequential::mlp(
            spec.input_size,
            spec.hidden_size.get(),
            spec.hidden_layers,
            spec.output_size,
            act_fn,
        )
    }

    fn resolve_optimizer<M>(&self, spec: &TrainerSpec, model: M, rng: StdRng) -> Box<dyn Trainer>
    where
        M: Model + 'static,
    {
        let lr = spec.learning_rate;
        let len = model.size();

        match spec.optimizer {
            OptimizerSpec::GradientDescent => {
                let optimizer = GradientDescent::new(lr);
                self.resolve_loss(spec, model, optimizer, rng)
            }
            OptimizerSpec::GradientDescentWithMomentum { momentum } => {
                let optimizer = GradientDescentWithMomentum::new(len, lr, momentum);
                self.resolve_loss(spec, model, optimizer, rng)
            }
            OptimizerSpec::Adam {
                beta1,
                beta2,
                epsilon,
            } => {
                let optimizer = Adam::new(len, lr, beta1, beta2, epsilon);
                self.resolve_loss(spec, model, optimizer, rng)
            }
        }
    }

    fn resolve_loss<M, O>(
        &self,
        spec: &TrainerSpec,
        model: M,
        optimizer: O,
        rng: StdRng,
    ) -> Box<dyn Trainer>
    where
        M: Model + 'static,
        O: Optimizer + 'static,
    {
        match spec.loss {
            LossFnSpec::Mse => self.terminate_build(spec, model, optimizer, Mse::new(), rng),
        }
    }

    fn terminate_build<M, O, L>(
        &self,
        spec: &TrainerSpec,
        model: M,
        optimizer: O,
        loss_fn: L,
        rng: StdRng,
    ) -> Box<dyn Trainer>
    where
        M: Model + 'static,
        O: Optimizer + 'static,
        L: LossFn + 'static,
    {
        let trainer = ModelTrainer::new(
            model,
            optimizer,
            loss_fn,
            spec.batch_size,
            spec.shuffle,
            spec.log_every,
            rng,
        );

        Box::new(trainer)
    }

    fn generate_rng(&self, seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
