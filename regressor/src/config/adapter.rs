use machine_learning::training::{ModelSpec, OptimizerSpec, TrainerSpec};

use super::{DatasetConfig, ExperimentConfig, ExtrapolationConfig, TrainerConfig};
use crate::{RegressorErr, Result};

/// Validates experiment configs and turns them into the specs the training library expects.
#[derive(Default)]
pub struct Adapter;

impl Adapter {
    pub fn new() -> Self {
        Self
    }

    /// Builds the `TrainerSpec` for a dataset of `input_size` features and `output_size`
    /// targets.
    pub fn adapt_trainer(
        &self,
        trainer: &TrainerConfig,
        input_size: usize,
        output_size: usize,
        seed: Option<u64>,
    ) -> TrainerSpec {
        TrainerSpec {
            model: ModelSpec {
                input_size,
                output_size,
                hidden_size: trainer.hidden_size,
                hidden_layers: trainer.hidden_layers,
                act_fn: trainer.act_fn,
            },
            optimizer: trainer.optimizer,
            learning_rate: trainer.learning_rate,
            loss: trainer.loss,
            init: trainer.init,
            epochs: trainer.epochs,
            batch_size: trainer.batch_size,
            shuffle: trainer.shuffle,
            log_every: trainer.log_every,
            seed,
        }
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Rejects configs that would fail halfway through the experiment.
    pub fn validate(&self, config: &ExperimentConfig) -> Result<()> {
        self.validate_dataset(&config.dataset)?;
        config.split.validate()?;
        self.validate_trainer(&config.trainer)?;

        if let Some(extrapolation) = &config.extrapolation {
            if !config.dataset.is_synthetic() {
                return Err(RegressorErr::invalid_config(
                    "extrapolation needs a sine or linear dataset",
                ));
            }

            self.validate_extrapolation(extrapolation)?;
        }

        Ok(())
    }

    fn validate_dataset(&self, dataset: &DatasetConfig) -> Result<()> {
        match dataset {
            DatasetConfig::Sine {
                low, high, noise, ..
            } => {
                check_interval("dataset", *low, *high)?;

                if !noise.is_finite() || *noise < 0. {
                    return Err(RegressorErr::invalid_config(format!(
                        "dataset noise must be finite and non-negative, got {noise}"
                    )));
                }
            }
            DatasetConfig::Linear {
                low,
                high,
                slope,
                intercept,
                ..
            } => {
                check_interval("dataset", *low, *high)?;

                if !slope.is_finite() || !intercept.is_finite() {
                    return Err(RegressorErr::invalid_config(
                        "slope and intercept must be finite",
                    ));
                }
            }
            DatasetConfig::Csv {
                target, features, ..
            } => {
                if target.is_empty() {
                    return Err(RegressorErr::invalid_config("target column name is empty"));
                }

                if let Some(features) = features {
                    if features.is_empty() {
                        return Err(RegressorErr::invalid_config(
                            "features must list at least one column",
                        ));
                    }

                    if features.contains(target) {
                        return Err(RegressorErr::invalid_config(format!(
                            "target column '{target}' is also listed as a feature"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn validate_trainer(&self, trainer: &TrainerConfig) -> Result<()> {
        let lr = trainer.learning_rate;
        if !lr.is_finite() || lr < 0. {
            return Err(RegressorErr::invalid_config(format!(
                "learning_rate must be finite and non-negative, got {lr}"
            )));
        }

        if let OptimizerSpec::GradientDescentWithMomentum { momentum } = trainer.optimizer {
            if !(0. ..1.).contains(&momentum) {
                return Err(RegressorErr::invalid_config(format!(
                    "momentum must be in [0, 1), got {momentum}"
                )));
            }
        }

        if let OptimizerSpec::Adam {
            beta1,
            beta2,
            epsilon,
        } = trainer.optimizer
        {
            for (name, beta) in [("beta1", beta1), ("beta2", beta2)] {
                if !(0. ..1.).contains(&beta) {
                    return Err(RegressorErr::invalid_config(format!(
                        "{name} must be in [0, 1), got {beta}"
                    )));
                }
            }

            if !epsilon.is_finite() || epsilon <= 0. {
                return Err(RegressorErr::invalid_config(format!(
                    "epsilon must be finite and positive, got {epsilon}"
                )));
            }
        }

        Ok(())
    }

    fn validate_extrapolation(&self, extrapolation: &ExtrapolationConfig) -> Result<()> {
        check_interval("extrapolation", extrapolation.low, extrapolation.high)
    }
}

fn check_interval(what: &str, low: f32, high: f32) -> Result<()> {
    if !low.is_finite() || !high.is_finite() || low >= high {
        return Err(RegressorErr::invalid_config(format!(
            "{what} interval [{low}, {high}] is empty or not finite"
        )));
    }

    Ok(())
}
