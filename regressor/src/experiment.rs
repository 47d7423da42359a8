use std::path::PathBuf;

use log::{debug, info};
use machine_learning::{
    arch::loss::{LossFn, Mse},
    dataset::{Dataset, StandardScaler},
    training::{LossHistory, Trainer, TrainerBuilder},
};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;

use crate::{
    Result,
    config::{Adapter, ExperimentConfig, ExtrapolationConfig},
    data::{self, Curve},
};

/// Where the reports go when neither the command line nor the config names a directory.
pub const DEFAULT_OUTPUT_DIR: &str = "out";

/// A configured experiment, ready to run.
pub struct Experiment {
    config: ExperimentConfig,
}

/// Everything an experiment produced, targets in their original units.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub history: LossHistory,
    pub params: Vec<f32>,
    /// The test targets and their predictions, one row per test sample.
    pub test: TestReport,
    pub extrapolation: Option<Extrapolation>,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestReport {
    pub truth: Array2<f32>,
    pub prediction: Array2<f32>,
}

/// The trained model evaluated on an evenly spaced grid of `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Extrapolation {
    pub x: Array1<f32>,
    pub truth: Array1<f32>,
    pub prediction: Array1<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub seed: u64,
    pub features: Vec<String>,
    pub samples: usize,
    pub train_samples: usize,
    pub validation_samples: usize,
    pub test_samples: usize,
    pub parameters: usize,
    pub epochs: usize,
    pub final_train_loss: Option<f32>,
    pub final_validation_loss: Option<f32>,
    /// `None` when the test partition is empty.
    pub test_mse: Option<f32>,
    pub test_rmse: Option<f32>,
}

impl Experiment {
    pub fn new(config: ExperimentConfig) -> Self {
        Self { config }
    }

    /// The directory the reports should be written to.
    pub fn output_dir(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| self.config.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    /// Produces the samples, partitions and scales them, trains the regressor and evaluates it
    /// on the test partition and the extrapolation grid.
    ///
    /// Every random draw comes from a single generator, seeded from the config or from the OS
    /// when the config has no seed.
    ///
    /// # Errors
    /// Returns a `RegressorErr` if the data can't be produced or doesn't fit the trainer.
    pub fn run(&self) -> Result<Outcome> {
        let config = &self.config;

        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::rng().random::<u64>();
                info!(seed = seed; "no seed configured, drew one");
                seed
            }
        };

        let mut rng = StdRng::seed_from_u64(seed);
        let samples = data::load(&config.dataset, &mut rng)?;
        let split = samples.dataset.split(config.split, &mut rng)?;

        info!(
            "split {} samples into {} train, {} validation and {} test",
            samples.dataset.len(),
            split.train.len(),
            split.validation.len(),
            split.test.len()
        );

        let scaling = Scaling::fit(config.scale, &split.train)?;
        let train = scaling.apply(&split.train)?;
        let validation = scaling.apply(&split.validation)?;

        let spec = Adapter::new().adapt_trainer(
            &config.trainer,
            train.x_size(),
            train.y_size(),
            Some(rng.random()),
        );

        let (mut trainer, mut params) = TrainerBuilder::new().build(&spec)?;
        let history = trainer.run(&mut params, &train, &validation, spec.epochs)?;

        if let Some((train_loss, validation_loss)) = history.last() {
            info!("finished training: train={train_loss:.6} validation={validation_loss:.6}");
        }

        let test = TestReport {
            truth: split.test.y().to_owned(),
            prediction: scaling.predict(trainer.as_ref(), &params, split.test.x())?,
        };

        let test_mse = match split.test.is_empty() {
            true => None,
            false => Some(Mse.loss(test.prediction.view(), test.truth.view())?),
        };

        if let Some(mse) = test_mse {
            info!("test mse={mse:.6} rmse={:.6}", mse.sqrt());
        }

        let extrapolation = match (config.extrapolation, samples.curve) {
            (Some(grid), Some(curve)) => {
                Some(extrapolate(&grid, curve, &scaling, trainer.as_ref(), &params)?)
            }
            _ => None,
        };

        let summary = Summary {
            seed,
            features: samples.features,
            samples: samples.dataset.len(),
            train_samples: split.train.len(),
            validation_samples: split.validation.len(),
            test_samples: split.test.len(),
            parameters: params.len(),
            epochs: history.len(),
            final_train_loss: history.last().map(|(train, _)| train),
            final_validation_loss: history.last().map(|(_, validation)| validation),
            test_mse,
            test_rmse: test_mse.map(f32::sqrt),
        };

        Ok(Outcome {
            history,
            params,
            test,
            extrapolation,
            summary,
        })
    }
}

fn extrapolate(
    grid: &ExtrapolationConfig,
    curve: Curve,
    scaling: &Scaling,
    trainer: &dyn Trainer,
    params: &[f32],
) -> Result<Extrapolation> {
    let x = Array1::linspace(grid.low, grid.high, grid.points.get());
    let features = curve.features(x.view());
    let prediction = scaling
        .predict(trainer, params, features.view())?
        .index_axis_move(Axis(1), 0);

    debug!("extrapolated over {} points", x.len());

    Ok(Extrapolation {
        truth: x.mapv(|x| curve.target(x)),
        x,
        prediction,
    })
}

/// Feature and target standardization fitted on the training partition, or the identity.
struct Scaling {
    scalers: Option<(StandardScaler, StandardScaler)>,
}

impl Scaling {
    fn fit(enabled: bool, train: &Dataset) -> Result<Self> {
        let scalers = match enabled {
            true => Some((
                StandardScaler::fit(train.x())?,
                StandardScaler::fit(train.y())?,
            )),
            false => None,
        };

        Ok(Self { scalers })
    }

    fn apply(&self, dataset: &Dataset) -> Result<Dataset> {
        let Some((x_scaler, y_scaler)) = &self.scalers else {
            return Ok(dataset.clone());
        };

        let x = x_scaler.transform(dataset.x())?;
        let y = y_scaler.transform(dataset.y())?;
        Ok(Dataset::from_parts(x.view(), y.view())?)
    }

    /// Runs the model on raw features and returns targets in their original units.
    fn predict(
        &self,
        trainer: &dyn Trainer,
        params: &[f32],
        x: ArrayView2<f32>,
    ) -> Result<Array2<f32>> {
        let Some((x_scaler, y_scaler)) = &self.scalers else {
            return Ok(trainer.predict(params, x)?);
        };

        let x = x_scaler.transform(x)?;
        let y = trainer.predict(params, x.view())?;
        Ok(y_scaler.inverse_transform(y.view())?)
    }
}
