use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use machine_learning::{
    dataset::SplitRatios,
    initialization::ParamGen,
    training::{ActFnSpec, LossFnSpec, OptimizerSpec},
};
use serde::{Deserialize, Serialize};

use super::Adapter;
use crate::Result;

/// A whole experiment: where the data comes from, how it's partitioned and how the regressor
/// is trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub split: SplitRatios,
    #[serde(default = "default_true")]
    pub scale: bool,
    pub trainer: TrainerConfig,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub extrapolation: Option<ExtrapolationConfig>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl ExperimentConfig {
    /// Parses and validates an experiment config.
    ///
    /// # Errors
    /// Returns a `RegressorErr` if the JSON is malformed, has unknown fields, or describes an
    /// experiment that can't run.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Adapter::new().validate(&config)?;
        Ok(config)
    }

    /// Reads and validates the experiment config at `path`. A relative CSV path is taken
    /// relative to the config's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let mut config = Self::from_json(&json)?;

        if let (DatasetConfig::Csv { path: csv, .. }, Some(dir)) =
            (&mut config.dataset, path.parent())
        {
            if csv.is_relative() {
                *csv = dir.join(&*csv);
            }
        }

        Ok(config)
    }
}

/// Where the samples come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum DatasetConfig {
    /// `y = sin(x) + sin(10/3 x)` plus uniform noise in `[-noise, noise]`, sampled at `points`
    /// evenly spaced `x` over `[low, high]`. The features are the powers `x, x², ...` up to
    /// `features`.
    Sine {
        points: NonZeroUsize,
        low: f32,
        high: f32,
        #[serde(default)]
        noise: f32,
        #[serde(default = "default_features")]
        features: NonZeroUsize,
    },
    /// `y = slope · x + intercept` without noise.
    Linear {
        points: NonZeroUsize,
        low: f32,
        high: f32,
        slope: f32,
        intercept: f32,
    },
    /// A CSV file with a header row. Every column but `target` is a feature unless `features`
    /// lists them.
    Csv {
        path: PathBuf,
        target: String,
        #[serde(default)]
        features: Option<Vec<String>>,
    },
}

impl DatasetConfig {
    /// Whether the targets come from a known function of `x`.
    pub fn is_synthetic(&self) -> bool {
        !matches!(self, DatasetConfig::Csv { .. })
    }
}

/// The training hyperparameters, the model's input and output sizes are taken from the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainerConfig {
    pub hidden_size: NonZeroUsize,
    #[serde(default = "default_hidden_layers")]
    pub hidden_layers: usize,
    #[serde(default)]
    pub act_fn: ActFnSpec,
    pub learning_rate: f32,
    #[serde(default)]
    pub optimizer: OptimizerSpec,
    #[serde(default)]
    pub loss: LossFnSpec,
    #[serde(default)]
    pub init: ParamGen,
    pub epochs: NonZeroUsize,
    #[serde(default)]
    pub batch_size: Option<NonZeroUsize>,
    #[serde(default = "default_true")]
    pub shuffle: bool,
    #[serde(default = "default_log_every")]
    pub log_every: usize,
}

/// An evenly spaced grid the trained model is evaluated on, it may exceed the sampled interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtrapolationConfig {
    pub low: f32,
    pub high: f32,
    pub points: NonZeroUsize,
}

fn default_true() -> bool {
    true
}

fn default_features() -> NonZeroUsize {
    NonZeroUsize::MIN.saturating_add(1)
}

fn default_hidden_layers() -> usize {
    1
}

fn default_log_every() -> usize {
    100
}
