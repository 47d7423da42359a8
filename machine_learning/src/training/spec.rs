use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::initialization::ParamGen;

/// The activation of the hidden layers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFnSpec {
    Sigmoid,
    Tanh,
    #[default]
    Relu,
    Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub input_size: usize,
    pub output_size: usize,
    pub hidden_size: NonZeroUsize,
    pub hidden_layers: usize,
    pub act_fn: ActFnSpec,
}

/// The update rule, the learning rate lives in `TrainerSpec`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizerSpec {
    #[default]
    GradientDescent,
    GradientDescentWithMomentum {
        momentum: f32,
    },
    Adam {
        #[serde(default = "default_beta1")]
        beta1: f32,
        #[serde(default = "default_beta2")]
        beta2: f32,
        #[serde(default = "default_epsilon")]
        epsilon: f32,
    },
}

fn default_beta1() -> f32 {
    0.9
}

fn default_beta2() -> f32 {
    0.999
}

fn default_epsilon() -> f32 {
    1e-8
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossFnSpec {
    #[default]
    Mse,
}

/// Everything needed to build a trainer and the initial parameters of its model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerSpec {
    pub model: ModelSpec,
    pub optimizer: OptimizerSpec,
    pub learning_rate: f32,
    pub loss: LossFnSpec,
    pub init: ParamGen,
    pub epochs: NonZeroUsize,
    pub batch_size: Option<NonZeroUsize>,
    pub shuffle: bool,
    pub log_every: usize,
    pub seed: Option<u64>,
}
