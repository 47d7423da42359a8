mod adapter;
mod experiment;

pub use adapter::Adapter;
pub use experiment::{DatasetConfig, ExperimentConfig, ExtrapolationConfig, TrainerConfig};
