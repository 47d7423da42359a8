pub mod csv;
mod synthetic;

use log::info;
use machine_learning::dataset::Dataset;
use rand::Rng;

pub use synthetic::Curve;

use crate::{Result, config::DatasetConfig};

/// The samples of an experiment along with what's known about where they came from.
#[derive(Debug, Clone)]
pub struct Samples {
    pub dataset: Dataset,
    pub features: Vec<String>,
    /// Set only for synthetic datasets.
    pub curve: Option<Curve>,
}

/// Produces the samples described by `config`, drawing any noise from `rng`.
pub fn load<R: Rng>(config: &DatasetConfig, rng: &mut R) -> Result<Samples> {
    let samples = match config {
        DatasetConfig::Sine {
            points,
            low,
            high,
            noise,
            features,
        } => {
            let curve = Curve::Sine {
                features: *features,
            };

            Samples {
                dataset: curve.sample(*points, *low, *high, *noise, rng)?,
                features: (1..=features.get()).map(|k| format!("x^{k}")).collect(),
                curve: Some(curve),
            }
        }
        DatasetConfig::Linear {
            points,
            low,
            high,
            slope,
            intercept,
        } => {
            let curve = Curve::Linear {
                slope: *slope,
                intercept: *intercept,
            };

            Samples {
                dataset: curve.sample(*points, *low, *high, 0., rng)?,
                features: vec!["x".to_string()],
                curve: Some(curve),
            }
        }
        DatasetConfig::Csv {
            path,
            target,
            features,
        } => {
            let (dataset, features) = csv::load(path, target, features.as_deref())?;

            Samples {
                dataset,
                features,
                curve: None,
            }
        }
    };

    info!(
        "loaded {} samples with {} features",
        samples.dataset.len(),
        samples.dataset.x_size()
    );

    Ok(samples)
}
