use ndarray::Array1;
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

use crate::{MlErr, Result, arch::layers::Dense};

/// How the weights of each dense layer are drawn. Biases always start at zero, except for
/// `Const`, which fills them with the same value as the weights.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamGen {
    Const {
        value: f32,
    },
    Uniform {
        low: f32,
        high: f32,
    },
    Normal {
        mean: f32,
        std_dev: f32,
    },
    #[default]
    XavierUniform,
    Xavier,
    Kaiming,
    LecunUniform,
    Lecun,
}

impl ParamGen {
    /// Generates a full parameter vector for the given layers.
    ///
    /// # Arguments
    /// * `layers` - The layers of the model, in forward order.
    /// * `rng` - The random number generator to sample from.
    ///
    /// # Returns
    /// The parameters laid out layer by layer, weights first, or an error if the
    /// distribution can't be built from the given hyperparameters.
    pub fn generate<R>(&self, layers: &[Dense], rng: &mut R) -> Result<Vec<f32>>
    where
        R: Rng,
    {
        let size = layers.iter().map(Dense::size).sum();
        let mut params = Vec::with_capacity(size);

        for layer in layers {
            let (fan_in, fan_out) = layer.dim();
            let weights = self.weights(fan_in, fan_out, rng)?;
            params.extend(weights);

            let bias = match *self {
                ParamGen::Const { value } => value,
                _ => 0.,
            };
            params.extend(std::iter::repeat_n(bias, fan_out));
        }

        Ok(params)
    }

    fn weights<R>(&self, fan_in: usize, fan_out: usize, rng: &mut R) -> Result<Array1<f32>>
    where
        R: Rng,
    {
        let n = fan_in * fan_out;
        let fan_in_f = fan_in.max(1) as f32;
        let fans = (fan_in + fan_out).max(1) as f32;

        match *self {
            ParamGen::Const { value } => Ok(Array1::from_elem(n, value)),
            ParamGen::Uniform { low, high } => sample(n, uniform(low, high)?, rng),
            ParamGen::Normal { mean, std_dev } => sample(n, normal(mean, std_dev)?, rng),
            ParamGen::XavierUniform => {
                let range = (6. / fans).sqrt();
                sample(n, uniform(-range, range)?, rng)
            }
            ParamGen::Xavier => sample(n, normal(0., (2. / fans).sqrt())?, rng),
            ParamGen::Kaiming => sample(n, normal(0., (2. / fan_in_f).sqrt())?, rng),
            ParamGen::LecunUniform => {
                let range = (3. / fan_in_f).sqrt();
                sample(n, uniform(-range, range)?, rng)
            }
            ParamGen::Lecun => sample(n, normal(0., (1. / fan_in_f).sqrt())?, rng),
        }
    }
}

fn uniform(low: f32, high: f32) -> Result<Uniform<f32>> {
    Uniform::new(low, high).map_err(|e| MlErr::Distribution(format!("uniform [{low}, {high}): {e}")))
}

fn normal(mean: f32, std_dev: f32) -> Result<Normal<f32>> {
    Normal::new(mean, std_dev)
        .map_err(|e| MlErr::Distribution(format!("normal ({mean}, {std_dev}): {e}")))
}

fn sample<D, R>(n: usize, distribution: D, rng: &mut R) -> Result<Array1<f32>>
where
    D: Distribution<f32>,
    R: Rng,
{
    Ok(Array1::random_using(n, distribution, rng))
}
