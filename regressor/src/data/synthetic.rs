use std::num::NonZeroUsize;

use machine_learning::dataset::Dataset;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;

use crate::{RegressorErr, Result};

/// A known function of a single variable the synthetic samples are drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve {
    /// `sin(x) + sin(10/3 x)`, seen through the powers `x, x², ...` up to `features`.
    Sine { features: NonZeroUsize },
    /// `slope · x + intercept`, seen through `x` alone.
    Linear { slope: f32, intercept: f32 },
}

impl Curve {
    /// The noise free target at `x`.
    pub fn target(&self, x: f32) -> f32 {
        match *self {
            Curve::Sine { .. } => x.sin() + (10. / 3. * x).sin(),
            Curve::Linear { slope, intercept } => slope * x + intercept,
        }
    }

    /// Builds the feature matrix for the given `x` values, one row per value.
    pub fn features(&self, x: ArrayView1<f32>) -> Array2<f32> {
        match *self {
            Curve::Sine { features } => powers(x, features),
            Curve::Linear { .. } => x.to_owned().insert_axis(Axis(1)),
        }
    }

    /// Samples the curve at `points` evenly spaced values over `[low, high]`, adding uniform
    /// noise in `[-noise, noise]` to every target.
    ///
    /// # Errors
    /// Returns a `RegressorErr` if the noise amplitude isn't a valid distribution bound.
    pub fn sample<R: Rng>(
        &self,
        points: NonZeroUsize,
        low: f32,
        high: f32,
        noise: f32,
        rng: &mut R,
    ) -> Result<Dataset> {
        let x = Array1::linspace(low, high, points.get());
        let mut y = x.mapv(|x| self.target(x));

        if noise > 0. {
            let dist = Uniform::new_inclusive(-noise, noise)
                .map_err(|e| RegressorErr::invalid_config(format!("noise {noise}: {e}")))?;
            y += &Array1::random_using(points.get(), dist, rng);
        }

        let x = self.features(x.view());
        let y = y.insert_axis(Axis(1));
        Ok(Dataset::from_parts(x.view(), y.view())?)
    }
}

/// Column `k` holds `x^(k + 1)`.
fn powers(x: ArrayView1<f32>, degree: NonZeroUsize) -> Array2<f32> {
    Array2::from_shape_fn((x.len(), degree.get()), |(i, k)| x[i].powi(k as i32 + 1))
}
