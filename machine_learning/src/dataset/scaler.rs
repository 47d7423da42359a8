use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::{MlErr, Result};

/// Standardizes every column to zero mean and unit variance, using statistics fitted once.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f32>,
    scale: Array1<f32>,
}

impl StandardScaler {
    /// Fits the per-column mean and population standard deviation of `x`. Constant columns
    /// get a scale of one.
    ///
    /// # Returns
    /// A new `StandardScaler` or an error if `x` has no rows.
    pub fn fit(x: ArrayView2<f32>) -> Result<Self> {
        let mean = x
            .mean_axis(Axis(0))
            .ok_or(MlErr::EmptyDataset { what: "scaler" })?;

        let scale = x
            .std_axis(Axis(0), 0.)
            .mapv_into(|s| if s > f32::EPSILON { s } else { 1. });

        Ok(Self { mean, scale })
    }

    pub fn mean(&self) -> &Array1<f32> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f32> {
        &self.scale
    }

    /// Maps `x` into standardized units.
    pub fn transform(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_width(&x)?;
        Ok((&x - &self.mean) / &self.scale)
    }

    /// Maps standardized values back into the original units.
    pub fn inverse_transform(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_width(&x)?;
        Ok(&x * &self.scale + &self.mean)
    }

    fn check_width(&self, x: &ArrayView2<f32>) -> Result<()> {
        if x.ncols() != self.mean.len() {
            return Err(MlErr::size_mismatch("scaler columns", x.ncols(), self.mean.len()));
        }

        Ok(())
    }
}
