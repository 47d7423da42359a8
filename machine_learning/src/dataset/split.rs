use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::Dataset;
use crate::{MlErr, Result};

const RATIO_TOLERANCE: f64 = 1e-6;

/// The fractions of a dataset that go to each partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.7,
            validation: 0.15,
            test: 0.15,
        }
    }
}

impl SplitRatios {
    /// Checks that every ratio is a finite non-negative number and that they add up to one.
    pub fn validate(&self) -> Result<()> {
        let ratios = [self.train, self.validation, self.test];

        if ratios.iter().any(|r| !r.is_finite() || *r < 0.) {
            return Err(MlErr::InvalidSplit(format!(
                "ratios must be finite and non-negative, got {self:?}"
            )));
        }

        let total: f64 = ratios.iter().sum();
        if (total - 1.).abs() > RATIO_TOLERANCE {
            return Err(MlErr::InvalidSplit(format!(
                "ratios must add up to 1, they add up to {total}"
            )));
        }

        Ok(())
    }

    /// Returns the amount of samples of the train, validation and test partitions of a
    /// dataset of `len` samples. The test partition takes whatever the rounding leaves.
    pub fn sizes(&self, len: usize) -> (usize, usize, usize) {
        let train = ((len as f64) * self.train).floor() as usize;
        let validation = (((len as f64) * self.validation).floor() as usize).min(len - train);
        (train, validation, len - train - validation)
    }
}

/// The three disjoint partitions of a dataset.
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Dataset,
    pub validation: Dataset,
    pub test: Dataset,
}

impl Dataset {
    /// Randomly partitions the dataset into train, validation and test sets.
    ///
    /// # Arguments
    /// * `ratios` - The fraction of samples of each partition.
    /// * `rng` - The random number generator used to permute the samples.
    ///
    /// # Returns
    /// The partitions, or an error if the ratios are invalid or they leave the train or
    /// validation partitions empty. The test partition may be empty.
    pub fn split<R: Rng>(&self, ratios: SplitRatios, rng: &mut R) -> Result<Split> {
        ratios.validate()?;

        let (train_len, validation_len, _) = ratios.sizes(self.len());

        if train_len == 0 || validation_len == 0 {
            return Err(MlErr::InvalidSplit(format!(
                "{} samples leave {train_len} for training and {validation_len} for validation",
                self.len()
            )));
        }

        let mut indices: Vec<_> = (0..self.len()).collect();
        indices.shuffle(rng);

        let (train, rest) = indices.split_at(train_len);
        let (validation, test) = rest.split_at(validation_len);

        Ok(Split {
            train: self.select(train)?,
            validation: self.select(validation)?,
            test: self.select(test)?,
        })
    }
}
