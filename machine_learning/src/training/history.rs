use serde::{Deserialize, Serialize};

/// The learning curve of a training run: one training and one validation loss per epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossHistory {
    train: Vec<f32>,
    validation: Vec<f32>,
}

impl LossHistory {
    pub fn with_capacity(epochs: usize) -> Self {
        Self {
            train: Vec::with_capacity(epochs),
            validation: Vec::with_capacity(epochs),
        }
    }

    /// Appends the losses of one epoch.
    pub fn record(&mut self, train: f32, validation: f32) {
        self.train.push(train);
        self.validation.push(validation);
    }

    pub fn train(&self) -> &[f32] {
        &self.train
    }

    pub fn validation(&self) -> &[f32] {
        &self.validation
    }

    /// Returns the amount of recorded epochs.
    pub fn len(&self) -> usize {
        self.train.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty()
    }

    /// Returns the losses of the last recorded epoch.
    pub fn last(&self) -> Option<(f32, f32)> {
        Some((*self.train.last()?, *self.validation.last()?))
    }

    /// Iterates `(epoch, train, validation)` with epochs counted from one.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f32, f32)> + '_ {
        self.train
            .iter()
            .zip(&self.validation)
            .enumerate()
            .map(|(i, (&train, &validation))| (i + 1, train, validation))
    }
}
