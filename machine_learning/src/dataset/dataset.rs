use std::num::NonZeroUsize;

use ndarray::{Array2, ArrayView2, Axis, concatenate, s};
use rand::{Rng, seq::SliceRandom};

use crate::{MlErr, Result};

/// An in-memory collection of supervised samples.
///
/// Each row holds the `x_size` features of a sample followed by its `y_size` targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    data: Array2<f32>,
    x_size: usize,
}

impl Dataset {
    /// Creates a new `Dataset` from a row-major buffer.
    ///
    /// # Arguments
    /// * `data` - The samples, each one `x_size` features followed by `y_size` targets.
    /// * `x_size` - The amount of features per sample.
    /// * `y_size` - The amount of targets per sample.
    ///
    /// # Returns
    /// A new `Dataset` or an error if the buffer is empty or not made of whole rows.
    pub fn new(data: Vec<f32>, x_size: usize, y_size: usize) -> Result<Self> {
        check_sizes(x_size, y_size)?;

        let row_size = x_size + y_size;

        if data.is_empty() {
            return Err(MlErr::EmptyDataset { what: "input" });
        }

        if data.len() % row_size != 0 {
            return Err(MlErr::size_mismatch(
                "dataset buffer",
                data.len(),
                data.len().next_multiple_of(row_size),
            ));
        }

        let rows = data.len() / row_size;
        let data = Array2::from_shape_vec((rows, row_size), data)
            .map_err(|_| MlErr::size_mismatch("dataset buffer", rows, rows * row_size))?;

        Ok(Self { data, x_size })
    }

    /// Creates a new `Dataset` out of a features matrix and a targets matrix.
    ///
    /// # Returns
    /// A new `Dataset` or an error if they have a different amount of rows.
    pub fn from_parts(x: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Self> {
        check_sizes(x.ncols(), y.ncols())?;

        if x.nrows() != y.nrows() {
            return Err(MlErr::size_mismatch("target rows", y.nrows(), x.nrows()));
        }

        let data = concatenate(Axis(1), &[x, y])
            .map_err(|_| MlErr::size_mismatch("target rows", y.nrows(), x.nrows()))?;

        Ok(Self {
            data,
            x_size: x.ncols(),
        })
    }

    /// Returns the amount of samples.
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn x_size(&self) -> usize {
        self.x_size
    }

    pub fn y_size(&self) -> usize {
        self.data.ncols() - self.x_size
    }

    /// Returns the features of every sample.
    pub fn x(&self) -> ArrayView2<'_, f32> {
        self.data.slice(s![.., ..self.x_size])
    }

    /// Returns the targets of every sample.
    pub fn y(&self) -> ArrayView2<'_, f32> {
        self.data.slice(s![.., self.x_size..])
    }

    /// Shuffles the samples in place.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        let mut indices: Vec<_> = (0..self.len()).collect();
        indices.shuffle(rng);
        self.data = self.data.select(Axis(0), &indices);
    }

    /// Builds a new dataset out of the samples at `indices`, in that order.
    ///
    /// # Returns
    /// The selected samples or an error if an index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(MlErr::size_mismatch("sample index", bad, self.len()));
        }

        Ok(Self {
            data: self.data.select(Axis(0), indices),
            x_size: self.x_size,
        })
    }

    /// Iterates the samples in consecutive batches of `batch_size` rows, the last one may be
    /// smaller.
    ///
    /// # Returns
    /// An iterator of `(x, y)` views.
    pub fn batches(
        &self,
        batch_size: NonZeroUsize,
    ) -> impl Iterator<Item = (ArrayView2<'_, f32>, ArrayView2<'_, f32>)> {
        let x_size = self.x_size;

        self.data
            .axis_chunks_iter(Axis(0), batch_size.get())
            .map(move |batch| batch.split_at(Axis(1), x_size))
    }
}

fn check_sizes(x_size: usize, y_size: usize) -> Result<()> {
    if x_size == 0 {
        return Err(MlErr::size_mismatch("dataset features", 0, 1));
    }

    if y_size == 0 {
        return Err(MlErr::size_mismatch("dataset targets", 0, 1));
    }

    Ok(())
}
