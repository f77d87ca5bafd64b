use std::num::NonZeroUsize;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};
use rand::{Rng, seq::SliceRandom};

use crate::{MlErr, Result};

/// An in-memory labelled dataset: one flattened feature vector per row and one class index per
/// row.
///
/// Invariants checked on construction:
/// - there is at least one sample,
/// - inputs and labels have the same amount of rows,
/// - every label lies in `[0, n_classes)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    x: Array2<f32>,
    y: Array1<usize>,
    n_classes: usize,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `x` - A `N x D` matrix of inputs.
    /// * `y` - The `N` labels, aligned with the rows of `x`.
    /// * `n_classes` - The amount of classes.
    ///
    /// # Returns
    /// A new `Dataset` or an error if any of the invariants doesn't hold.
    pub fn new(x: Array2<f32>, y: Array1<usize>, n_classes: usize) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(MlErr::SizeMismatch {
                what: "labels",
                got: y.len(),
                expected: x.nrows(),
            });
        }

        if y.is_empty() {
            return Err(MlErr::EmptyDataset("dataset"));
        }

        if let Some((index, &label)) = y.iter().enumerate().find(|&(_, &l)| l >= n_classes) {
            return Err(MlErr::LabelOutOfRange {
                index,
                label,
                n_classes,
            });
        }

        Ok(Self { x, y, n_classes })
    }

    /// Creates a new `Dataset` from a flat row-major buffer of features.
    pub fn from_vecs(
        xs: Vec<f32>,
        n_features: usize,
        ys: Vec<usize>,
        n_classes: usize,
    ) -> Result<Self> {
        if n_features == 0 || xs.len() != ys.len() * n_features {
            return Err(MlErr::SizeMismatch {
                what: "features",
                got: xs.len(),
                expected: ys.len() * n_features,
            });
        }

        let x = Array2::from_shape_vec((ys.len(), n_features), xs)?;
        Self::new(x, Array1::from(ys), n_classes)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.y.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    #[inline]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[inline]
    pub fn x(&self) -> ArrayView2<'_, f32> {
        self.x.view()
    }

    #[inline]
    pub fn y(&self) -> ArrayView1<'_, usize> {
        self.y.view()
    }

    /// Returns the amount of minibatches of size `batch_size` a full traversal yields, counting a
    /// trailing partial batch.
    pub fn n_batches(&self, batch_size: NonZeroUsize) -> usize {
        self.len().div_ceil(batch_size.get())
    }

    /// Returns the `index`-th minibatch of size `batch_size`, or `None` if there is no such batch.
    pub fn batch(&self, index: usize, batch_size: NonZeroUsize) -> Option<BatchRef<'_>> {
        let start = index.checked_mul(batch_size.get())?;
        if start >= self.len() {
            return None;
        }

        let end = (start + batch_size.get()).min(self.len());
        Some(self.rows(start, end))
    }

    /// Returns an iterator over consecutive minibatches covering the dataset exactly once.
    pub fn batches(&self, batch_size: NonZeroUsize) -> Batches<'_> {
        Batches {
            dataset: self,
            batch_size: batch_size.get(),
            cursor: 0,
        }
    }

    /// Permutes the samples in place, keeping every input aligned with its label.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut permutation: Vec<usize> = (0..self.len()).collect();
        permutation.shuffle(rng);

        self.x = self.x.select(Axis(0), &permutation);
        self.y = self.y.select(Axis(0), &permutation);
    }

    /// Moves the last `n` samples into a new dataset.
    ///
    /// # Errors
    /// Returns `MlErr::InvalidConfig` unless `0 < n < len`, both halves must keep a sample.
    pub fn split_off(&mut self, n: usize) -> Result<Dataset> {
        if n == 0 || n >= self.len() {
            return Err(MlErr::InvalidConfig(format!(
                "cannot split {n} samples off a dataset of {} samples",
                self.len()
            )));
        }

        let at = self.len() - n;
        let tail = Self {
            x: self.x.slice(s![at.., ..]).to_owned(),
            y: self.y.slice(s![at..]).to_owned(),
            n_classes: self.n_classes,
        };

        self.x = self.x.slice(s![..at, ..]).to_owned();
        self.y = self.y.slice(s![..at]).to_owned();
        Ok(tail)
    }

    fn rows(&self, start: usize, end: usize) -> BatchRef<'_> {
        BatchRef {
            x: self.x.slice(s![start..end, ..]),
            y: self.y.slice(s![start..end]),
        }
    }
}

/// Borrowed minibatch view (zero-copy).
#[derive(Debug, Clone, Copy)]
pub struct BatchRef<'a> {
    pub x: ArrayView2<'a, f32>,
    pub y: ArrayView1<'a, usize>,
}

impl BatchRef<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        self.y.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

/// Sequential minibatch iterator, the last batch may be smaller than the rest.
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    dataset: &'a Dataset,
    batch_size: usize,
    cursor: usize,
}

impl<'a> Iterator for Batches<'a> {
    type Item = BatchRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let dataset = self.dataset;
        if self.cursor >= dataset.len() {
            return None;
        }

        let end = (self.cursor + self.batch_size).min(dataset.len());
        let batch = dataset.rows(self.cursor, end);
        self.cursor = end;
        Some(batch)
    }
}
