use std::fmt;

use super::Dataset;
use crate::{MlErr, Result};

/// One of the three fixed partitions of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Split::Train => "train",
            Split::Valid => "validation",
            Split::Test => "test",
        };

        f.write_str(s)
    }
}

/// The train, validation and test datasets of a run. All three share the same input width and
/// amount of classes.
#[derive(Debug, Clone)]
pub struct Splits {
    train: Dataset,
    valid: Dataset,
    test: Dataset,
}

impl Splits {
    /// Creates a new `Splits`.
    ///
    /// # Errors
    /// Returns `MlErr::SizeMismatch` if the datasets disagree on their input width or classes.
    pub fn new(train: Dataset, valid: Dataset, test: Dataset) -> Result<Self> {
        for other in [&valid, &test] {
            if other.n_features() != train.n_features() {
                return Err(MlErr::SizeMismatch {
                    what: "split features",
                    got: other.n_features(),
                    expected: train.n_features(),
                });
            }

            if other.n_classes() != train.n_classes() {
                return Err(MlErr::SizeMismatch {
                    what: "split classes",
                    got: other.n_classes(),
                    expected: train.n_classes(),
                });
            }
        }

        Ok(Self { train, valid, test })
    }

    pub fn get(&self, split: Split) -> &Dataset {
        match split {
            Split::Train => &self.train,
            Split::Valid => &self.valid,
            Split::Test => &self.test,
        }
    }

    pub fn get_mut(&mut self, split: Split) -> &mut Dataset {
        match split {
            Split::Train => &mut self.train,
            Split::Valid => &mut self.valid,
            Split::Test => &mut self.test,
        }
    }

    pub fn n_features(&self) -> usize {
        self.train.n_features()
    }

    pub fn n_classes(&self) -> usize {
        self.train.n_classes()
    }
}
