use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use ndarray::ShapeError;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    LabelOutOfRange {
        index: usize,
        label: usize,
        n_classes: usize,
    },
    EmptyDataset(&'static str),
    DataExhausted {
        minibatch: usize,
        available: usize,
    },
    NonFinite {
        what: &'static str,
        epoch: usize,
        minibatch: usize,
    },
    InvalidConfig(String),
    InvalidIdx {
        path: PathBuf,
        reason: String,
    },
    Checkpoint(String),
    Shape(ShapeError),
    Io(io::Error),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => format!("There's a size mismatch for {what}, got {got} and expected {expected}"),
            MlErr::LabelOutOfRange {
                index,
                label,
                n_classes,
            } => format!(
                "The label of sample {index} is {label}, outside of the valid range [0, {n_classes})"
            ),
            MlErr::EmptyDataset(what) => format!("The {what} has no samples"),
            MlErr::DataExhausted {
                minibatch,
                available,
            } => format!(
                "Requested minibatch {minibatch} but the data source only has {available} minibatches"
            ),
            MlErr::NonFinite {
                what,
                epoch,
                minibatch,
            } => format!(
                "The {what} became non finite at epoch {epoch}, minibatch {minibatch}, aborting training"
            ),
            MlErr::InvalidConfig(msg) => format!("Invalid training configuration: {msg}"),
            MlErr::InvalidIdx { path, reason } => {
                format!("Invalid IDX file {}: {reason}", path.display())
            }
            MlErr::Checkpoint(msg) => format!("Checkpoint failure: {msg}"),
            MlErr::Shape(e) => format!("Shape error: {e}"),
            MlErr::Io(e) => format!("io error: {e}"),
        };

        write!(f, "{s}")
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Shape(e) => Some(e),
            MlErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ShapeError> for MlErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}
