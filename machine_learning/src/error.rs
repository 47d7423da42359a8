use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    EmptyDataset {
        what: &'static str,
    },
    InvalidSplit(String),
    InvalidHyperparameter {
        name: &'static str,
        reason: String,
    },
    Distribution(String),
}

impl MlErr {
    /// Shorthand for building a `SizeMismatch` error.
    pub fn size_mismatch(what: &'static str, got: usize, expected: usize) -> Self {
        Self::SizeMismatch {
            what,
            got,
            expected,
        }
    }

    /// Shorthand for building an `InvalidHyperparameter` error.
    pub fn invalid_hyperparameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidHyperparameter {
            name,
            reason: reason.into(),
        }
    }
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch in {what}, got {got} and expected {expected}"
            ),
            MlErr::EmptyDataset { what } => write!(f, "The {what} dataset has no samples"),
            MlErr::InvalidSplit(reason) => write!(f, "Invalid dataset split: {reason}"),
            MlErr::InvalidHyperparameter { name, reason } => {
                write!(f, "Invalid value for {name}: {reason}")
            }
            MlErr::Distribution(reason) => {
                write!(f, "Failed to build a sampling distribution: {reason}")
            }
        }
    }
}

impl Error for MlErr {}
