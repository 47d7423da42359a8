use std::{error::Error, fmt, io};

use machine_learning::MlErr;

/// The regressor module's result type.
pub type Result<T> = std::result::Result<T, RegressorErr>;

/// Everything that can abort an experiment.
#[derive(Debug)]
pub enum RegressorErr {
    Io(io::Error),
    Json(serde_json::Error),
    Ml(MlErr),
    /// A malformed line of a CSV dataset, `line` counts from one.
    Dataset {
        line: usize,
        msg: String,
    },
    /// Caught before any data is produced.
    InvalidConfig(String),
}

impl RegressorErr {
    pub fn dataset(line: usize, msg: impl Into<String>) -> Self {
        Self::Dataset {
            line,
            msg: msg.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl fmt::Display for RegressorErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegressorErr::Io(e) => write!(f, "io error: {e}"),
            RegressorErr::Json(e) => write!(f, "json error: {e}"),
            RegressorErr::Ml(e) => write!(f, "training error: {e}"),
            RegressorErr::Dataset { line, msg } => write!(f, "dataset line {line}: {msg}"),
            RegressorErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl Error for RegressorErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RegressorErr::Io(e) => Some(e),
            RegressorErr::Json(e) => Some(e),
            RegressorErr::Ml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RegressorErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for RegressorErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<MlErr> for RegressorErr {
    fn from(value: MlErr) -> Self {
        Self::Ml(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<RegressorErr> for io::Error {
    fn from(value: RegressorErr) -> Self {
        match value {
            RegressorErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
