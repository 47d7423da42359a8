pub mod config;
pub mod data;
pub mod error;
pub mod experiment;
pub mod report;

pub use error::{RegressorErr, Result};
pub use experiment::{Experiment, Outcome};
