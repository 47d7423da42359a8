pub mod arch;
pub mod dataset;
pub mod error;
pub mod initialization;
pub mod optimization;
mod test;
pub mod training;

pub use error::{MlErr, Result};
