mod dataset;
mod scaler;
mod split;

pub use dataset::Dataset;
pub use scaler::StandardScaler;
pub use split::{Split, SplitRatios};
