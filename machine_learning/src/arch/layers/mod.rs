mod dense;

pub use dense::{Dense, LayerTape};
