mod builder;
mod history;
mod model_trainer;
mod spec;
mod trainer;

pub use builder::TrainerBuilder;
pub use history::LossHistory;
pub use model_trainer::ModelTrainer;
pub use spec::{ActFnSpec, LossFnSpec, ModelSpec, OptimizerSpec, TrainerSpec};
pub use trainer::Trainer;
