mod model;
mod plan;
pub mod space;

pub use model::{Classifier, ExperimentConfig, Ranker};
pub use plan::ExperimentPlan;
pub use space::ConfigurationSpace;
