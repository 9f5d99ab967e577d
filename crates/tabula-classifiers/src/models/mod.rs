pub mod adaboost;
pub mod classifier_trait;
pub mod factory;
pub mod gbdt;
pub mod majority;
pub mod tree;
pub mod utils;

pub use classifier_trait::Classifier;
pub use factory::{build_model, build_model_type};
