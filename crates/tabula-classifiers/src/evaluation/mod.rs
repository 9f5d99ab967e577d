pub mod cross_validation;
pub mod metrics;

pub use cross_validation::{cross_validate, partition};
pub use metrics::{EvaluationResult, FoldResult};
