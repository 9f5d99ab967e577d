use crate::config::{ModelConfig, ModelType};
use crate::models::adaboost::AdaBoost;
use crate::models::classifier_trait::Classifier;
use crate::models::gbdt::GbdtClassifier;
use crate::models::majority::MajorityClassifier;
use crate::models::tree::DecisionTree;

/// Build a boxed, unfitted classifier from a `ModelConfig`.
pub fn build_model(config: &ModelConfig) -> Box<dyn Classifier> {
    build_model_type(&config.model_type)
}

pub fn build_model_type(model_type: &ModelType) -> Box<dyn Classifier> {
    match model_type {
        ModelType::DecisionTree {
            max_depth,
            min_leaf_weight,
            use_gain_ratio,
        } => Box::new(DecisionTree::new(*max_depth, *min_leaf_weight, *use_gain_ratio)),
        ModelType::AdaBoost { rounds, base } => Box::new(AdaBoost::new(*rounds, (**base).clone())),
        ModelType::Gbdt {
            max_depth,
            iterations,
            shrinkage,
        } => Box::new(GbdtClassifier::new(*max_depth, *iterations, *shrinkage)),
        ModelType::Majority => Box::new(MajorityClassifier::new()),
    }
}
