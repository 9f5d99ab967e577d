use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Central configuration for the classifier used by cross-validation and the
/// final fit.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ModelConfig {
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    DecisionTree {
        max_depth: usize,
        min_leaf_weight: f64,
        use_gain_ratio: bool,
    },
    AdaBoost {
        rounds: usize,
        base: Box<ModelType>,
    },
    Gbdt {
        max_depth: u32,
        iterations: usize,
        shrinkage: f32,
    },
    Majority,
}

impl ModelType {
    pub fn decision_tree() -> Self {
        ModelType::DecisionTree {
            max_depth: 12,
            min_leaf_weight: 2.0,
            use_gain_ratio: true,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelType::DecisionTree { .. } => "tree",
            ModelType::AdaBoost { .. } => "adaboost",
            ModelType::Gbdt { .. } => "gbdt",
            ModelType::Majority => "majority",
        }
    }
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::AdaBoost {
            rounds: 10,
            base: Box::new(ModelType::decision_tree()),
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tree" | "decision_tree" => Ok(ModelType::decision_tree()),
            "adaboost" => Ok(ModelType::default()),
            "gbdt" => Ok(ModelType::Gbdt {
                max_depth: 4,
                iterations: 30,
                shrinkage: 0.1,
            }),
            "majority" => Ok(ModelType::Majority),
            _ => Err(format!(
                "Unknown model type: {}. Expected one of: tree, adaboost, gbdt, majority",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(model_type: ModelType) -> Self {
        Self { model_type }
    }
}

/// Tokens that mean "missing", per attribute kind.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MissingSentinels {
    pub numeric: Vec<String>,
    pub nominal: Vec<String>,
}

impl Default for MissingSentinels {
    fn default() -> Self {
        Self {
            numeric: vec!["NA".to_string()],
            nominal: vec!["NA".to_string()],
        }
    }
}

impl MissingSentinels {
    pub fn none() -> Self {
        Self {
            numeric: Vec::new(),
            nominal: Vec::new(),
        }
    }

    pub fn is_numeric_sentinel(&self, token: &str) -> bool {
        self.numeric.iter().any(|s| s == token)
    }

    pub fn is_nominal_sentinel(&self, token: &str) -> bool {
        self.nominal.iter().any(|s| s == token)
    }
}

/// What to do with a test value outside the training-derived category set.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnseenPolicy {
    #[default]
    MapToReserved,
    Fail,
}

/// Settings consumed by the preprocessing and evaluation stages.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub folds: usize,
    pub seed: u64,
    /// Class attribute name; the last training attribute when unset.
    pub target_attribute: Option<String>,
    pub missing: MissingSentinels,
    pub zero_fill_numeric: bool,
    /// 1-based attribute range converted from numeric to nominal.
    pub coerce_range: String,
    pub unseen_policy: UnseenPolicy,
    pub unseen_label: String,
    pub stratify: bool,
    /// Text columns with more distinct values than this load as String.
    pub max_nominal_labels: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            folds: 10,
            seed: 1,
            target_attribute: None,
            missing: MissingSentinels::default(),
            zero_fill_numeric: false,
            coerce_range: "first-last".to_string(),
            unseen_policy: UnseenPolicy::MapToReserved,
            unseen_label: "other".to_string(),
            stratify: false,
            max_nominal_labels: 64,
        }
    }
}
