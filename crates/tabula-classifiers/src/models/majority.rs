use crate::dataset::{Dataset, Instance};
use crate::error::{PipelineError, Result, Stage};
use crate::models::classifier_trait::Classifier;
use crate::models::utils::{class_weights, normalize, FittedSchema};

/// Predicts the weighted majority class regardless of the input.
#[derive(Debug, Clone, Default)]
pub struct MajorityClassifier {
    schema: Option<FittedSchema>,
    distribution: Vec<f64>,
}

impl MajorityClassifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for MajorityClassifier {
    fn fit(&mut self, train: &Dataset) -> Result<()> {
        let schema = FittedSchema::from_dataset(train)?;
        let mut distribution = class_weights(&schema, train);
        normalize(&mut distribution);
        self.distribution = distribution;
        self.schema = Some(schema);
        Ok(())
    }

    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>> {
        let schema = self
            .schema
            .as_ref()
            .ok_or_else(|| PipelineError::config(Stage::Predict, "majority model is not fitted"))?;
        schema.check(instance)?;
        Ok(self.distribution.clone())
    }

    fn class_labels(&self) -> &[String] {
        match &self.schema {
            Some(schema) => schema.class_labels(),
            None => &[],
        }
    }

    fn name(&self) -> &str {
        "majority"
    }
}
