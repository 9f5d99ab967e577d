use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;

use crate::dataset::{Dataset, Instance};
use crate::error::{PipelineError, Result, Stage};
use crate::models::classifier_trait::Classifier;
use crate::models::utils::{class_weights, normalize, FittedSchema};

/// Stand-in for missing feature values; below every real code.
const MISSING: f32 = f32::MIN;

/// Gradient boosted trees, one regressor per class (one-vs-rest).
///
/// Each regressor is trained with squared error on 0/1 targets; class
/// scores are clamped to [0, 1] and normalized into a distribution.
pub struct GbdtClassifier {
    max_depth: u32,
    iterations: usize,
    shrinkage: f32,
    schema: Option<FittedSchema>,
    /// `None` for classes absent from the training data.
    models: Vec<Option<GBDT>>,
    prior: Vec<f64>,
}

impl GbdtClassifier {
    pub fn new(max_depth: u32, iterations: usize, shrinkage: f32) -> Self {
        Self {
            max_depth,
            iterations,
            shrinkage,
            schema: None,
            models: Vec::new(),
            prior: Vec::new(),
        }
    }

    fn features(schema: &FittedSchema, instance: &Instance) -> Vec<f32> {
        let codes = schema.encode_instance(instance);
        schema
            .feature_columns()
            .into_iter()
            .map(|c| to_feature(codes[c]))
            .collect()
    }
}

fn to_feature(code: f64) -> f32 {
    if code.is_nan() {
        MISSING
    } else {
        code as f32
    }
}

impl Classifier for GbdtClassifier {
    fn fit(&mut self, train: &Dataset) -> Result<()> {
        let schema = FittedSchema::from_dataset(train)?;

        let mut prior = class_weights(&schema, train);
        normalize(&mut prior);

        let x = schema.encode(train);
        let columns = schema.feature_columns();
        let labeled: Vec<(Vec<f32>, f32, usize)> = train
            .instances()
            .iter()
            .enumerate()
            .filter(|(_, i)| i.weight() > 0.0)
            .filter_map(|(r, i)| {
                schema.class_of(i).map(|c| {
                    let row = columns.iter().map(|&col| to_feature(x[[r, col]])).collect();
                    (row, i.weight() as f32, c)
                })
            })
            .collect();
        if labeled.is_empty() {
            return Err(PipelineError::config(
                Stage::Train,
                format!("no labeled instances in '{}'", train.name()),
            ));
        }

        let mut models = Vec::with_capacity(schema.num_classes());
        for class in 0..schema.num_classes() {
            if columns.is_empty() || prior[class] == 0.0 {
                models.push(None);
                continue;
            }
            let mut config = Config::new();
            config.set_feature_size(columns.len());
            config.set_max_depth(self.max_depth);
            config.set_iterations(self.iterations);
            config.set_shrinkage(self.shrinkage);
            config.set_loss("SquaredError");
            config.set_debug(false);

            let mut train_x: DataVec = labeled
                .iter()
                .map(|(row, weight, c)| {
                    let target = if *c == class { 1.0 } else { 0.0 };
                    Data::new_training_data(row.clone(), *weight, target, None)
                })
                .collect();

            let mut gbdt = GBDT::new(&config);
            gbdt.fit(&mut train_x);
            models.push(Some(gbdt));
        }
        log::trace!(
            "Trained {} one-vs-rest GBDT models on {} instances",
            models.iter().filter(|m| m.is_some()).count(),
            labeled.len()
        );

        self.models = models;
        self.prior = prior;
        self.schema = Some(schema);
        Ok(())
    }

    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>> {
        let Some(schema) = &self.schema else {
            return Err(PipelineError::config(Stage::Predict, "gbdt model is not fitted"));
        };
        schema.check(instance)?;
        if self.models.iter().all(Option::is_none) {
            return Ok(self.prior.clone());
        }

        let test_x: DataVec = vec![Data::new_training_data(
            Self::features(schema, instance),
            1.0,
            0.0,
            None,
        )];
        let mut dist: Vec<f64> = self
            .models
            .iter()
            .map(|m| match m {
                Some(gbdt) => gbdt
                    .predict(&test_x)
                    .first()
                    .map_or(0.0, |&p| f64::from(p).clamp(0.0, 1.0)),
                None => 0.0,
            })
            .collect();
        if dist.iter().sum::<f64>() <= 0.0 {
            return Ok(self.prior.clone());
        }
        normalize(&mut dist);
        Ok(dist)
    }

    fn class_labels(&self) -> &[String] {
        match &self.schema {
            Some(schema) => schema.class_labels(),
            None => &[],
        }
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Attribute, Value};

    #[test]
    fn separates_two_zones() {
        let rows = (0..20)
            .map(|i| {
                let zone = if i % 2 == 0 { "A" } else { "B" };
                let label = if i % 2 == 0 { "cheap" } else { "dear" };
                vec![Value::Number(i as f64), Value::text(zone), Value::text(label)]
            })
            .collect();
        let mut ds = Dataset::from_rows(
            "zones",
            vec![
                Attribute::numeric("id"),
                Attribute::nominal("zone", vec!["A".into(), "B".into()]),
                Attribute::nominal("price", vec!["cheap".into(), "dear".into()]),
            ],
            rows,
        )
        .unwrap();
        ds.set_class("price").unwrap();

        let mut model = GbdtClassifier::new(3, 20, 0.3);
        model.fit(&ds).unwrap();

        let probe = Instance::new(vec![Value::Number(3.0), Value::text("B"), Value::Missing]);
        assert_eq!(model.predict(&probe).unwrap(), Value::text("dear"));
        let dist = model.distribution(&probe).unwrap();
        assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn class_without_features_falls_back_to_prior() {
        let mut ds = Dataset::from_rows(
            "bare",
            vec![Attribute::nominal("y", vec!["a".into(), "b".into()])],
            vec![
                vec![Value::text("a")],
                vec![Value::text("a")],
                vec![Value::text("b")],
            ],
        )
        .unwrap();
        ds.set_class("y").unwrap();

        let mut model = GbdtClassifier::new(3, 5, 0.1);
        model.fit(&ds).unwrap();
        assert_eq!(model.predict(ds.instance(2)).unwrap(), Value::text("a"));
    }
}
