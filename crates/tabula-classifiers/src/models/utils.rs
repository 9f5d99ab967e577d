use std::collections::HashMap;

use ndarray::Array2;

use crate::dataset::{Attribute, AttributeKind, Dataset, Instance, Value};
use crate::error::{PipelineError, Result, Stage};

/// Schema captured at fit time. Every classifier keeps one so `predict`
/// can check that incoming instances match the training layout and can
/// encode nominal labels to their training positions.
#[derive(Debug, Clone)]
pub struct FittedSchema {
    attributes: Vec<Attribute>,
    class_index: usize,
    lookups: Vec<HashMap<String, usize>>,
}

impl FittedSchema {
    pub fn from_dataset(train: &Dataset) -> Result<Self> {
        let class_index = train.class_index().ok_or_else(|| {
            PipelineError::config(
                Stage::Train,
                format!("dataset '{}' has no target attribute", train.name()),
            )
        })?;
        let class = train.attribute(class_index);
        if !class.is_nominal() {
            return Err(PipelineError::config(
                Stage::Train,
                format!(
                    "target attribute '{}' is {}; classification needs a nominal target",
                    class.name(),
                    class.kind()
                ),
            ));
        }
        if class.labels().is_empty() {
            return Err(PipelineError::config(
                Stage::Train,
                format!("target attribute '{}' has no labels", class.name()),
            ));
        }

        let lookups = train
            .attributes()
            .iter()
            .map(|a| {
                a.labels()
                    .iter()
                    .enumerate()
                    .map(|(i, l)| (l.clone(), i))
                    .collect()
            })
            .collect();

        Ok(Self {
            attributes: train.attributes().to_vec(),
            class_index,
            lookups,
        })
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn class_index(&self) -> usize {
        self.class_index
    }

    pub fn class_labels(&self) -> &[String] {
        self.attributes[self.class_index].labels()
    }

    pub fn num_classes(&self) -> usize {
        self.class_labels().len()
    }

    /// Indices of the non-class attributes.
    pub fn feature_columns(&self) -> Vec<usize> {
        (0..self.attributes.len())
            .filter(|&c| c != self.class_index)
            .collect()
    }

    pub fn check(&self, instance: &Instance) -> Result<()> {
        if instance.len() != self.attributes.len() {
            return Err(PipelineError::config(
                Stage::Predict,
                format!(
                    "instance has {} values but the model was trained on {} attributes",
                    instance.len(),
                    self.attributes.len()
                ),
            ));
        }
        Ok(())
    }

    /// Numeric code of a cell: the number itself, or the training label
    /// position for nominal cells. Missing and unknown labels are NaN.
    pub fn code(&self, col: usize, value: &Value) -> f64 {
        match (self.attributes[col].kind(), value) {
            (AttributeKind::Numeric, Value::Number(v)) => *v,
            (AttributeKind::Nominal, Value::Text(label)) => self.lookups[col]
                .get(label)
                .map(|&i| i as f64)
                .unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }

    pub fn encode_instance(&self, instance: &Instance) -> Vec<f64> {
        instance
            .values()
            .iter()
            .enumerate()
            .map(|(col, v)| self.code(col, v))
            .collect()
    }

    /// Encode every row of `data`; shape is (rows, attributes).
    pub fn encode(&self, data: &Dataset) -> Array2<f64> {
        let (rows, cols) = (data.instance_count(), self.attributes.len());
        let mut out = Array2::from_elem((rows, cols), f64::NAN);
        for (r, instance) in data.instances().iter().enumerate() {
            for (c, value) in instance.values().iter().enumerate().take(cols) {
                out[[r, c]] = self.code(c, value);
            }
        }
        out
    }

    /// Training label position of the instance's class value.
    pub fn class_of(&self, instance: &Instance) -> Option<usize> {
        match instance.value(self.class_index) {
            Value::Text(label) => self.lookups[self.class_index].get(label).copied(),
            _ => None,
        }
    }
}

/// Index of the first maximum.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Scale to sum 1; uniform when the total is zero.
pub fn normalize(dist: &mut [f64]) {
    let total: f64 = dist.iter().sum();
    if total > 0.0 {
        dist.iter_mut().for_each(|d| *d /= total);
    } else if !dist.is_empty() {
        let uniform = 1.0 / dist.len() as f64;
        dist.iter_mut().for_each(|d| *d = uniform);
    }
}

/// Weighted class counts over labeled rows.
pub fn class_weights(schema: &FittedSchema, data: &Dataset) -> Vec<f64> {
    let mut counts = vec![0.0; schema.num_classes()];
    for instance in data.instances() {
        if let Some(c) = schema.class_of(instance) {
            counts[c] += instance.weight();
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train() -> Dataset {
        let mut ds = Dataset::from_rows(
            "train",
            vec![
                Attribute::numeric("x"),
                Attribute::nominal("zone", vec!["A".into(), "B".into()]),
                Attribute::nominal("label", vec!["no".into(), "yes".into()]),
            ],
            vec![
                vec![Value::Number(1.5), Value::text("B"), Value::text("yes")],
                vec![Value::Missing, Value::text("C"), Value::Missing],
            ],
        )
        .unwrap();
        ds.set_class("label").unwrap();
        ds
    }

    #[test]
    fn encodes_labels_by_training_position() {
        let ds = train();
        let schema = FittedSchema::from_dataset(&ds).unwrap();
        let x = schema.encode(&ds);
        assert_eq!(x[[0, 0]], 1.5);
        assert_eq!(x[[0, 1]], 1.0);
        assert!(x[[1, 0]].is_nan());
        assert!(x[[1, 1]].is_nan(), "unknown label encodes as NaN");
        assert_eq!(schema.class_of(ds.instance(0)), Some(1));
        assert_eq!(schema.class_of(ds.instance(1)), None);
    }

    #[test]
    fn numeric_target_is_rejected() {
        let mut ds = train();
        ds.set_class("x").unwrap();
        assert!(FittedSchema::from_dataset(&ds).is_err());
    }

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        let mut dist = vec![0.0, 0.0];
        normalize(&mut dist);
        assert_eq!(dist, vec![0.5, 0.5]);
    }
}
