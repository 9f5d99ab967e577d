//! AdaBoost.M1 over any base model type.
use crate::config::ModelType;
use crate::dataset::{Dataset, Instance};
use crate::error::{PipelineError, Result, Stage};
use crate::models::classifier_trait::Classifier;
use crate::models::factory::build_model_type;
use crate::models::majority::MajorityClassifier;
use crate::models::utils::{argmax, normalize, FittedSchema};

struct Member {
    model: Box<dyn Classifier>,
    vote: f64,
}

/// Boosted ensemble. Each round refits the base model on reweighted data;
/// correctly classified rows are scaled by `beta = err / (1 - err)` and the
/// weights renormalized to their original total. Boosting stops early when
/// a round is perfect or no better than chance (the first round is always
/// kept). With zero rounds the ensemble is the weighted majority class.
pub struct AdaBoost {
    rounds: usize,
    base: ModelType,
    schema: Option<FittedSchema>,
    members: Vec<Member>,
}

impl AdaBoost {
    pub fn new(rounds: usize, base: ModelType) -> Self {
        Self {
            rounds,
            base,
            schema: None,
            members: Vec::new(),
        }
    }

    /// Number of models retained after the last `fit`.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

impl Classifier for AdaBoost {
    fn fit(&mut self, train: &Dataset) -> Result<()> {
        let schema = FittedSchema::from_dataset(train)?;
        let classes: Vec<Option<usize>> = train
            .instances()
            .iter()
            .map(|i| schema.class_of(i))
            .collect();

        let mut weights: Vec<f64> = train.instances().iter().map(|i| i.weight()).collect();
        let original_total: f64 = weights.iter().sum();
        let mut members = Vec::with_capacity(self.rounds);

        for round in 0..self.rounds {
            let data = train.with_weights(&weights);
            let mut model = build_model_type(&self.base);
            model.fit(&data)?;

            let mut correct = vec![false; weights.len()];
            let mut labeled = 0.0;
            let mut wrong = 0.0;
            for (r, instance) in data.instances().iter().enumerate() {
                let Some(class) = classes[r] else { continue };
                let predicted = argmax(&model.distribution(instance)?);
                labeled += weights[r];
                if predicted == class {
                    correct[r] = true;
                } else {
                    wrong += weights[r];
                }
            }
            let error = if labeled > 0.0 { wrong / labeled } else { 0.0 };
            log::debug!("AdaBoost round {}: weighted error {:.4}", round + 1, error);

            if error >= 0.5 || error == 0.0 {
                if members.is_empty() {
                    members.push(Member { model, vote: 1.0 });
                }
                break;
            }

            let beta = error / (1.0 - error);
            members.push(Member {
                model,
                vote: (1.0 / beta).ln(),
            });

            for (w, &ok) in weights.iter_mut().zip(&correct) {
                if ok {
                    *w *= beta;
                }
            }
            let total: f64 = weights.iter().sum();
            if total > 0.0 {
                let scale = original_total / total;
                weights.iter_mut().for_each(|w| *w *= scale);
            }
        }

        if members.is_empty() {
            log::warn!("AdaBoost produced no model; falling back to the majority class");
            let mut model: Box<dyn Classifier> = Box::new(MajorityClassifier::new());
            model.fit(train)?;
            members.push(Member { model, vote: 1.0 });
        }

        self.members = members;
        self.schema = Some(schema);
        Ok(())
    }

    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>> {
        let Some(schema) = &self.schema else {
            return Err(PipelineError::config(Stage::Predict, "adaboost model is not fitted"));
        };
        schema.check(instance)?;

        if let [only] = self.members.as_slice() {
            return only.model.distribution(instance);
        }
        let mut votes = vec![0.0; schema.num_classes()];
        for member in &self.members {
            let predicted = argmax(&member.model.distribution(instance)?);
            votes[predicted] += member.vote;
        }
        normalize(&mut votes);
        Ok(votes)
    }

    fn class_labels(&self) -> &[String] {
        match &self.schema {
            Some(schema) => schema.class_labels(),
            None => &[],
        }
    }

    fn name(&self) -> &str {
        "adaboost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Attribute, Value};

    fn diagonal() -> Dataset {
        // class is "pos" when x > y; a single axis split cannot separate it
        let mut rows = Vec::new();
        for x in 0..6 {
            for y in 0..6 {
                if x == y {
                    continue;
                }
                let label = if x > y { "pos" } else { "neg" };
                rows.push(vec![
                    Value::Number(x as f64),
                    Value::Number(y as f64),
                    Value::text(label),
                ]);
            }
        }
        let mut ds = Dataset::from_rows(
            "diagonal",
            vec![
                Attribute::numeric("x"),
                Attribute::numeric("y"),
                Attribute::nominal("label", vec!["neg".into(), "pos".into()]),
            ],
            rows,
        )
        .unwrap();
        ds.set_class("label").unwrap();
        ds
    }

    fn accuracy(model: &dyn Classifier, ds: &Dataset) -> f64 {
        let hits = ds
            .instances()
            .iter()
            .filter(|i| model.predict(i).unwrap() == *i.value(2))
            .count();
        hits as f64 / ds.instance_count() as f64
    }

    #[test]
    fn boosting_stumps_beats_a_single_stump() {
        let ds = diagonal();
        let stump = ModelType::DecisionTree {
            max_depth: 1,
            min_leaf_weight: 1.0,
            use_gain_ratio: false,
        };

        let mut single = build_model_type(&stump);
        single.fit(&ds).unwrap();

        let mut boosted = AdaBoost::new(20, stump);
        boosted.fit(&ds).unwrap();

        assert!(boosted.member_count() > 1);
        assert!(accuracy(&boosted, &ds) >= accuracy(single.as_ref(), &ds));
    }

    #[test]
    fn perfect_first_round_keeps_single_member() {
        let mut ds = Dataset::from_rows(
            "easy",
            vec![
                Attribute::numeric("x"),
                Attribute::nominal("label", vec!["a".into(), "b".into()]),
            ],
            (0..8)
                .map(|i| {
                    let label = if i < 4 { "a" } else { "b" };
                    vec![Value::Number(i as f64), Value::text(label)]
                })
                .collect(),
        )
        .unwrap();
        ds.set_class("label").unwrap();

        let mut model = AdaBoost::new(10, ModelType::decision_tree());
        model.fit(&ds).unwrap();
        assert_eq!(model.member_count(), 1);
        assert_eq!(model.predict(ds.instance(7)).unwrap(), Value::text("b"));
    }

    #[test]
    fn zero_rounds_falls_back_to_majority() {
        let ds = diagonal().with_weights(&{
            let mut w = vec![1.0; 30];
            w[0] = 10.0;
            w
        });
        let mut model = AdaBoost::new(0, ModelType::decision_tree());
        model.fit(&ds).unwrap();
        assert_eq!(model.member_count(), 1);
        let expected = ds.instance(0).value(2).clone();
        assert_eq!(model.predict(ds.instance(5)).unwrap(), expected);
    }
}
