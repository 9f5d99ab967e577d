//! Mean/mode imputation fitted once on the training set.
//!
//! The fitted [`Imputer`] is shared read-only by every `apply` call so that
//! train and test are filled with the same training-derived statistics.
use std::collections::HashMap;

use statrs::statistics::Statistics;

use crate::dataset::{Attribute, AttributeKind, Dataset, Value};
use crate::error::{PipelineError, Result, Stage};

#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    /// Arithmetic mean of the observed numeric values.
    Mean(f64),
    /// Most frequent observed label.
    Mode(String),
}

/// Fill value for one attribute, computed from training data only.
#[derive(Debug, Clone, PartialEq)]
pub struct FillStrategy {
    attribute: String,
    fill: Fill,
}

impl FillStrategy {
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn kind(&self) -> AttributeKind {
        match self.fill {
            Fill::Mean(_) => AttributeKind::Numeric,
            Fill::Mode(_) => AttributeKind::Nominal,
        }
    }

    pub fn fill(&self) -> Value {
        match &self.fill {
            Fill::Mean(v) => Value::Number(*v),
            Fill::Mode(label) => Value::Text(label.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Imputer {
    strategies: Vec<FillStrategy>,
}

impl Imputer {
    /// Compute one strategy per Numeric/Nominal attribute of `train`.
    ///
    /// The class attribute and String attributes get no strategy. An
    /// attribute whose training values are all missing is fatal.
    pub fn fit(train: &Dataset) -> Result<Self> {
        let mut strategies = Vec::new();

        for (col, attribute) in train.attributes().iter().enumerate() {
            if Some(col) == train.class_index() || attribute.is_string() {
                continue;
            }
            let fill = match attribute.kind() {
                AttributeKind::Numeric => fit_mean(train, col, attribute)?,
                AttributeKind::Nominal => fit_mode(train, col, attribute)?,
                AttributeKind::String => continue,
            };
            strategies.push(FillStrategy {
                attribute: attribute.name().to_string(),
                fill,
            });
        }

        log::debug!(
            "Fitted {} fill strategies on '{}'",
            strategies.len(),
            train.name()
        );
        Ok(Self { strategies })
    }

    pub fn strategies(&self) -> &[FillStrategy] {
        &self.strategies
    }

    pub fn strategy(&self, attribute: &str) -> Option<&FillStrategy> {
        self.strategies.iter().find(|s| s.attribute == attribute)
    }

    /// Replace every missing cell of an attribute that has a strategy.
    ///
    /// Attributes are matched by name; attributes without a strategy are
    /// passed through untouched.
    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset> {
        let mut out = dataset.clone();
        let mut filled = 0usize;

        for strategy in &self.strategies {
            let Some(col) = out.attribute_index(&strategy.attribute) else {
                continue;
            };
            let attribute = out.attribute(col).clone();
            if attribute.kind() != strategy.kind() {
                return Err(PipelineError::config(
                    Stage::Impute,
                    format!(
                        "attribute '{}' is {} in '{}' but {} in training",
                        attribute.name(),
                        attribute.kind(),
                        dataset.name(),
                        strategy.kind()
                    ),
                ));
            }

            let value = strategy.fill();
            if let Fill::Mode(label) = &strategy.fill {
                if attribute.label_index(label).is_none() {
                    let mut labels = attribute.labels().to_vec();
                    labels.push(label.clone());
                    out.replace_attribute(col, Attribute::nominal(attribute.name(), labels));
                }
            }

            for instance in out.instances_mut() {
                if instance.value(col).is_missing() {
                    instance.set_value(col, value.clone());
                    filled += 1;
                }
            }
        }

        log::debug!("Imputed {} cells in '{}'", filled, dataset.name());
        Ok(out)
    }
}

fn fit_mean(train: &Dataset, col: usize, attribute: &Attribute) -> Result<Fill> {
    let mut observed = Vec::new();
    for value in train.column(col) {
        match value {
            Value::Number(v) => observed.push(*v),
            Value::Missing => {}
            Value::Text(t) => {
                return Err(PipelineError::config(
                    Stage::Impute,
                    format!(
                        "numeric attribute '{}' holds non-numeric value '{}'; \
                         add it to the numeric missing sentinels",
                        attribute.name(),
                        t
                    ),
                ))
            }
        }
    }
    if observed.is_empty() {
        return Err(PipelineError::MissingStrategyUndefined {
            attribute: attribute.name().to_string(),
        });
    }
    Ok(Fill::Mean(observed.iter().mean()))
}

fn fit_mode(train: &Dataset, col: usize, attribute: &Attribute) -> Result<Fill> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in train.column(col) {
        if let Value::Text(label) = value {
            *counts.entry(label.as_str()).or_default() += 1;
        }
    }

    // ties go to the earliest label in attribute order
    let mut best: Option<(&str, usize)> = None;
    for label in attribute.labels() {
        let count = counts.get(label.as_str()).copied().unwrap_or(0);
        if count > 0 && best.map_or(true, |(_, c)| count > c) {
            best = Some((label.as_str(), count));
        }
    }

    match best {
        Some((label, _)) => Ok(Fill::Mode(label.to_string())),
        None => Err(PipelineError::MissingStrategyUndefined {
            attribute: attribute.name().to_string(),
        }),
    }
}
