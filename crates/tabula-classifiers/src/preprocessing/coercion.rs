//! Numeric → nominal coercion with a single training-derived mapping.
//!
//! Each distinct training value of a coerced numeric attribute becomes one
//! category label. Nominal attributes inside the range keep their training
//! label set so the test set is conformed to it as well.
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::config::UnseenPolicy;
use crate::dataset::{format_number, Attribute, AttributeKind, Dataset, Value};
use crate::error::{PipelineError, Result, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    First,
    Last,
    /// 1-based position.
    Index(usize),
}

impl Bound {
    fn parse(token: &str) -> Option<Bound> {
        match token.trim().to_lowercase().as_str() {
            "first" => Some(Bound::First),
            "last" => Some(Bound::Last),
            other => other.parse::<usize>().ok().filter(|&i| i > 0).map(Bound::Index),
        }
    }

    fn resolve(self, count: usize) -> usize {
        match self {
            Bound::First => 1,
            Bound::Last => count,
            Bound::Index(i) => i,
        }
    }
}

/// A 1-based attribute selection such as `first-last`, `1-3,5` or `last`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRange {
    parts: Vec<(Bound, Bound)>,
}

impl AttributeRange {
    pub fn all() -> Self {
        Self {
            parts: vec![(Bound::First, Bound::Last)],
        }
    }

    /// Resolve to sorted, de-duplicated 0-based indices.
    pub fn indices(&self, attribute_count: usize) -> Result<Vec<usize>> {
        let mut out = Vec::new();
        if attribute_count == 0 {
            return Ok(out);
        }
        for &(start, end) in &self.parts {
            let (lo, hi) = (start.resolve(attribute_count), end.resolve(attribute_count));
            if lo > attribute_count || hi > attribute_count || lo > hi {
                return Err(PipelineError::config(
                    Stage::Coerce,
                    format!(
                        "attribute range {}-{} is outside 1-{}",
                        lo, hi, attribute_count
                    ),
                ));
            }
            out.extend((lo - 1)..hi);
        }
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }
}

impl FromStr for AttributeRange {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PipelineError::config(Stage::Coerce, format!("invalid attribute range '{}'", s));
        let mut parts = Vec::new();
        for piece in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let part = match piece.split_once('-') {
                Some((a, b)) => (
                    Bound::parse(a).ok_or_else(invalid)?,
                    Bound::parse(b).ok_or_else(invalid)?,
                ),
                None => {
                    let bound = Bound::parse(piece).ok_or_else(invalid)?;
                    (bound, bound)
                }
            };
            parts.push(part);
        }
        if parts.is_empty() {
            return Err(invalid());
        }
        Ok(Self { parts })
    }
}

/// Training-derived label set for one coerced attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercedAttribute {
    name: String,
    labels: Vec<String>,
    from_numeric: bool,
    is_class: bool,
}

impl CoercedAttribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Labels observed in training, without the reserved label.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn from_numeric(&self) -> bool {
        self.from_numeric
    }
}

/// Count of unseen test values per attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoercionReport {
    pub unseen: BTreeMap<String, usize>,
}

impl CoercionReport {
    pub fn total(&self) -> usize {
        self.unseen.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoercionMap {
    entries: Vec<CoercedAttribute>,
    unseen_label: String,
    policy: UnseenPolicy,
}

impl CoercionMap {
    /// Fit the mapping on `train` for every Numeric/Nominal attribute in `range`.
    pub fn fit(train: &Dataset, range: &AttributeRange) -> Result<Self> {
        let mut entries = Vec::new();

        for col in range.indices(train.attribute_count())? {
            let attribute = train.attribute(col);
            let labels = match attribute.kind() {
                AttributeKind::Numeric => numeric_labels(train, col)?,
                AttributeKind::Nominal => attribute.labels().to_vec(),
                AttributeKind::String => continue,
            };
            entries.push(CoercedAttribute {
                name: attribute.name().to_string(),
                labels,
                from_numeric: attribute.is_numeric(),
                is_class: Some(col) == train.class_index(),
            });
        }

        Ok(Self {
            entries,
            unseen_label: "other".to_string(),
            policy: UnseenPolicy::MapToReserved,
        })
    }

    pub fn with_unseen_policy(mut self, policy: UnseenPolicy, label: impl Into<String>) -> Self {
        self.policy = policy;
        self.unseen_label = label.into();
        self
    }

    pub fn entries(&self) -> &[CoercedAttribute] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&CoercedAttribute> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn unseen_label(&self) -> &str {
        &self.unseen_label
    }

    fn output_labels(&self, entry: &CoercedAttribute) -> Vec<String> {
        let mut labels = entry.labels.clone();
        if !entry.is_class && !labels.contains(&self.unseen_label) {
            labels.push(self.unseen_label.clone());
        }
        labels
    }

    /// Convert `dataset` with the training-derived labels.
    ///
    /// Unseen non-class values map to the reserved label; unseen class values
    /// become missing. Both are counted in the returned report. Under
    /// [`UnseenPolicy::Fail`] the first unseen value is an error.
    pub fn apply(&self, dataset: &Dataset) -> Result<(Dataset, CoercionReport)> {
        let mut out = dataset.clone();
        let mut report = CoercionReport::default();

        for entry in &self.entries {
            let Some(col) = out.attribute_index(&entry.name) else {
                continue;
            };
            let expected = if entry.from_numeric {
                AttributeKind::Numeric
            } else {
                AttributeKind::Nominal
            };
            let actual = out.attribute(col).kind();
            if actual != expected {
                return Err(PipelineError::config(
                    Stage::Coerce,
                    format!(
                        "attribute '{}' is {} in '{}' but {} in training",
                        entry.name,
                        actual,
                        dataset.name(),
                        expected
                    ),
                ));
            }

            let mut unseen = 0usize;
            for instance in out.instances_mut() {
                let label = match instance.value(col) {
                    Value::Missing => continue,
                    Value::Number(v) => format_number(*v),
                    Value::Text(t) if !entry.from_numeric => t.clone(),
                    Value::Text(t) => {
                        return Err(PipelineError::config(
                            Stage::Coerce,
                            format!(
                                "numeric attribute '{}' holds non-numeric value '{}'",
                                entry.name, t
                            ),
                        ))
                    }
                };

                if entry.labels.contains(&label) {
                    instance.set_value(col, Value::Text(label));
                    continue;
                }

                if self.policy == UnseenPolicy::Fail {
                    return Err(PipelineError::UnseenCategory {
                        attribute: entry.name.clone(),
                        value: label,
                    });
                }
                unseen += 1;
                let mapped = if entry.is_class {
                    Value::Missing
                } else {
                    Value::Text(self.unseen_label.clone())
                };
                instance.set_value(col, mapped);
            }

            out.replace_attribute(col, Attribute::nominal(entry.name.clone(), self.output_labels(entry)));
            if unseen > 0 {
                log::warn!(
                    "{} unseen value(s) of '{}' in '{}' mapped to '{}'",
                    unseen,
                    entry.name,
                    dataset.name(),
                    if entry.is_class { "?" } else { self.unseen_label.as_str() }
                );
                report.unseen.insert(entry.name.clone(), unseen);
            }
        }

        Ok((out, report))
    }
}

fn numeric_labels(train: &Dataset, col: usize) -> Result<Vec<String>> {
    let mut values = Vec::new();
    for value in train.column(col) {
        match value {
            Value::Number(v) => values.push(*v),
            Value::Missing => {}
            Value::Text(t) => {
                return Err(PipelineError::config(
                    Stage::Coerce,
                    format!(
                        "numeric attribute '{}' holds non-numeric value '{}'",
                        train.attribute(col).name(),
                        t
                    ),
                ))
            }
        }
    }
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup();
    Ok(values.into_iter().map(format_number).collect())
}
