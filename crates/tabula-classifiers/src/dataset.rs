//! In-memory tabular dataset: ordered attributes, weighted rows and an
//! optional class attribute.
//!
//! Cells are stored as [`Value`]s. Nominal and String attributes both hold
//! `Value::Text`; the attribute kind decides how the text is interpreted.
//! A Numeric attribute may temporarily hold raw sentinel text (e.g. `"NA"`)
//! between loading and missing-value normalization.
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Numeric,
    Nominal,
    String,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttributeKind::Numeric => f.write_str("numeric"),
            AttributeKind::Nominal => f.write_str("nominal"),
            AttributeKind::String => f.write_str("string"),
        }
    }
}

/// A named column. Nominal attributes carry their ordered label set.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
    labels: Vec<String>,
}

impl Attribute {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Numeric,
            labels: Vec::new(),
        }
    }

    pub fn nominal(name: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Nominal,
            labels,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::String,
            labels: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Ordered category labels; empty for non-nominal attributes.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == AttributeKind::Numeric
    }

    pub fn is_nominal(&self) -> bool {
        self.kind == AttributeKind::Nominal
    }

    pub fn is_string(&self) -> bool {
        self.kind == AttributeKind::String
    }
}

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Number(v) => f.write_str(&format_number(*v)),
            Value::Text(s) => f.write_str(s),
            Value::Missing => f.write_str("?"),
        }
    }
}

/// Render a number the way it is written in CSV files and category labels:
/// integral values without a fractional part.
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// One row. Owned by exactly one [`Dataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    values: Vec<Value>,
    weight: f64,
}

impl Instance {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            weight: 1.0,
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, col: usize) -> &Value {
        &self.values[col]
    }

    pub fn set_value(&mut self, col: usize, value: Value) {
        self.values[col] = value;
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    attributes: Vec<Attribute>,
    instances: Vec<Instance>,
    class_index: Option<usize>,
}

impl Dataset {
    /// Create an empty dataset. Attribute names must be unique.
    pub fn new(name: impl Into<String>, attributes: Vec<Attribute>) -> Result<Self> {
        let name = name.into();
        let mut seen = HashSet::new();
        for attribute in &attributes {
            if !seen.insert(attribute.name()) {
                return Err(PipelineError::config(
                    Stage::Load,
                    format!(
                        "dataset '{}' has duplicate attribute '{}'",
                        name,
                        attribute.name()
                    ),
                ));
            }
        }
        Ok(Self {
            name,
            attributes,
            instances: Vec::new(),
            class_index: None,
        })
    }

    /// Convenience constructor from rows of values.
    pub fn from_rows(
        name: impl Into<String>,
        attributes: Vec<Attribute>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self> {
        let mut dataset = Self::new(name, attributes)?;
        for row in rows {
            dataset.push(Instance::new(row))?;
        }
        Ok(dataset)
    }

    pub fn push(&mut self, instance: Instance) -> Result<()> {
        if instance.len() != self.attributes.len() {
            return Err(PipelineError::config(
                Stage::Load,
                format!(
                    "row {} of '{}' has {} values but the dataset has {} attributes",
                    self.instances.len(),
                    self.name,
                    instance.len(),
                    self.attributes.len()
                ),
            ));
        }
        self.instances.push(instance);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, col: usize) -> &Attribute {
        &self.attributes[col]
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name() == name)
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name()).collect()
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn instance(&self, row: usize) -> &Instance {
        &self.instances[row]
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn value(&self, row: usize, col: usize) -> &Value {
        self.instances[row].value(col)
    }

    pub fn set_value(&mut self, row: usize, col: usize, value: Value) {
        self.instances[row].set_value(col, value);
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = &Value> + '_ {
        self.instances.iter().map(move |inst| inst.value(col))
    }

    pub fn class_index(&self) -> Option<usize> {
        self.class_index
    }

    pub fn class_attribute(&self) -> Option<&Attribute> {
        self.class_index.map(|idx| &self.attributes[idx])
    }

    /// Designate the class attribute by name.
    pub fn set_class(&mut self, name: &str) -> Result<usize> {
        let idx = self.attribute_index(name).ok_or_else(|| {
            PipelineError::config(
                Stage::Load,
                format!("target attribute '{}' is not in dataset '{}'", name, self.name),
            )
        })?;
        self.class_index = Some(idx);
        Ok(idx)
    }

    pub fn clear_class(&mut self) {
        self.class_index = None;
    }

    /// Class value of `row`, `None` when no class attribute is set.
    pub fn class_value(&self, row: usize) -> Option<&Value> {
        self.class_index.map(|idx| self.instances[row].value(idx))
    }

    /// Replace the attribute definition at `col`, keeping cell values.
    pub fn replace_attribute(&mut self, col: usize, attribute: Attribute) {
        self.attributes[col] = attribute;
    }

    /// Insert `attribute` at `position`, filling every row with `Missing`.
    pub fn insert_attribute(&mut self, position: usize, attribute: Attribute) -> Result<()> {
        if self.attribute_index(attribute.name()).is_some() {
            return Err(PipelineError::config(
                Stage::Align,
                format!(
                    "attribute '{}' already exists in '{}'",
                    attribute.name(),
                    self.name
                ),
            ));
        }
        let position = position.min(self.attributes.len());
        self.attributes.insert(position, attribute);
        for instance in &mut self.instances {
            instance.values.insert(position, Value::Missing);
        }
        if let Some(idx) = self.class_index {
            if idx >= position {
                self.class_index = Some(idx + 1);
            }
        }
        Ok(())
    }

    /// Rebuild the dataset keeping only the attributes at `keep` (in order).
    /// The class attribute is dropped from the designation if it is not kept.
    pub fn retain_attributes(&self, keep: &[usize]) -> Dataset {
        let attributes = keep.iter().map(|&c| self.attributes[c].clone()).collect();
        let instances = self
            .instances
            .iter()
            .map(|inst| Instance {
                values: keep.iter().map(|&c| inst.values[c].clone()).collect(),
                weight: inst.weight,
            })
            .collect();
        let class_index = self
            .class_index
            .and_then(|idx| keep.iter().position(|&c| c == idx));
        Dataset {
            name: self.name.clone(),
            attributes,
            instances,
            class_index,
        }
    }

    /// Subset of rows in the given order, sharing the schema.
    pub fn select_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            instances: rows.iter().map(|&r| self.instances[r].clone()).collect(),
            class_index: self.class_index,
        }
    }

    /// Drop rows whose class value is missing. No-op without a class attribute.
    pub fn without_missing_class(&self) -> Dataset {
        let Some(idx) = self.class_index else {
            return self.clone();
        };
        let rows: Vec<usize> = (0..self.instances.len())
            .filter(|&r| !self.instances[r].value(idx).is_missing())
            .collect();
        self.select_rows(&rows)
    }

    /// Copy of the dataset with per-row weights replaced.
    pub fn with_weights(&self, weights: &[f64]) -> Dataset {
        let mut out = self.clone();
        for (instance, &w) in out.instances.iter_mut().zip(weights) {
            instance.weight = w;
        }
        out
    }

    /// Count of missing cells in column `col`.
    pub fn missing_count(&self, col: usize) -> usize {
        self.column(col).filter(|v| v.is_missing()).count()
    }

    pub(crate) fn instances_mut(&mut self) -> &mut [Instance] {
        &mut self.instances
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_rows(
            "sample",
            vec![
                Attribute::numeric("id"),
                Attribute::nominal("zone", vec!["A".into(), "B".into()]),
                Attribute::string("note"),
            ],
            vec![
                vec![Value::Number(1.0), Value::text("A"), Value::text("x")],
                vec![Value::Number(2.0), Value::Missing, Value::text("y")],
                vec![Value::Number(3.0), Value::text("B"), Value::Missing],
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_attribute_names() {
        let result = Dataset::new(
            "dup",
            vec![Attribute::numeric("a"), Attribute::numeric("a")],
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_rows_with_wrong_arity() {
        let mut ds = sample();
        assert!(ds.push(Instance::new(vec![Value::Number(4.0)])).is_err());
    }

    #[test]
    fn retain_attributes_remaps_class_index() {
        let mut ds = sample();
        ds.set_class("zone").unwrap();
        let kept = ds.retain_attributes(&[1, 2]);
        assert_eq!(kept.attribute_names(), vec!["zone", "note"]);
        assert_eq!(kept.class_index(), Some(0));

        let dropped = ds.retain_attributes(&[0, 2]);
        assert_eq!(dropped.class_index(), None);
    }

    #[test]
    fn insert_attribute_shifts_class_and_fills_missing() {
        let mut ds = sample();
        ds.set_class("note").unwrap();
        ds.insert_attribute(1, Attribute::numeric("age")).unwrap();
        assert_eq!(ds.class_index(), Some(3));
        assert!(ds.column(1).all(|v| v.is_missing()));
    }

    #[test]
    fn without_missing_class_drops_unlabeled_rows() {
        let mut ds = sample();
        ds.set_class("zone").unwrap();
        let labeled = ds.without_missing_class();
        assert_eq!(labeled.instance_count(), 2);
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(format_number(20.0), "20");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(Value::Missing.to_string(), "?");
    }
}
