use crate::config::MissingSentinels;
use crate::dataset::{Attribute, AttributeKind, Dataset, Value};

/// Rewrite sentinel tokens into `Value::Missing`.
///
/// Numeric attributes are checked against `sentinels.numeric`; Nominal and
/// String attributes against `sentinels.nominal`. Sentinel labels are removed
/// from nominal label sets. Returns a new dataset; the input is untouched.
pub fn normalize_missing(dataset: &Dataset, sentinels: &MissingSentinels) -> Dataset {
    let mut out = dataset.clone();
    let mut rewritten = 0usize;

    for col in 0..out.attribute_count() {
        let attribute = out.attribute(col).clone();
        let is_sentinel = |token: &str| match attribute.kind() {
            AttributeKind::Numeric => sentinels.is_numeric_sentinel(token),
            AttributeKind::Nominal | AttributeKind::String => sentinels.is_nominal_sentinel(token),
        };

        for instance in out.instances_mut() {
            let hit = matches!(instance.value(col), Value::Text(t) if is_sentinel(t.as_str()));
            if hit {
                instance.set_value(col, Value::Missing);
                rewritten += 1;
            }
        }

        if attribute.is_nominal() && attribute.labels().iter().any(|l| is_sentinel(l.as_str())) {
            let labels = attribute
                .labels()
                .iter()
                .filter(|l| !is_sentinel(l.as_str()))
                .cloned()
                .collect();
            out.replace_attribute(col, Attribute::nominal(attribute.name(), labels));
        }
    }

    log::debug!(
        "Normalized {} sentinel cells to missing in '{}'",
        rewritten,
        dataset.name()
    );
    out
}

/// Set every missing numeric cell to zero.
///
/// A blunt policy kept as its own step so it can be switched on or off
/// independently of mean/mode imputation.
pub fn zero_fill_numeric(dataset: &Dataset) -> Dataset {
    let mut out = dataset.clone();
    let numeric: Vec<usize> = (0..out.attribute_count())
        .filter(|&c| out.attribute(c).is_numeric() && Some(c) != out.class_index())
        .collect();

    let mut filled = 0usize;
    for instance in out.instances_mut() {
        for &col in &numeric {
            if instance.value(col).is_missing() {
                instance.set_value(col, Value::Number(0.0));
                filled += 1;
            }
        }
    }
    log::debug!("Zero-filled {} numeric cells in '{}'", filled, dataset.name());
    out
}
