//! Train/test schema alignment.
use std::collections::BTreeSet;

use crate::dataset::Dataset;
use crate::error::{DiffRow, PipelineError, Result, SchemaDiff, Stage};

/// Drop String attributes from both datasets and verify the remaining
/// schemas agree position by position (name and kind).
///
/// Removal is two-phase: the names to drop are collected from both datasets
/// first, then each schema is rebuilt once from the retained attributes.
pub fn align(train: &Dataset, test: &Dataset) -> Result<(Dataset, Dataset)> {
    if let Some(class) = train.class_attribute() {
        if class.is_string() {
            return Err(PipelineError::config(
                Stage::Align,
                format!("target attribute '{}' is free text", class.name()),
            ));
        }
    }

    let to_drop: BTreeSet<&str> = train
        .attributes()
        .iter()
        .chain(test.attributes())
        .filter(|a| a.is_string())
        .map(|a| a.name())
        .collect();

    for name in &to_drop {
        log::info!("Removing string attribute: {}", name);
    }

    let keep = |ds: &Dataset| -> Vec<usize> {
        (0..ds.attribute_count())
            .filter(|&c| !to_drop.contains(ds.attribute(c).name()))
            .collect()
    };
    let train_out = train.retain_attributes(&keep(train));
    let mut test_out = test.retain_attributes(&keep(test));

    let diff = schema_diff(&train_out, &test_out);
    if diff.mismatches().next().is_some() {
        return Err(PipelineError::SchemaMismatch(diff));
    }

    if test_out.class_index().is_none() {
        if let Some(class) = train_out.class_attribute() {
            let name = class.name().to_string();
            test_out.set_class(&name)?;
        }
    }

    Ok((train_out, test_out))
}

/// Side-by-side comparison of attribute names and kinds.
pub fn schema_diff(train: &Dataset, test: &Dataset) -> SchemaDiff {
    let width = train.attribute_count().max(test.attribute_count());
    let describe = |ds: &Dataset, i: usize| {
        ds.attributes()
            .get(i)
            .map(|a| (a.name().to_string(), a.kind()))
    };
    SchemaDiff {
        train_count: train.attribute_count(),
        test_count: test.attribute_count(),
        rows: (0..width)
            .map(|i| DiffRow {
                position: i,
                train: describe(train, i),
                test: describe(test, i),
            })
            .collect(),
    }
}

/// Give `test` the training class attribute when it lacks one.
///
/// Inserts an all-missing placeholder column, at the training class
/// position, with the training class definition; an existing all-missing
/// target column adopts that definition. Returns whether a column was
/// inserted. Either way the test class is set to the training class.
pub fn conform_target(test: &mut Dataset, train: &Dataset) -> Result<bool> {
    let Some(class_idx) = train.class_index() else {
        return Err(PipelineError::config(
            Stage::Align,
            format!("dataset '{}' has no target attribute", train.name()),
        ));
    };
    let class = train.attribute(class_idx).clone();

    if let Some(col) = test.attribute_index(class.name()) {
        // an all-missing column carries no kind information of its own
        if test.missing_count(col) == test.instance_count() && test.attribute(col) != &class {
            log::debug!("Adopting training definition of target '{}'", class.name());
            test.replace_attribute(col, class.clone());
        }
    }

    let inserted = if test.attribute_index(class.name()).is_none() {
        log::info!(
            "Adding placeholder target '{}' to '{}' at position {}",
            class.name(),
            test.name(),
            class_idx
        );
        test.insert_attribute(class_idx, class.clone())?;
        true
    } else {
        false
    };
    test.set_class(class.name())?;
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Attribute, Value};

    fn dataset(name: &str, attributes: Vec<Attribute>) -> Dataset {
        let width = attributes.len();
        Dataset::from_rows(name, attributes, vec![vec![Value::Missing; width]]).unwrap()
    }

    #[test]
    fn drops_string_attributes_from_both_sides() {
        let train = dataset(
            "train",
            vec![
                Attribute::numeric("id"),
                Attribute::string("comment"),
                Attribute::string("street"),
                Attribute::numeric("age"),
            ],
        );
        let test = dataset(
            "test",
            vec![
                Attribute::numeric("id"),
                Attribute::string("comment"),
                Attribute::numeric("street"),
                Attribute::numeric("age"),
            ],
        );
        // "street" is free text in train only, so it goes from both
        let (a, b) = align(&train, &test).unwrap();
        assert_eq!(a.attribute_names(), vec!["id", "age"]);
        assert_eq!(b.attribute_names(), vec!["id", "age"]);
    }

    #[test]
    fn missing_column_is_a_schema_mismatch_with_diff() {
        let train = dataset(
            "train",
            vec![
                Attribute::numeric("id"),
                Attribute::nominal("zone", vec![]),
                Attribute::numeric("age"),
                Attribute::numeric("price"),
            ],
        );
        let test = dataset(
            "test",
            vec![
                Attribute::numeric("id"),
                Attribute::nominal("zone", vec![]),
                Attribute::numeric("age"),
            ],
        );
        match align(&train, &test) {
            Err(PipelineError::SchemaMismatch(diff)) => {
                assert_eq!(diff.train_count, 4);
                assert_eq!(diff.test_count, 3);
                let bad: Vec<_> = diff.mismatches().collect();
                assert_eq!(bad.len(), 1);
                assert_eq!(bad[0].position, 3);
                assert!(bad[0].test.is_none());
                let text = diff.to_string();
                assert!(text.contains("price (numeric) |"), "{}", text);
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn kind_difference_is_a_mismatch() {
        let train = dataset("train", vec![Attribute::numeric("age")]);
        let test = dataset("test", vec![Attribute::nominal("age", vec![])]);
        assert!(matches!(
            align(&train, &test),
            Err(PipelineError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn string_target_is_rejected() {
        let mut train = dataset("train", vec![Attribute::string("label")]);
        train.set_class("label").unwrap();
        let test = dataset("test", vec![Attribute::string("label")]);
        assert!(matches!(
            align(&train, &test),
            Err(PipelineError::Configuration { .. })
        ));
    }

    #[test]
    fn conform_target_inserts_placeholder_at_class_position() {
        let mut train = dataset(
            "train",
            vec![
                Attribute::numeric("id"),
                Attribute::numeric("price"),
                Attribute::numeric("age"),
            ],
        );
        train.set_class("price").unwrap();
        let mut test = dataset("test", vec![Attribute::numeric("id"), Attribute::numeric("age")]);

        assert!(conform_target(&mut test, &train).unwrap());
        assert_eq!(test.attribute_names(), vec!["id", "price", "age"]);
        assert_eq!(test.class_index(), Some(1));
        assert!(!conform_target(&mut test, &train).unwrap());

        let (a, b) = align(&train, &test).unwrap();
        assert_eq!(a.class_index(), b.class_index());
    }

    #[test]
    fn empty_target_column_takes_training_kind() {
        let mut train = dataset(
            "train",
            vec![Attribute::numeric("id"), Attribute::nominal("price", vec!["low".into()])],
        );
        train.set_class("price").unwrap();
        let mut test = dataset("test", vec![Attribute::numeric("id"), Attribute::numeric("price")]);

        assert!(!conform_target(&mut test, &train).unwrap());
        assert!(test.attribute(1).is_nominal());
        assert!(align(&train, &test).is_ok());
    }
}
