//! Writing predictions into a submission template.
use crate::dataset::{Attribute, Dataset, Value};
use crate::error::{PipelineError, Result, Stage};
use crate::models::Classifier;

/// Prediction for the test instance at position `row`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    pub row: usize,
    pub value: Value,
}

/// Predict every test instance, in order.
pub fn predict_rows(model: &dyn Classifier, test: &Dataset) -> Result<Vec<PredictionRow>> {
    test.instances()
        .iter()
        .enumerate()
        .map(|(row, instance)| {
            Ok(PredictionRow {
                row,
                value: model.predict(instance)?,
            })
        })
        .collect()
}

/// Copy `template` with the `target` column replaced by the predictions.
///
/// Row `i` of the output receives `predictions[i]`; every other column
/// passes through unchanged. A numeric target stays numeric when every
/// predicted label parses as a number; otherwise the column becomes nominal
/// over the template labels (if any) followed by the predicted labels.
pub fn write_predictions(
    template: &Dataset,
    predictions: &[PredictionRow],
    target: &str,
) -> Result<Dataset> {
    let col = template.attribute_index(target).ok_or_else(|| {
        PipelineError::config(
            Stage::Write,
            format!("target attribute '{}' is not in template '{}'", target, template.name()),
        )
    })?;
    if predictions.len() != template.instance_count() {
        return Err(PipelineError::config(
            Stage::Write,
            format!(
                "{} predictions for {} template rows",
                predictions.len(),
                template.instance_count()
            ),
        ));
    }
    if let Some((i, p)) = predictions.iter().enumerate().find(|(i, p)| p.row != *i) {
        return Err(PipelineError::config(
            Stage::Write,
            format!("prediction at position {} is for row {}", i, p.row),
        ));
    }

    let attribute = template.attribute(col);
    let numeric = attribute.is_numeric()
        && predictions.iter().all(|p| match &p.value {
            Value::Text(label) => label.trim().parse::<f64>().is_ok(),
            _ => true,
        });

    let mut out = template.clone();
    if numeric {
        for p in predictions {
            let value = match &p.value {
                Value::Text(label) => label
                    .trim()
                    .parse::<f64>()
                    .map_or(Value::Missing, Value::Number),
                other => other.clone(),
            };
            out.set_value(p.row, col, value);
        }
        return Ok(out);
    }

    let mut labels: Vec<String> = attribute.labels().to_vec();
    for p in predictions {
        let value = match &p.value {
            Value::Number(v) => Value::Text(crate::dataset::format_number(*v)),
            other => other.clone(),
        };
        if let Value::Text(label) = &value {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
        out.set_value(p.row, col, value);
    }
    if !attribute.is_nominal() {
        log::info!(
            "Target '{}' in template is {}; writing it as nominal",
            target,
            attribute.kind()
        );
    }
    out.replace_attribute(col, Attribute::nominal(target, labels));
    Ok(out)
}
