use crate::dataset::{Dataset, Instance, Value};
use crate::error::Result;
use crate::models::utils::argmax;

/// Contract every model used by the pipeline satisfies.
///
/// `fit` receives a dataset with a nominal class attribute; rows whose class
/// is missing are ignored and instance weights are honoured. `predict` and
/// `distribution` accept instances laid out exactly like the training data.
pub trait Classifier: Send {
    fn fit(&mut self, train: &Dataset) -> Result<()>;

    /// Class probabilities, ordered like [`Classifier::class_labels`].
    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>>;

    /// Class labels of the fitted model; empty before `fit`.
    fn class_labels(&self) -> &[String];

    /// Most probable class label.
    fn predict(&self, instance: &Instance) -> Result<Value> {
        let dist = self.distribution(instance)?;
        let labels = self.class_labels();
        if labels.is_empty() {
            return Ok(Value::Missing);
        }
        Ok(Value::Text(labels[argmax(&dist)].clone()))
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
