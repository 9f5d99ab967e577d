//! End-to-end preprocessing, evaluation and prediction.
use std::collections::BTreeMap;

use crate::config::{ModelConfig, PipelineConfig};
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result, Stage};
use crate::evaluation::cross_validation::CrossValidation;
use crate::evaluation::EvaluationResult;
use crate::models::{build_model, Classifier};
use crate::preprocessing::{
    align, conform_target, normalize_missing, zero_fill_numeric, AttributeRange, CoercionMap,
    Imputer,
};
use crate::submission::{predict_rows, write_predictions};

/// What preprocessing did to the data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreprocessReport {
    /// Training attribute count after each stage, in stage order.
    pub attribute_counts: Vec<(Stage, usize)>,
    /// String attributes removed during alignment.
    pub dropped: Vec<String>,
    /// Test values mapped away from unseen categories, per attribute.
    pub unseen: BTreeMap<String, usize>,
    /// The test set lacked the target and received a placeholder column.
    pub placeholder_target: bool,
}

impl PreprocessReport {
    fn record(&mut self, stage: Stage, train: &Dataset) {
        log::info!("attributes after {}: {}", stage, train.attribute_count());
        self.attribute_counts.push((stage, train.attribute_count()));
    }
}

/// Preprocessed, aligned train and test sets.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub train: Dataset,
    pub test: Option<Dataset>,
    pub target: String,
    pub report: PreprocessReport,
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub evaluation: EvaluationResult,
    pub submission: Dataset,
    pub report: PreprocessReport,
    pub target_name: String,
}

pub struct Pipeline {
    config: PipelineConfig,
    model: ModelConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, model: ModelConfig) -> Self {
        Self { config, model }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn model_config(&self) -> &ModelConfig {
        &self.model
    }

    /// Run every preprocessing stage. Statistics and category maps are fit
    /// on `train` only and applied unchanged to `test`.
    pub fn prepare(&self, train: &Dataset, test: Option<&Dataset>) -> Result<Prepared> {
        if train.is_empty() {
            return Err(PipelineError::config(
                Stage::Load,
                format!("training set '{}' has no instances", train.name()),
            ));
        }
        let mut report = PreprocessReport::default();

        let target = match &self.config.target_attribute {
            Some(name) => name.clone(),
            None => train
                .attributes()
                .last()
                .map(|a| a.name().to_string())
                .ok_or_else(|| {
                    PipelineError::config(Stage::Load, "training set has no attributes")
                })?,
        };
        let mut train = train.clone();
        train.set_class(&target)?;
        log::info!("Using '{}' as the target attribute", target);
        report.record(Stage::Load, &train);

        // sentinels must be Missing before the test target can adopt the
        // training definition
        let sentinels = &self.config.missing;
        train = normalize_missing(&train, sentinels);
        let mut test = match test {
            Some(t) => {
                let mut t = normalize_missing(t, sentinels);
                report.placeholder_target = conform_target(&mut t, &train)?;
                Some(t)
            }
            None => None,
        };
        report.record(Stage::Normalize, &train);

        if self.config.zero_fill_numeric {
            train = zero_fill_numeric(&train);
            test = test.map(|t| zero_fill_numeric(&t));
            report.record(Stage::ZeroFill, &train);
        }

        let imputer = Imputer::fit(&train)?;
        train = imputer.apply(&train)?;
        test = test.map(|t| imputer.apply(&t)).transpose()?;
        report.record(Stage::Impute, &train);

        let range: AttributeRange = self.config.coerce_range.parse()?;
        let coercion = CoercionMap::fit(&train, &range)?
            .with_unseen_policy(self.config.unseen_policy, self.config.unseen_label.as_str());
        train = coercion.apply(&train)?.0;
        if let Some(t) = test.take() {
            let (coerced, unseen) = coercion.apply(&t)?;
            if unseen.total() > 0 {
                log::info!(
                    "Mapped {} unseen test values to '{}'",
                    unseen.total(),
                    coercion.unseen_label()
                );
            }
            report.unseen = unseen.unseen;
            test = Some(coerced);
        }
        report.record(Stage::Coerce, &train);

        let before: Vec<String> = train.attribute_names().iter().map(|n| n.to_string()).collect();
        let (aligned_train, aligned_test) = match &test {
            Some(t) => {
                let (a, b) = align(&train, t)?;
                (a, Some(b))
            }
            None => (align(&train, &train)?.0, None),
        };
        report.dropped = before
            .into_iter()
            .filter(|n| aligned_train.attribute_index(n).is_none())
            .collect();
        report.record(Stage::Align, &aligned_train);

        Ok(Prepared {
            train: aligned_train,
            test: aligned_test,
            target,
            report,
        })
    }

    fn cross_validation(&self) -> CrossValidation {
        CrossValidation::new(self.config.folds, self.config.seed).stratified(self.config.stratify)
    }

    /// Preprocess `train` on its own and cross-validate the configured model.
    pub fn evaluate(&self, train: &Dataset) -> Result<(EvaluationResult, Prepared)> {
        let prepared = self.prepare(train, None)?;
        let factory = || build_model(&self.model);
        let evaluation = self.cross_validation().run(&prepared.train, &factory)?;
        log::info!(
            "Cross-validated accuracy: {:.4}% ({} of {})",
            evaluation.pct_correct(),
            evaluation.correct(),
            evaluation.total()
        );
        Ok((evaluation, prepared))
    }

    /// Full run: preprocess, cross-validate, fit on all training data,
    /// predict the test set and fill the template's target column.
    pub fn run(&self, train: &Dataset, test: &Dataset, template: &Dataset) -> Result<PipelineOutcome> {
        let prepared = self.prepare(train, Some(test))?;
        let Prepared {
            train,
            test,
            target,
            report,
        } = prepared;
        let test = test.ok_or_else(|| {
            PipelineError::config(Stage::Predict, "no test set after preprocessing")
        })?;

        let factory = || build_model(&self.model);
        let evaluation = self.cross_validation().run(&train, &factory)?;
        log::info!(
            "Cross-validated accuracy: {:.4}% ({} of {})",
            evaluation.pct_correct(),
            evaluation.correct(),
            evaluation.total()
        );

        let mut model: Box<dyn Classifier> = build_model(&self.model);
        model.fit(&train.without_missing_class())?;
        log::info!(
            "Fitted {} on {} training instances",
            model.name(),
            train.instance_count()
        );

        let predictions = predict_rows(model.as_ref(), &test)?;
        let submission = write_predictions(template, &predictions, &target)?;

        Ok(PipelineOutcome {
            evaluation,
            submission,
            report,
            target_name: target,
        })
    }
}
