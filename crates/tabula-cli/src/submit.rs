//! Loading run configuration and driving the pipeline from files.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use tabula_classifiers::config::{ModelConfig, PipelineConfig};
use tabula_classifiers::dataset::Dataset;
use tabula_classifiers::evaluation::EvaluationResult;
use tabula_classifiers::io::{read_csv, write_csv, CsvReaderConfig};
use tabula_classifiers::pipeline::{Pipeline, PipelineOutcome, PreprocessReport};
use tabula_classifiers::report::EvaluationReport;

use crate::util::validate_tsv_or_csv_file;

/// Everything one `tabula run` or `tabula evaluate` invocation needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub train: Option<PathBuf>,
    pub test: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub output: PathBuf,
    pub pipeline: PipelineConfig,
    pub model: ModelConfig,
    pub report: bool,
    /// Defaults to `tabula_<model>.html` in the working directory.
    pub report_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            train: None,
            test: None,
            template: None,
            output: PathBuf::from("submission.csv"),
            pipeline: PipelineConfig::default(),
            model: ModelConfig::default(),
            report: true,
            report_path: None,
        }
    }
}

impl RunConfig {
    pub fn reader_config(&self) -> CsvReaderConfig {
        CsvReaderConfig {
            numeric_sentinels: self.pipeline.missing.numeric.clone(),
            max_nominal_labels: self.pipeline.max_nominal_labels,
            ..CsvReaderConfig::default()
        }
    }

    pub fn report_path(&self) -> PathBuf {
        self.report_path.clone().unwrap_or_else(|| {
            PathBuf::from(format!("tabula_{}.html", self.model.model_type.name()))
        })
    }
}

/// Load a run configuration from a JSON file.
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: RunConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

fn load_table(path: Option<&PathBuf>, role: &str, reader: &CsvReaderConfig) -> Result<Dataset> {
    let path = path.with_context(|| format!("No {} file given", role))?;
    validate_tsv_or_csv_file(path)?;
    read_csv(path, reader)
}

/// Full run: read train/test/template, run the pipeline and write the
/// submission. Nothing is written unless every stage succeeded.
pub fn run_submission(config: &RunConfig) -> Result<PipelineOutcome> {
    let reader = config.reader_config();
    let train = load_table(config.train.as_ref(), "train", &reader)?;
    let test = load_table(config.test.as_ref(), "test", &reader)?;
    let template = load_table(config.template.as_ref(), "template", &reader)?;

    let pipeline = Pipeline::new(config.pipeline.clone(), config.model.clone());
    let outcome = pipeline
        .run(&train, &test, &template)
        .context("Pipeline failed")?;

    write_csv(&outcome.submission, &config.output)?;
    if config.report {
        write_report(config, &outcome.evaluation, Some(&outcome.report), &outcome.target_name)?;
    }
    Ok(outcome)
}

/// Cross-validation only; returns the evaluation and the target used.
pub fn run_evaluation(config: &RunConfig) -> Result<(EvaluationResult, String)> {
    let reader = config.reader_config();
    let train = load_table(config.train.as_ref(), "train", &reader)?;

    let pipeline = Pipeline::new(config.pipeline.clone(), config.model.clone());
    let (evaluation, prepared) = pipeline.evaluate(&train).context("Evaluation failed")?;
    if config.report {
        write_report(config, &evaluation, Some(&prepared.report), &prepared.target)?;
    }
    Ok((evaluation, prepared.target))
}

pub fn write_report(
    config: &RunConfig,
    evaluation: &EvaluationResult,
    preprocess: Option<&PreprocessReport>,
    target: &str,
) -> Result<()> {
    let mut report = EvaluationReport::new(
        format!("tabula {} report", config.model.model_type.name()),
        target,
        evaluation,
    );
    if let Some(preprocess) = preprocess {
        report = report.with_preprocess(preprocess);
    }
    if let Ok(json) = serde_json::to_string_pretty(config) {
        report = report.with_config_json(json);
    }
    report.save_to_file(config.report_path())
}
