use std::fmt;

use thiserror::Error;

use crate::dataset::AttributeKind;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Normalize,
    ZeroFill,
    Impute,
    Coerce,
    Align,
    Train,
    CrossValidate,
    Predict,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Normalize => "normalize",
            Stage::ZeroFill => "zero-fill",
            Stage::Impute => "impute",
            Stage::Coerce => "coerce",
            Stage::Align => "align",
            Stage::Train => "train",
            Stage::CrossValidate => "cross-validate",
            Stage::Predict => "predict",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// Errors raised by the preprocessing, training and evaluation stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error during {stage}: {message}")]
    Configuration { stage: Stage, message: String },

    #[error("train and test schemas differ after alignment\n{0}")]
    SchemaMismatch(SchemaDiff),

    #[error("no fill strategy for attribute '{attribute}': every training value is missing")]
    MissingStrategyUndefined { attribute: String },

    #[error("attribute '{attribute}' has value '{value}' that was never seen in training")]
    UnseenCategory { attribute: String, value: String },
}

impl PipelineError {
    pub fn config(stage: Stage, message: impl Into<String>) -> Self {
        PipelineError::Configuration {
            stage,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// One position of a side-by-side schema comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffRow {
    pub position: usize,
    pub train: Option<(String, AttributeKind)>,
    pub test: Option<(String, AttributeKind)>,
}

impl DiffRow {
    pub fn matches(&self) -> bool {
        self.train == self.test
    }
}

/// Positional diff of the train and test attribute lists.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDiff {
    pub train_count: usize,
    pub test_count: usize,
    pub rows: Vec<DiffRow>,
}

impl SchemaDiff {
    pub fn mismatches(&self) -> impl Iterator<Item = &DiffRow> {
        self.rows.iter().filter(|row| !row.matches())
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "train has {} attributes, test has {}",
            self.train_count, self.test_count
        )?;
        for row in &self.rows {
            let marker = if row.matches() { ' ' } else { '*' };
            let side = |cell: &Option<(String, AttributeKind)>| match cell {
                Some((name, kind)) => format!("{} ({})", name, kind),
                None => String::new(),
            };
            writeln!(
                f,
                "{} {:>4}: {} | {}",
                marker,
                row.position,
                side(&row.train),
                side(&row.test)
            )?;
        }
        Ok(())
    }
}
