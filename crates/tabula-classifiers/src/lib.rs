//! tabula-classifiers: preprocessing, classification and submission
//! pipeline for tabular train/test data.
//!
//! Training statistics (fill values, category maps) are fit once on the
//! training set and applied unchanged to the test set. The fitted data is
//! cross-validated, the model is refit on all training rows, and the test
//! predictions are written into a submission template.
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod stats;
pub mod submission;

pub use error::{PipelineError, Result, Stage};
