//! Preprocessing stages applied identically to the train and test sets.
//!
//! Every stage that learns something (imputation, coercion) is fitted on the
//! training set only; the fitted object is then applied to both datasets.
pub mod coercion;
pub mod imputer;
pub mod missing;
pub mod schema;

pub use coercion::{AttributeRange, CoercionMap, CoercionReport};
pub use imputer::{Fill, FillStrategy, Imputer};
pub use missing::{normalize_missing, zero_fill_numeric};
pub use schema::{align, conform_target, schema_diff};
