//! Prediction aggregation: run every classifier over an aligned dataset and
//! collect the labelled outputs into one [`PredictionTable`].

pub mod aggregate;
pub mod summary;

pub use aggregate::{aggregate, ColumnOutcome, PredictionTable, SINGLE_COLUMN};
pub use summary::ClassSummary;
