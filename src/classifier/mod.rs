//! Classifier handles and the model manifest that supplies them.
//!
//! A [`Classifier`] is an opaque, read-only inference unit: it reports how
//! many features it was trained on and maps a [`Dataset`] to one [`Label`]
//! per row. Handles are loaded once at start-up and shared between requests
//! through `Arc`, so implementations must be `Send + Sync`.

pub mod estimator;
pub mod manifest;

pub use manifest::{load_models, Batch, BatchMember, ModelKind, ModelSet};

use crate::data::model::{Dataset, Label};

/// Errors a classifier may signal while predicting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("expected {expected} features but the input has {actual}")]
    FeatureMismatch { expected: usize, actual: usize },
    #[error("row {row}, column {column} is not a finite number")]
    NonFinite { row: usize, column: usize },
    #[error("{0}")]
    Internal(String),
}

/// An opaque pre-trained inference unit.
pub trait Classifier: Send + Sync {
    /// Number of feature columns this model was trained on.
    fn expected_features(&self) -> usize;

    /// Predict one label per dataset row, in row order.
    fn predict(&self, dataset: &Dataset) -> Result<Vec<Label>, ClassifierError>;
}

/// Check that `dataset` is exactly `expected` columns wide and all finite.
pub(crate) fn check_input(dataset: &Dataset, expected: usize) -> Result<(), ClassifierError> {
    if dataset.column_count() != expected {
        return Err(ClassifierError::FeatureMismatch {
            expected,
            actual: dataset.column_count(),
        });
    }
    for (row, cells) in dataset.rows().iter().enumerate() {
        if let Some(column) = cells.iter().position(|v| !v.is_finite()) {
            return Err(ClassifierError::NonFinite { row, column });
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted classifier handles for aggregator and server tests.

    use super::*;

    /// Returns the same label for every row.
    pub struct Constant {
        pub features: usize,
        pub label: Label,
    }

    impl Classifier for Constant {
        fn expected_features(&self) -> usize {
            self.features
        }

        fn predict(&self, dataset: &Dataset) -> Result<Vec<Label>, ClassifierError> {
            check_input(dataset, self.features)?;
            Ok(vec![self.label.clone(); dataset.row_count()])
        }
    }

    /// Replays a fixed label sequence regardless of input.
    pub struct Scripted(pub Vec<Label>);

    impl Classifier for Scripted {
        fn expected_features(&self) -> usize {
            0
        }

        fn predict(&self, _dataset: &Dataset) -> Result<Vec<Label>, ClassifierError> {
            Ok(self.0.clone())
        }
    }

    /// Always fails.
    pub struct Broken;

    impl Classifier for Broken {
        fn expected_features(&self) -> usize {
            0
        }

        fn predict(&self, _dataset: &Dataset) -> Result<Vec<Label>, ClassifierError> {
            Err(ClassifierError::Internal("model file corrupted".into()))
        }
    }
}
