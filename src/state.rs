use crate::classifier::{ModelKind, ModelSet};
use crate::data::align::align;
use crate::data::model::Dataset;
use crate::predict::{aggregate, ClassSummary, PredictionTable, SINGLE_COLUMN};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Everything a request needs, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Classifiers served by this process.
    pub models: ModelSet,
}

/// Output of one prediction request.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub table: PredictionTable,
    /// Class 0/1 counts; single-model mode only.
    pub summary: Option<ClassSummary>,
}

impl AppState {
    pub fn new(models: ModelSet) -> Self {
        Self { models }
    }

    /// Align the upload to the model width and run every classifier.
    pub fn predict(&self, dataset: Dataset) -> Prediction {
        let aligned = align(dataset, self.models.expected_features());
        let table = aggregate(&aligned, self.models.batches());

        let summary = match self.models.kind() {
            ModelKind::Single => table
                .column(SINGLE_COLUMN)
                .and_then(|c| c.outcome.labels())
                .map(ClassSummary::from_labels),
            ModelKind::Ensemble => None,
        };

        Prediction { table, summary }
    }
}
