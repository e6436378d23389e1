use log::{debug, warn};

use crate::classifier::{Batch, BatchMember};
use crate::data::model::{Dataset, Label};

/// Column name used when a batch member has no name (single-model mode).
pub const SINGLE_COLUMN: &str = "Predicted_Class";

/// Result of running one classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnOutcome {
    /// One label per dataset row, in row order.
    Labels(Vec<Label>),
    /// The classifier failed; every row of this column shows an error marker.
    Failed { reason: String },
}

impl ColumnOutcome {
    pub fn labels(&self) -> Option<&[Label]> {
        match self {
            ColumnOutcome::Labels(labels) => Some(labels),
            ColumnOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ColumnOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionColumn {
    pub key: String,
    pub outcome: ColumnOutcome,
}

/// Ordered result columns, each covering every dataset row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PredictionTable {
    row_count: usize,
    columns: Vec<PredictionColumn>,
}

impl PredictionTable {
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[PredictionColumn] {
        &self.columns
    }

    pub fn column(&self, key: &str) -> Option<&PredictionColumn> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Column keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }
}

/// `Batch{index}_{name}`, or [`SINGLE_COLUMN`] for an unnamed member.
/// `batch_index` counts from 1.
pub fn column_key(batch_index: usize, member: &BatchMember) -> String {
    match &member.name {
        Some(name) => format!("Batch{batch_index}_{name}"),
        None => SINGLE_COLUMN.to_string(),
    }
}

/// Run every batch member over `dataset`, in batch then member order.
///
/// A failing member never aborts the run: its column records the failure and
/// the remaining members still predict. A member returning a label count
/// other than the dataset's row count is treated as failed.
pub fn aggregate(dataset: &Dataset, batches: &[Batch]) -> PredictionTable {
    let row_count = dataset.row_count();
    let mut columns = Vec::new();

    for (i, batch) in batches.iter().enumerate() {
        let batch_index = i + 1;
        for member in &batch.members {
            let key = column_key(batch_index, member);
            let outcome = match member.classifier.predict(dataset) {
                Ok(labels) if labels.len() == row_count => {
                    debug!("{key}: {row_count} predictions");
                    ColumnOutcome::Labels(labels)
                }
                Ok(labels) => {
                    let reason = format!(
                        "returned {} predictions for {row_count} rows",
                        labels.len()
                    );
                    warn!("{key} ({}): {reason}", batch.name);
                    ColumnOutcome::Failed { reason }
                }
                Err(err) => {
                    warn!("{key} ({}) failed: {err}", batch.name);
                    ColumnOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            columns.push(PredictionColumn { key, outcome });
        }
    }

    PredictionTable { row_count, columns }
}
