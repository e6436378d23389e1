use log::debug;

use super::model::Dataset;

/// Prefix of the zero-filled columns appended when an upload is too narrow.
pub const MISSING_COLUMN_PREFIX: &str = "missing_";

/// Reconcile `dataset` to exactly `expected` columns.
///
/// * fewer columns → append `missing_0`, `missing_1`, … filled with `0.0`
/// * more columns  → keep the first `expected` columns, positionally
/// * same width    → returned as is
///
/// Shape mismatch is never an error. Columns are matched by position, not
/// by name, so an upload whose columns are ordered differently from the
/// training data is classified against the wrong features.
pub fn align(mut dataset: Dataset, expected: usize) -> Dataset {
    let width = dataset.column_count();

    if width < expected {
        debug!("padding {} zero columns ({width} → {expected})", expected - width);
        for i in 0..expected - width {
            dataset.push_column(format!("{MISSING_COLUMN_PREFIX}{i}"), 0.0);
        }
    } else if width > expected {
        debug!("truncating {} extra columns ({width} → {expected})", width - expected);
        dataset.truncate_columns(expected);
    }

    dataset
}
