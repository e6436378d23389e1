use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, RaggedRow};

/// Reasons an uploaded file could not be turned into a [`Dataset`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("malformed Parquet: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("row {row}, column '{column}': '{value}' is not a number")]
    NotNumeric {
        row: usize,
        column: String,
        value: String,
    },
    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedColumn { column: String, data_type: String },
    #[error("{0}")]
    Shape(String),
    #[error(transparent)]
    Ragged(#[from] RaggedRow),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Decode an uploaded file into a numeric dataset.  Dispatch by extension.
///
/// Supported formats:
/// * `.json`    – `[{ "alpha": 0.4, "beta": 1.2, ... }, ...]`
/// * `.parquet` – flat Int32/Int64/Float32/Float64 columns
/// * anything else, including no extension, is read as CSV: a header row,
///   then one numeric cell per column
pub fn load_upload(file_name: &str, data: &[u8]) -> Result<Dataset, LoadError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "json" => load_json(data),
        "parquet" | "pq" => load_parquet(data),
        _ => load_csv(data),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, every other cell a float.
/// Rows with a different number of cells than the header are rejected by
/// the reader itself. An upload without even a header row is rejected.
pub fn load_csv(data: &[u8]) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() {
        return Err(LoadError::Shape("empty CSV: no header row".into()));
    }

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let row = record
            .iter()
            .enumerate()
            .map(|(col_idx, cell)| {
                parse_cell(cell).ok_or_else(|| LoadError::NotNumeric {
                    row: row_no,
                    column: headers.get(col_idx).cloned().unwrap_or_default(),
                    value: cell.to_string(),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push(row);
    }

    Ok(Dataset::new(headers, rows)?)
}

fn parse_cell(s: &str) -> Option<f64> {
    s.parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "delta": 12.1, "theta": 4.2, "alpha": 7.7 },
///   ...
/// ]
/// ```
///
/// Column order follows the first record; later records must carry exactly
/// the same keys.
fn load_json(data: &[u8]) -> Result<Dataset, LoadError> {
    let root: JsonValue = serde_json::from_slice(data)?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::Shape("expected a top-level JSON array".into()))?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::Shape(format!("record {i} is not a JSON object")))?;

        if i == 0 {
            headers = obj.keys().cloned().collect();
        } else if obj.len() != headers.len() {
            return Err(RaggedRow {
                row: i,
                expected: headers.len(),
                actual: obj.len(),
            }
            .into());
        }

        let row = headers
            .iter()
            .map(|key| {
                let value = obj.get(key).ok_or_else(|| {
                    LoadError::Shape(format!("record {i} is missing column '{key}'"))
                })?;
                value.as_f64().ok_or_else(|| LoadError::NotNumeric {
                    row: i,
                    column: key.clone(),
                    value: value.to_string(),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push(row);
    }

    Ok(Dataset::new(headers, rows)?)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file whose columns are all numeric features.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(data: &[u8]) -> Result<Dataset, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::copy_from_slice(data))?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let columns = batch
            .columns()
            .iter()
            .zip(&headers)
            .map(|(col, name)| numeric_column(col, name))
            .collect::<Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            rows.push(columns.iter().map(|col| col[row]).collect());
        }
    }

    Ok(Dataset::new(headers, rows)?)
}

/// Widen one Arrow column to `f64`; nulls become NaN.
fn numeric_column(col: &Arc<dyn Array>, name: &str) -> Result<Vec<f64>, LoadError> {
    let any = col.as_any();
    let values = match col.data_type() {
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| a.iter().map(|v| v.unwrap_or(f64::NAN)).collect()),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| a.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect()),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| a.iter().map(|v| v.map_or(f64::NAN, |i| i as f64)).collect()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| a.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect()),
        _ => None,
    };

    values.ok_or_else(|| LoadError::UnsupportedColumn {
        column: name.to_string(),
        data_type: format!("{:?}", col.data_type()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use rstest::rstest;

    #[test]
    fn csv_with_header_and_numeric_rows() {
        let ds = load_upload("eeg.csv", b"alpha,beta\n1.5, 2\n-3,4e-1\n").unwrap();
        assert_eq!(ds.column_names(), &["alpha", "beta"].map(String::from));
        assert_eq!(ds.rows(), &[vec![1.5, 2.0], vec![-3.0, 0.4]]);
    }

    #[test]
    fn csv_header_only_yields_empty_rows() {
        let ds = load_upload("eeg.CSV", b"a,b,c\n").unwrap();
        assert_eq!(ds.row_count(), 0);
        assert_eq!(ds.column_count(), 3);
    }

    #[test]
    fn csv_non_numeric_cell_is_reported() {
        let err = load_upload("eeg.csv", b"a,b\n1,oops\n").unwrap_err();
        match err {
            LoadError::NotNumeric { row, column, value } => {
                assert_eq!((row, column.as_str(), value.as_str()), (0, "b", "oops"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn csv_ragged_row_is_rejected() {
        assert!(matches!(
            load_upload("eeg.csv", b"a,b\n1,2\n3\n"),
            Err(LoadError::Csv(_))
        ));
    }

    #[rstest]
    #[case("features.txt")]
    #[case("features")]
    #[case("eeg.CSV")]
    fn other_extensions_are_read_as_csv(#[case] name: &str) {
        let ds = load_upload(name, b"a,b\n1,2\n").unwrap();
        assert_eq!(ds.column_names(), &["a", "b"].map(String::from));
        assert_eq!(ds.rows(), &[vec![1.0, 2.0]]);
    }

    #[rstest]
    #[case(b"".as_slice())]
    #[case(b"\n".as_slice())]
    fn csv_without_header_is_rejected(#[case] data: &[u8]) {
        assert!(matches!(load_upload("eeg.csv", data), Err(LoadError::Shape(_))));
    }

    #[test]
    fn json_records_keep_first_record_key_order() {
        let ds = load_upload("eeg.json", br#"[{"b": 1, "a": 2.5}, {"a": 4, "b": 3}]"#).unwrap();
        assert_eq!(ds.column_names(), &["b", "a"].map(String::from));
        assert_eq!(ds.rows(), &[vec![1.0, 2.5], vec![3.0, 4.0]]);
    }

    #[test]
    fn json_non_numeric_value_is_rejected() {
        assert!(matches!(
            load_upload("eeg.json", br#"[{"a": "x"}]"#),
            Err(LoadError::NotNumeric { .. })
        ));
    }

    fn parquet_bytes(batch: &RecordBatch) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
        buf
    }

    #[test]
    fn parquet_numeric_columns_are_widened() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("alpha", DataType::Float64, false),
            Field::new("count", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float64Array::from(vec![0.5, 1.5])),
                Arc::new(Int64Array::from(vec![2, 3])),
            ],
        )
        .unwrap();

        let ds = load_upload("eeg.parquet", &parquet_bytes(&batch)).unwrap();
        assert_eq!(ds.column_names(), &["alpha", "count"].map(String::from));
        assert_eq!(ds.rows(), &[vec![0.5, 2.0], vec![1.5, 3.0]]);
    }

    #[test]
    fn parquet_string_column_is_rejected() {
        let schema = Arc::new(Schema::new(vec![Field::new("subject", DataType::Utf8, false)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(vec!["s01"]))]).unwrap();

        assert!(matches!(
            load_upload("eeg.parquet", &parquet_bytes(&batch)),
            Err(LoadError::UnsupportedColumn { .. })
        ));
    }
}
