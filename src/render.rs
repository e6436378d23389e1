//! HTML pages: the upload form and the prediction results.

use std::fmt::Write;

use crate::color::ColorMap;
use crate::predict::{ClassSummary, ColumnOutcome, PredictionTable};

/// Marker shown in every cell of a column whose classifier failed.
pub const ERROR_MARKER: &str = "error";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 960px; color: #222; }
h1 { font-size: 1.6rem; }
form { padding: 1rem; border: 1px solid #ccc; border-radius: 6px; background: #fafafa; }
table { border-collapse: collapse; margin-top: 1rem; }
th, td { border: 1px solid #ccc; padding: 0.3rem 0.7rem; text-align: center; }
th { background: #f0f0f0; }
td.failed { background: #fbe3e3; color: #a33; font-style: italic; }
.summary span, .legend span { display: inline-block; margin-right: 1rem; }
.swatch { display: inline-block; width: 0.9em; height: 0.9em; border: 1px solid #999; vertical-align: middle; }
"#;

/// Summary of the upload shown above the results.
#[derive(Debug, Clone, Default)]
pub struct UploadInfo {
    pub file_name: String,
    pub rows: usize,
    pub uploaded_columns: usize,
    pub expected_features: usize,
}

/// The upload form on its own.
pub fn index_page() -> String {
    page("")
}

/// Upload form followed by the prediction results.
pub fn results_page(
    info: &UploadInfo,
    table: &PredictionTable,
    summary: Option<ClassSummary>,
) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<h2>Prediction Result:</h2>");
    let _ = writeln!(
        body,
        "<p>{} – {} rows, {} columns uploaded, model expects {} features.</p>",
        escape(&info.file_name),
        info.rows,
        info.uploaded_columns,
        info.expected_features
    );

    if let Some(summary) = summary {
        let _ = writeln!(
            body,
            "<p class=\"summary\"><span>Class 0: <strong>{}</strong></span><span>Class 1: <strong>{}</strong></span></p>",
            summary.count_0, summary.count_1
        );
    }

    body.push_str(&results_table(table));
    page(&body)
}

/// Render the table: a row-number column followed by one column per key.
pub fn results_table(table: &PredictionTable) -> String {
    let colors = ColorMap::new(
        table
            .columns()
            .iter()
            .filter_map(|c| c.outcome.labels())
            .flatten(),
    );

    let mut html = String::new();
    let legend = colors.legend_entries();
    if !legend.is_empty() {
        html.push_str("<p class=\"legend\">");
        for (label, color) in legend {
            let _ = write!(
                html,
                "<span><span class=\"swatch\" style=\"background:{color}\"></span> {}</span>",
                escape(&label)
            );
        }
        html.push_str("</p>\n");
    }

    html.push_str("<table>\n<thead><tr><th>#</th>");
    for column in table.columns() {
        let _ = write!(html, "<th>{}</th>", escape(&column.key));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for row in 0..table.row_count() {
        let _ = write!(html, "<tr><td>{row}</td>");
        for column in table.columns() {
            match &column.outcome {
                ColumnOutcome::Labels(labels) => {
                    let label = &labels[row];
                    let _ = write!(
                        html,
                        "<td style=\"background:{}\">{}</td>",
                        colors.color_for(label),
                        escape(&label.to_string())
                    );
                }
                ColumnOutcome::Failed { reason } => {
                    let _ = write!(
                        html,
                        "<td class=\"failed\" title=\"{}\">{ERROR_MARKER}</td>",
                        escape(reason)
                    );
                }
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

fn page(content: &str) -> String {
    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>EEG Classifier</title>
<style>{STYLE}</style>
</head>
<body>
<h1>Upload EEG CSV file</h1>
<form action="/predict" method="post" enctype="multipart/form-data">
  <input type="file" name="file" accept=".csv,.json,.parquet"><br><br>
  <input type="submit" value="Upload">
</form>
{content}
</body>
</html>
"#
    )
}

/// Escape text for HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
