//! HTTP request handlers

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::Html;
use log::info;

use super::error::{Result, ServerError};
use crate::data::loader::load_upload;
use crate::render::{self, UploadInfo};
use crate::state::{AppState, Prediction};

/// Name of the multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// `GET /` – the upload form.
pub async fn index() -> Html<String> {
    Html(render::index_page())
}

/// `POST /predict` – decode the uploaded file, classify every row and render
/// the results table. Decoding and inference run on the blocking pool.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Html<String>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        if file_name.is_empty() && data.is_empty() {
            return Err(ServerError::NoFile);
        }

        let state = Arc::clone(&state);
        let expected_features = state.models.expected_features();
        let work = move || -> Result<(UploadInfo, Prediction)> {
            let dataset = load_upload(&file_name, &data)?;
            info!(
                "received {file_name} ({} bytes, {} rows × {} columns)",
                data.len(),
                dataset.row_count(),
                dataset.column_count()
            );

            let upload = UploadInfo {
                file_name,
                rows: dataset.row_count(),
                uploaded_columns: dataset.column_count(),
                expected_features,
            };
            Ok((upload, state.predict(dataset)))
        };
        let (upload, prediction) = tokio::task::spawn_blocking(work).await??;

        return Ok(Html(render::results_page(
            &upload,
            &prediction.table,
            prediction.summary,
        )));
    }

    Err(ServerError::NoFile)
}
