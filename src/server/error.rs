use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};

use crate::data::loader::LoadError;

/// Request-level failures, rendered as plain text and never as a partial
/// results page. Everything but a lost worker task is the caller's fault.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("No file uploaded")]
    NoFile,
    #[error("Invalid upload: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
    #[error("Could not read uploaded file: {0}")]
    Load(#[from] LoadError),
    #[error("Prediction worker failed")]
    Worker(#[from] tokio::task::JoinError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::Worker(err) => {
                error!("prediction worker failed: {err}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => {
                warn!("rejecting upload: {self}");
                StatusCode::BAD_REQUEST
            }
        };
        (status, self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
