use crate::render::RenderError;
use actix_web::http::StatusCode;
use thiserror::Error;

/// Every way a report request can fail. A failure at any stage aborts the
/// whole report; nothing partial is returned.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("'{file}' could not be read as a spreadsheet: {reason}")]
    MalformedInput { file: String, reason: String },

    #[error("sheet '{sheet}' is missing from '{file}'")]
    MissingSheet { file: String, sheet: String },

    #[error("required data source '{0}' was not uploaded")]
    MissingDataSource(String),

    #[error("column '{column}' is missing from sheet '{sheet}'")]
    MissingColumn { sheet: String, column: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report task failed: {0}")]
    Internal(String),
}

impl ReportError {
    pub fn malformed(file: &str, reason: impl ToString) -> Self {
        ReportError::MalformedInput {
            file: file.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Input problems are the caller's to fix (4xx); the rest are ours.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReportError::MalformedInput { .. }
            | ReportError::MissingSheet { .. }
            | ReportError::MissingDataSource(_)
            | ReportError::MissingColumn { .. }
            | ReportError::InvalidRequest(_)
            | ReportError::Upload(_) => StatusCode::BAD_REQUEST,
            ReportError::Render(_) | ReportError::Io(_) | ReportError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<actix_multipart::MultipartError> for ReportError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        ReportError::Upload(err.to_string())
    }
}
