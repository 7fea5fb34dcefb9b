use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tabular::TabularError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file was submitted")]
    MissingFile,

    #[error("The submitted file is empty")]
    EmptyFile,

    #[error("Only one file may be submitted")]
    TooManyFiles,

    #[error("{message}")]
    Multipart { status: StatusCode, message: String },

    #[error("Could not parse file as CSV: {0}")]
    Unparseable(TabularError),

    #[error("Missing required columns")]
    MissingColumns,

    #[error("Column {0:?} must contain only numeric values")]
    NonNumeric(String),

    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    #[error("Given token not valid for any token type")]
    InvalidToken,

    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    #[error("Failed to process request")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile
            | ApiError::EmptyFile
            | ApiError::TooManyFiles
            | ApiError::Unparseable(_)
            | ApiError::MissingColumns
            | ApiError::NonNumeric(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart { status, .. } => *status,
            ApiError::Unauthenticated | ApiError::InvalidToken | ApiError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl From<TabularError> for ApiError {
    fn from(e: TabularError) -> Self {
        match e {
            TabularError::NotNumeric(column) => ApiError::NonNumeric(column),
            other => ApiError::Unparseable(other),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        ApiError::Multipart {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl From<axum::extract::multipart::MultipartRejection> for ApiError {
    fn from(e: axum::extract::multipart::MultipartRejection) -> Self {
        ApiError::Multipart {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // internal details stay in the log
        if let ApiError::Internal(e) = &self {
            error!("request failed: {e:?}");
        }

        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
