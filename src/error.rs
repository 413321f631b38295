use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::AnalysisError;
use crate::sources::ProviderError;
use crate::types::{FailureKind, ParameterError};

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AppError::BadRequest(_) | AppError::Parameter(_) => {
                FailureKind::UnsupportedConfiguration
            }
            AppError::Provider(e) => e.kind(),
            AppError::Analysis(e) => e.kind(),
            AppError::Internal(_) | AppError::Anyhow(_) => FailureKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        status_for(self.kind())
    }
}

/// HTTP status for a failure kind.
pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::UnsupportedConfiguration => StatusCode::BAD_REQUEST,
        FailureKind::DataUnavailable => StatusCode::NOT_FOUND,
        FailureKind::InsufficientData => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::ProviderUnavailable => StatusCode::BAD_GATEWAY,
        FailureKind::CapabilityUnavailable => StatusCode::NOT_IMPLEMENTED,
        FailureKind::ModelFailure | FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            tracing::error!(kind = ?kind, "Request failed: {}", self);
        }

        let body = Json(json!({
            "success": false,
            "error": kind,
            "message": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
