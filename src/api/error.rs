use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::errors::{CommunicationFailure, ProvisionError};

#[derive(Debug)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: String) -> Self {
        Self { status, message }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.message
            })),
        )
            .into_response()
    }
}

impl From<ProvisionError> for ErrorResponse {
    fn from(err: ProvisionError) -> Self {
        let status = match &err {
            ProvisionError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProvisionError::Allocation(_) => StatusCode::BAD_GATEWAY,
            ProvisionError::UnknownLocation(_) => StatusCode::NOT_FOUND,
            ProvisionError::Communication(CommunicationFailure::UnknownMember(_)) => {
                StatusCode::NOT_FOUND
            }
            ProvisionError::Communication(CommunicationFailure::Delivery { .. }) => {
                StatusCode::BAD_GATEWAY
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<CommunicationFailure> for ErrorResponse {
    fn from(err: CommunicationFailure) -> Self {
        ProvisionError::from(err).into()
    }
}
