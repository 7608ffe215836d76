use crate::debug::debug_helpers::log_error_details;
use crate::domain::generation::GenerationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip)]
    pub status_code: StatusCode,
}

impl ErrorResponse {
    pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            status_code,
        }
    }
}

impl From<GenerationError> for ErrorResponse {
    fn from(error: GenerationError) -> Self {
        if error.is_client_error() {
            warn!("Rejected generation request: {}", error);
            return Self::new(StatusCode::BAD_REQUEST, error.to_string());
        }

        error!("Error during generation: {}", error);
        log_error_details(&error, "generate");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}
