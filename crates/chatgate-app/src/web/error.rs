use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use chatgate_llm_api::{AdapterError, MissingCredential};
use chatgate_models::{UnknownModel, ValidationError};

/// Failures answered with a JSON body before any stream byte is sent
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    UnknownModel(#[from] UnknownModel),
    #[error(transparent)]
    MissingCredential(#[from] MissingCredential),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Adapter(AdapterError::UnsupportedProvider(_)) => StatusCode::BAD_REQUEST,
            GatewayError::UnknownModel(_)
            | GatewayError::MissingCredential(_)
            | GatewayError::Adapter(AdapterError::Open { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "chat request failed: {}", message);
        } else {
            tracing::warn!(status = status.as_u16(), "chat request rejected: {}", message);
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
