use crate::relay::upstream::RemoteError;
use crate::types::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("model is required")]
    MissingModel,

    #[error("message is required")]
    MissingMessage,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingModel | RelayError::MissingMessage => StatusCode::BAD_REQUEST,
            RelayError::Remote(remote) => remote_status(remote.status),
        }
    }
}

/// Upstream status if it is a usable error status, otherwise 500.
fn remote_status(status: Option<u16>) -> StatusCode {
    status
        .and_then(|code| StatusCode::from_u16(code).ok())
        .filter(|code| code.is_client_error() || code.is_server_error())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            RelayError::Remote(remote) => tracing::error!(
                upstream_status = ?remote.status,
                "Remote generation failed: {} (status: {})",
                self,
                status
            ),
            _ => tracing::debug!("Rejected chat request: {}", self),
        }

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
