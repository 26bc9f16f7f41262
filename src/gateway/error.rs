use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::LADDER_STATUS_HEADER;
use crate::service::RankError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no entity named '{name}'")]
    NameNotFound { name: String },

    #[error(transparent)]
    Rank(#[from] RankError),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl GatewayError {
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::NameNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            GatewayError::Rank(err) => match err {
                RankError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
                RankError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                RankError::AlreadyExists { .. }
                | RankError::Store(StoreError::DuplicateId { .. })
                | RankError::Store(StoreError::DuplicateName { .. }) => {
                    (StatusCode::CONFLICT, "conflict")
                }
                RankError::Store(StoreError::Unavailable(_)) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
                }
                RankError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "store_timeout"),
                RankError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            },
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, ladder_status) = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            LADDER_STATUS_HEADER,
            HeaderValue::from_static(ladder_status),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
