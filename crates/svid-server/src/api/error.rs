//! API error types and responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::NodeError;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Invalid CSR: {0}")]
    InvalidCsr(String),

    #[error("Attestation failed: {0}")]
    AttestationFailed(String),

    #[error("Not entitled: {0}")]
    NotEntitled(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status and stable machine-readable code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::InvalidCsr(_) => (StatusCode::BAD_REQUEST, "INVALID_CSR"),
            ApiError::AttestationFailed(_) => (StatusCode::UNAUTHORIZED, "ATTESTATION_FAILED"),
            ApiError::NotEntitled(_) => (StatusCode::FORBIDDEN, "NOT_ENTITLED"),
            ApiError::SigningFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SIGNING_FAILED"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

/// API error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<NodeError> for ApiError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::Parse(e) => ApiError::InvalidCsr(e.to_string()),
            NodeError::Attestation(msg) => ApiError::AttestationFailed(msg),
            NodeError::NotEntitled(id) => ApiError::NotEntitled(id.to_string()),
            NodeError::Signing(e) => ApiError::SigningFailed(e.to_string()),
            NodeError::NotFound(msg) => ApiError::NotFound(msg),
            err @ (NodeError::DataStore(_) | NodeError::NodeResolution(_)) => {
                ApiError::Unavailable(err.to_string())
            }
        }
    }
}

impl From<svid_core::CoreError> for ApiError {
    fn from(err: svid_core::CoreError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<base64::DecodeError> for ApiError {
    fn from(err: base64::DecodeError) -> Self {
        ApiError::BadRequest(format!("Invalid base64 encoding: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svid_core::SpiffeId;

    #[test]
    fn test_node_error_mapping() {
        let id = SpiffeId::parse("spiffe://example.org/web").unwrap();

        let cases = vec![
            (NodeError::Attestation("bad".into()), StatusCode::UNAUTHORIZED),
            (NodeError::NotEntitled(id), StatusCode::FORBIDDEN),
            (NodeError::NotFound("bundle".into()), StatusCode::NOT_FOUND),
            (NodeError::NodeResolution("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (
                NodeError::Parse(svid_core::CoreError::UriSanCount(0)),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status_and_code().0, expected, "{api}");
        }
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::NotEntitled("spiffe://example.org/web".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
