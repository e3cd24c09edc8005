use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::error::Error as _;

use crate::error::CatalogError;

/// Error returned by the HTTP handlers
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.status.as_u16(),
                "message": self.message,
            }
        }));
        (self.status, body).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message = format!("{message}: {cause}");
            source = cause.source();
        }

        tracing::error!(status = status.as_u16(), error = %message, "Failed to query plugins");
        Self::new(status, message)
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_bad_request() {
        let err = ApiError::from(CatalogError::InvalidFilter {
            reason: "page must not be negative".to_string(),
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("page must not be negative"));
    }

    #[test]
    fn test_upstream_errors_map_to_internal_error() {
        let err = ApiError::from(CatalogError::Source {
            index: 1,
            source: Box::new(CatalogError::UpstreamStatus {
                url: "http://upstream.invalid/api/v1/plugins".to_string(),
                status: 502,
            }),
        });
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("source 1"));
        assert!(err.message.contains("502"));
    }
}
