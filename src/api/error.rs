use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::error::AgentError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Agent(err) => match err {
                AgentError::Validation { .. } => StatusCode::BAD_REQUEST,
                AgentError::CapacityExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
                AgentError::ShuttingDown | AgentError::NotReady { .. } => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                AgentError::Initialization { .. } | AgentError::ShutdownTimeout { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn retryable(&self) -> bool {
        match self {
            ApiError::Agent(err) => err.retryable(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "retryable": self.retryable(),
        }));
        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = ApiError::from(AgentError::validation("empty query"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_capacity_maps_to_too_many_requests() {
        let err = ApiError::from(AgentError::CapacityExceeded { active: 4, max: 4 });
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert!(err.retryable());
    }

    #[test]
    fn test_shutdown_maps_to_service_unavailable() {
        let err = ApiError::from(AgentError::ShuttingDown);
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
