//! API error taxonomy (spec.md §7).
//!
//! One `ApiError` per handler failure, serialized as
//! `{success:false, error, code, message, details?}`: `code` is the stable
//! machine-readable identifier a client can switch on, `error` is a short
//! human summary of the error kind, `message` carries the specific detail.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error kinds from spec.md §7, each with a fixed HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFoundError,
    UnauthorizedError,
    ForbiddenError,
    RateLimitExceeded,
    UpstreamError,
    StoreError,
    InternalError,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::NotFoundError => StatusCode::NOT_FOUND,
            ErrorCode::UnauthorizedError => StatusCode::UNAUTHORIZED,
            ErrorCode::ForbiddenError => StatusCode::FORBIDDEN,
            ErrorCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::UpstreamError => StatusCode::BAD_GATEWAY,
            ErrorCode::StoreError => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "Request validation failed",
            ErrorCode::NotFoundError => "Entity not found",
            ErrorCode::UnauthorizedError => "Authentication required",
            ErrorCode::ForbiddenError => "Access forbidden",
            ErrorCode::RateLimitExceeded => "Rate limit exceeded",
            ErrorCode::UpstreamError => "ERP request failed",
            ErrorCode::StoreError => "Store unavailable",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    pub code: ErrorCode,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: code.summary().to_string(),
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFoundError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimitExceeded, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    #[serde(flatten)]
    error: &'a ApiError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = Json(ErrorEnvelope {
            success: false,
            error: &self,
        });
        (status, body).into_response()
    }
}

/// Store reads degrade rather than fail (spec.md §5/§7); only writes
/// surface as `StoreError`.
impl From<prowhey_store::StoreError> for ApiError {
    fn from(err: prowhey_store::StoreError) -> Self {
        tracing::error!(error = %err, "store error");
        ApiError::new(ErrorCode::StoreError, err.to_string())
    }
}

impl From<prowhey_ingest::IngestError> for ApiError {
    fn from(err: prowhey_ingest::IngestError) -> Self {
        tracing::error!(error = %err, "ingest error");
        match err {
            prowhey_ingest::IngestError::ErpRequest(_) => ApiError::upstream(err.to_string()),
            prowhey_ingest::IngestError::Store(e) => e.into(),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<prowhey_core::CoreError> for ApiError {
    fn from(err: prowhey_core::CoreError) -> Self {
        ApiError::internal(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
