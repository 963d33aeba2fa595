// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Comprehensive error enum for all possible failures
/// Each variant maps to appropriate HTTP status code and error response
#[derive(Error, Debug)]
pub enum FindamError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Forbidden access")]
    Forbidden,

    #[error("Internal server error")]
    InternalError,

    #[error("Payment gateway error: {0}")]
    PaymentGatewayError(String),

    #[error("Booking conflict: {0}")]
    BookingConflict(String),

    #[error("Service temporarily unavailable")]
    #[allow(dead_code)]
    ServiceUnavailable,
}

/// Convert FindamError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for FindamError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = match self {
            FindamError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            FindamError::AlreadyExists(_) => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
            FindamError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            FindamError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            FindamError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            FindamError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            FindamError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            FindamError::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            FindamError::PaymentGatewayError(_) => (StatusCode::BAD_GATEWAY, "PAYMENT_GATEWAY_ERROR"),
            FindamError::BookingConflict(_) => (StatusCode::CONFLICT, "BOOKING_CONFLICT"),
            FindamError::ServiceUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
        };

        let body = json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            FindamError::NotFound(_) => StatusCode::NOT_FOUND,
            FindamError::AlreadyExists(_) => StatusCode::CONFLICT,
            FindamError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FindamError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            FindamError::ValidationError(_) => StatusCode::BAD_REQUEST,
            FindamError::Unauthorized => StatusCode::UNAUTHORIZED,
            FindamError::Forbidden => StatusCode::FORBIDDEN,
            FindamError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            FindamError::PaymentGatewayError(_) => StatusCode::BAD_GATEWAY,
            FindamError::BookingConflict(_) => StatusCode::CONFLICT,
            FindamError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
