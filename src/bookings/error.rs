use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for booking operations
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Booking not found")]
    NotFound,

    #[error("{0} not found")]
    ProductNotFound(&'static str),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Quote is missing a base price")]
    MissingQuote,

    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("Insufficient availability: {0}")]
    InsufficientAvailability(String),

    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),
}

impl From<sqlx::Error> for BookingError {
    fn from(err: sqlx::Error) -> Self {
        BookingError::DatabaseError(err.to_string())
    }
}

impl BookingError {
    /// Stable machine-readable identifier for the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            BookingError::DatabaseError(_) => "DATABASE_ERROR",
            BookingError::NotFound => "NOT_FOUND",
            BookingError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            BookingError::ValidationError(_) => "VALIDATION_ERROR",
            BookingError::InvalidQuantity(_) => "INVALID_QUANTITY",
            BookingError::MissingQuote => "MISSING_QUOTE",
            BookingError::QuoteUnavailable(_) => "QUOTE_UNAVAILABLE",
            BookingError::InsufficientAvailability(_) => "INSUFFICIENT_AVAILABILITY",
            BookingError::AlreadyCancelled => "ALREADY_CANCELLED",
            BookingError::InvalidState(_) => "INVALID_STATE",
            BookingError::InvalidTransition(_) => "INVALID_TRANSITION",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BookingError::NotFound => StatusCode::NOT_FOUND,
            BookingError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            BookingError::ValidationError(_) => StatusCode::BAD_REQUEST,
            BookingError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
            BookingError::MissingQuote => StatusCode::BAD_GATEWAY,
            BookingError::QuoteUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            BookingError::InsufficientAvailability(_) => StatusCode::CONFLICT,
            BookingError::AlreadyCancelled => StatusCode::BAD_REQUEST,
            BookingError::InvalidState(_) => StatusCode::BAD_REQUEST,
            BookingError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details never reach the client.
        let message = match &self {
            BookingError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                "A database error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error_code": self.error_code(),
            "error": message,
        }));

        (status, body).into_response()
    }
}
