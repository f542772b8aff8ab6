use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::bookings::BookingError;
use crate::payments::gateway::GatewayError;

/// Errors for payment operations
#[derive(thiserror::Error, Debug)]
pub enum PaymentError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Booking not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Booking is already paid")]
    AlreadyPaid,

    #[error("Booking is not payable: {0}")]
    NotPayable(String),

    #[error("Payment has not succeeded")]
    PaymentNotSucceeded,

    #[error("Booking is not cancelled")]
    NotCancelled,

    #[error("No completed payment to refund")]
    NoPaymentToRefund,

    #[error("Refund already processed")]
    AlreadyRefunded,

    #[error("Payment provider error: {0}")]
    ProviderError(String),

    #[error("Webhook signature verification failed")]
    SignatureVerificationFailed,
}

impl From<sqlx::Error> for PaymentError {
    fn from(err: sqlx::Error) -> Self {
        PaymentError::DatabaseError(err.to_string())
    }
}

impl From<BookingError> for PaymentError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound => PaymentError::NotFound,
            BookingError::DatabaseError(msg) => PaymentError::DatabaseError(msg),
            other => PaymentError::ValidationError(other.to_string()),
        }
    }
}

impl From<GatewayError> for PaymentError {
    fn from(err: GatewayError) -> Self {
        PaymentError::ProviderError(err.to_string())
    }
}

impl PaymentError {
    /// Stable machine-readable identifier for the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            PaymentError::DatabaseError(_) => "DATABASE_ERROR",
            PaymentError::NotFound => "NOT_FOUND",
            PaymentError::ValidationError(_) => "VALIDATION_ERROR",
            PaymentError::AlreadyPaid => "ALREADY_PAID",
            PaymentError::NotPayable(_) => "NOT_PAYABLE",
            PaymentError::PaymentNotSucceeded => "PAYMENT_NOT_SUCCEEDED",
            PaymentError::NotCancelled => "NOT_CANCELLED",
            PaymentError::NoPaymentToRefund => "NO_PAYMENT_TO_REFUND",
            PaymentError::AlreadyRefunded => "ALREADY_REFUNDED",
            PaymentError::ProviderError(_) => "PROVIDER_ERROR",
            PaymentError::SignatureVerificationFailed => "SIGNATURE_VERIFICATION_FAILED",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PaymentError::NotFound => StatusCode::NOT_FOUND,
            PaymentError::ValidationError(_) => StatusCode::BAD_REQUEST,
            PaymentError::AlreadyPaid => StatusCode::BAD_REQUEST,
            PaymentError::NotPayable(_) => StatusCode::BAD_REQUEST,
            PaymentError::PaymentNotSucceeded => StatusCode::BAD_REQUEST,
            PaymentError::NotCancelled => StatusCode::BAD_REQUEST,
            PaymentError::NoPaymentToRefund => StatusCode::BAD_REQUEST,
            PaymentError::AlreadyRefunded => StatusCode::BAD_REQUEST,
            PaymentError::ProviderError(_) => StatusCode::BAD_GATEWAY,
            PaymentError::SignatureVerificationFailed => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details never reach the client.
        let message = match &self {
            PaymentError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                "A database error occurred".to_string()
            }
            PaymentError::ProviderError(msg) => {
                tracing::error!("Payment provider error: {}", msg);
                "Payment provider error".to_string()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PaymentError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            PaymentError::AlreadyPaid.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PaymentError::ProviderError("down".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            PaymentError::SignatureVerificationFailed.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_booking_error_mapping() {
        assert!(matches!(
            PaymentError::from(BookingError::NotFound),
            PaymentError::NotFound
        ));
        assert!(matches!(
            PaymentError::from(BookingError::DatabaseError("x".to_string())),
            PaymentError::DatabaseError(_)
        ));
        assert!(matches!(
            PaymentError::from(BookingError::AlreadyCancelled),
            PaymentError::ValidationError(_)
        ));
    }
}
