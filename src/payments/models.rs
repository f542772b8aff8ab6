use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::bookings::{Booking, Pagination, PaymentMethod};

/// Request DTO for POST /api/payments/create-payment-intent.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentIntentRequest {
    #[validate(length(min = 1, message = "Booking id is required"))]
    pub booking_id: String,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub struct CreatePaymentIntentResponse {
    pub payment_intent_id: String,
    pub client_secret: String,
    pub amount: Decimal,
    pub currency: String,
}

/// Request DTO for POST /api/payments/confirm-payment.
#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    #[validate(length(min = 1, message = "Payment intent id is required"))]
    pub payment_intent_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmPaymentResponse {
    pub booking: Booking,
}

/// Request DTO for POST /api/payments/refund.
#[derive(Debug, Deserialize, Validate)]
pub struct RefundRequest {
    #[validate(length(min = 1, message = "Booking id is required"))]
    pub booking_id: String,
}

#[derive(Debug, Serialize)]
pub struct RefundResponse {
    pub refund_id: String,
    pub refund_amount: Decimal,
    pub booking: Booking,
}

/// Query parameters for GET /api/payments/history.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentHistoryParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PaymentHistoryParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentHistoryResponse {
    pub payments: Vec<Booking>,
    pub pagination: Pagination,
}

/// Acknowledgement body returned to the webhook sender.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}
