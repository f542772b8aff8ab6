// HTTP handlers for payment endpoints

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    Json,
};

use crate::auth::middleware::AuthenticatedUser;
use crate::payments::{
    ConfirmPaymentRequest, ConfirmPaymentResponse, CreatePaymentIntentRequest,
    CreatePaymentIntentResponse, PaymentError, PaymentHistoryParams, PaymentHistoryResponse,
    RefundRequest, RefundResponse, WebhookAck,
};

/// Handler for POST /api/payments/create-payment-intent
pub async fn create_payment_intent_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreatePaymentIntentRequest>,
) -> Result<Json<CreatePaymentIntentResponse>, PaymentError> {
    let response = state
        .payment_service
        .create_intent(user.user_id, request)
        .await?;

    Ok(Json(response))
}

/// Handler for POST /api/payments/confirm-payment
pub async fn confirm_payment_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<ConfirmPaymentResponse>, PaymentError> {
    let response = state
        .payment_service
        .confirm_payment(user.user_id, request)
        .await?;

    Ok(Json(response))
}

/// Handler for POST /api/payments/refund
pub async fn refund_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(request): Json<RefundRequest>,
) -> Result<Json<RefundResponse>, PaymentError> {
    let response = state
        .payment_service
        .issue_refund(user.user_id, request)
        .await?;

    Ok(Json(response))
}

/// Handler for GET /api/payments/history
pub async fn payment_history_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PaymentHistoryParams>,
) -> Result<Json<PaymentHistoryResponse>, PaymentError> {
    let response = state
        .payment_service
        .payment_history(user.user_id, &params)
        .await?;

    Ok(Json(response))
}

/// Handler for POST /api/payments/webhook
/// Unauthenticated transport; authenticity comes from the signature
/// over the raw body, so the body must not be deserialized first.
pub async fn webhook_handler(
    State(state): State<crate::AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, PaymentError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());

    state.payment_service.handle_webhook(signature, &body).await?;

    Ok(Json(WebhookAck { received: true }))
}
