use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use validator::Validate;

use crate::bookings::{
    BookingStatus, BookingsRepository, Pagination, PaymentApplyOutcome, PaymentStatus, RefundStatus,
};
use crate::payments::error::PaymentError;
use crate::payments::gateway::{GatewayError, IntentMetadata, IntentStatus, PaymentGateway};
use crate::payments::models::{
    ConfirmPaymentRequest, ConfirmPaymentResponse, CreatePaymentIntentRequest,
    CreatePaymentIntentResponse, PaymentHistoryParams, PaymentHistoryResponse, RefundRequest,
    RefundResponse,
};
use crate::payments::webhook::{self, WebhookEvent};

/// Upper bound on any single provider call. A hung provider surfaces as
/// a retryable provider error rather than a stuck request.
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Convert a whole-unit amount to the provider's minor units (cents).
pub(crate) fn to_minor_units(amount: Decimal) -> Result<i64, PaymentError> {
    (amount * Decimal::from(100))
        .to_i64()
        .ok_or_else(|| PaymentError::ValidationError("Amount out of range".to_string()))
}

/// Service for payment business logic
#[derive(Clone)]
pub struct PaymentService {
    bookings_repo: BookingsRepository,
    gateway: Arc<dyn PaymentGateway>,
    webhook_secret: String,
}

impl PaymentService {
    pub fn new(
        bookings_repo: BookingsRepository,
        gateway: Arc<dyn PaymentGateway>,
        webhook_secret: String,
    ) -> Self {
        Self {
            bookings_repo,
            gateway,
            webhook_secret,
        }
    }

    async fn with_timeout<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, PaymentError> {
        match tokio::time::timeout(GATEWAY_TIMEOUT, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(PaymentError::ProviderError(
                "Payment provider timed out".to_string(),
            )),
        }
    }

    /// Create a payment intent for a pending booking and attach it to
    /// the row. The amount always comes from the stored pricing, never
    /// from the client.
    pub async fn create_intent(
        &self,
        user_id: i32,
        request: CreatePaymentIntentRequest,
    ) -> Result<CreatePaymentIntentResponse, PaymentError> {
        request
            .validate()
            .map_err(|e| PaymentError::ValidationError(e.to_string()))?;

        let booking = self
            .bookings_repo
            .find_for_user(user_id, &request.booking_id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        if booking.payment.status == PaymentStatus::Completed {
            return Err(PaymentError::AlreadyPaid);
        }
        match booking.status {
            BookingStatus::Cancelled | BookingStatus::Refunded => {
                return Err(PaymentError::NotPayable(
                    "Booking is cancelled".to_string(),
                ));
            }
            BookingStatus::Completed => {
                return Err(PaymentError::NotPayable(
                    "Booking is completed".to_string(),
                ));
            }
            BookingStatus::Pending | BookingStatus::Confirmed => {}
        }

        let amount_minor = to_minor_units(booking.pricing.total)?;
        let metadata = IntentMetadata {
            booking_id: booking.booking_id.clone(),
            user_id,
        };
        let intent = self
            .with_timeout(self.gateway.create_intent(
                amount_minor,
                &booking.pricing.currency,
                &metadata,
            ))
            .await?;

        self.bookings_repo
            .record_payment_intent(booking.id, &intent.id, request.payment_method)
            .await?
            .ok_or(PaymentError::AlreadyPaid)?;

        tracing::info!(
            booking_id = %booking.booking_id,
            intent_id = %intent.id,
            "payment intent created"
        );

        Ok(CreatePaymentIntentResponse {
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            amount: booking.pricing.total,
            currency: booking.pricing.currency,
        })
    }

    /// Client-driven confirmation: check the intent with the provider
    /// and apply the success transition. Safe to call more than once.
    pub async fn confirm_payment(
        &self,
        user_id: i32,
        request: ConfirmPaymentRequest,
    ) -> Result<ConfirmPaymentResponse, PaymentError> {
        request
            .validate()
            .map_err(|e| PaymentError::ValidationError(e.to_string()))?;

        let intent = self
            .with_timeout(self.gateway.retrieve_intent(&request.payment_intent_id))
            .await?;

        if intent.status != IntentStatus::Succeeded {
            return Err(PaymentError::PaymentNotSucceeded);
        }

        // Ownership is checked before any state is touched; a caller
        // holding someone else's intent id never triggers the transition.
        let owner = self
            .bookings_repo
            .find_by_intent_id(&intent.id)
            .await?
            .ok_or(PaymentError::NotFound)?;
        if owner.user_id != user_id {
            return Err(PaymentError::NotFound);
        }

        let outcome = self
            .bookings_repo
            .apply_payment_succeeded(&intent.id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        let booking = match outcome {
            PaymentApplyOutcome::Confirmed(b) => {
                tracing::info!(booking_id = %b.booking_id, "payment confirmed");
                b
            }
            PaymentApplyOutcome::AlreadyConfirmed(b) | PaymentApplyOutcome::Unchanged(b) => b,
            PaymentApplyOutcome::CancelledAfterCapture(b) => {
                tracing::warn!(
                    booking_id = %b.booking_id,
                    "payment captured for a cancelled booking, refund pending"
                );
                b
            }
        };

        Ok(ConfirmPaymentResponse { booking })
    }

    /// Process a refund for a cancelled booking with a completed payment.
    /// The amount is the one stored at cancellation time; it is never
    /// recomputed here.
    pub async fn issue_refund(
        &self,
        user_id: i32,
        request: RefundRequest,
    ) -> Result<RefundResponse, PaymentError> {
        request
            .validate()
            .map_err(|e| PaymentError::ValidationError(e.to_string()))?;

        let booking = self
            .bookings_repo
            .find_for_user(user_id, &request.booking_id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        let cancellation = booking
            .cancellation
            .as_ref()
            .ok_or(PaymentError::NotCancelled)?;

        if cancellation.refund_status == RefundStatus::Completed {
            return Err(PaymentError::AlreadyRefunded);
        }
        if booking.payment.status != PaymentStatus::Completed {
            return Err(PaymentError::NoPaymentToRefund);
        }
        let intent_id = booking
            .payment
            .payment_intent_id
            .as_deref()
            .ok_or(PaymentError::NoPaymentToRefund)?;

        let refund_amount = cancellation.refund_amount;
        let receipt = self
            .with_timeout(
                self.gateway
                    .create_refund(intent_id, to_minor_units(refund_amount)?),
            )
            .await?;

        let updated = self
            .bookings_repo
            .mark_refund_completed(booking.id, &receipt.id)
            .await?
            .ok_or(PaymentError::AlreadyRefunded)?;

        tracing::info!(
            booking_id = %updated.booking_id,
            refund_id = %receipt.id,
            refund_amount = %refund_amount,
            "refund processed"
        );

        Ok(RefundResponse {
            refund_id: receipt.id,
            refund_amount,
            booking: updated,
        })
    }

    /// Completed payments for the user, newest paid first.
    pub async fn payment_history(
        &self,
        user_id: i32,
        params: &PaymentHistoryParams,
    ) -> Result<PaymentHistoryResponse, PaymentError> {
        let (payments, total) = self
            .bookings_repo
            .payment_history(user_id, params.page(), params.limit())
            .await?;

        Ok(PaymentHistoryResponse {
            payments,
            pagination: Pagination::new(params.page(), params.limit(), total),
        })
    }

    /// Verify and apply a webhook delivery.
    ///
    /// Event application is idempotent, so the sender can retry freely;
    /// events for unknown intents are acknowledged and logged rather
    /// than bounced, since a retry will not make them known.
    pub async fn handle_webhook(
        &self,
        signature_header: Option<&str>,
        body: &[u8],
    ) -> Result<(), PaymentError> {
        let header = signature_header.ok_or(PaymentError::SignatureVerificationFailed)?;
        webhook::verify_signature(&self.webhook_secret, header, body, Utc::now().timestamp())?;

        let event = WebhookEvent::parse(body)?;
        self.apply_event(&event).await
    }

    async fn apply_event(&self, event: &WebhookEvent) -> Result<(), PaymentError> {
        let intent_id = event.intent_id();

        match event.event_type.as_str() {
            "payment_intent.succeeded" => {
                match self.bookings_repo.apply_payment_succeeded(intent_id).await? {
                    Some(PaymentApplyOutcome::Confirmed(b)) => {
                        tracing::info!(booking_id = %b.booking_id, "webhook: payment confirmed");
                    }
                    Some(PaymentApplyOutcome::AlreadyConfirmed(b)) => {
                        tracing::debug!(
                            booking_id = %b.booking_id,
                            "webhook: duplicate success event ignored"
                        );
                    }
                    Some(PaymentApplyOutcome::CancelledAfterCapture(b)) => {
                        tracing::warn!(
                            booking_id = %b.booking_id,
                            "webhook: capture recorded on cancelled booking, refund pending"
                        );
                    }
                    Some(PaymentApplyOutcome::Unchanged(b)) => {
                        tracing::debug!(booking_id = %b.booking_id, "webhook: no transition");
                    }
                    None => {
                        tracing::warn!(intent_id, "webhook: success event for unknown intent");
                    }
                }
            }
            "payment_intent.payment_failed" => {
                match self.bookings_repo.apply_payment_failed(intent_id).await? {
                    Some(b) => {
                        tracing::info!(
                            booking_id = %b.booking_id,
                            status = b.status.as_str(),
                            "webhook: payment failed"
                        );
                    }
                    None => {
                        tracing::warn!(intent_id, "webhook: failure event for unknown intent");
                    }
                }
            }
            other => {
                tracing::debug!(event_type = other, "webhook: ignoring event type");
            }
        }

        Ok(())
    }
}
