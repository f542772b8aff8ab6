use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::bookings::error::BookingError;
use crate::bookings::models::{
    Booking, BookingDetails, BookingRow, BookingStats, BookingStatus, BookingType, Cancellation,
    PaymentMethod, PaymentStatus, Pricing, StatusCount, TypeCount,
};
use crate::models::{Cab, Flight, HotelRoomOffer, TourPackage};
use crate::query::{BookingQueryBuilder, BOOKING_COLUMNS};

/// Repository for catalog products. The local catalog stands in for the
/// upstream availability+fare quote provider, so lookup failures surface
/// as the retryable `QuoteUnavailable` rather than a plain database error.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

fn quote_unavailable(product: &'static str) -> impl FnOnce(sqlx::Error) -> BookingError {
    move |err| {
        tracing::error!("{} quote lookup failed: {}", product, err);
        BookingError::QuoteUnavailable(product.to_string())
    }
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_flight(&self, id: Uuid) -> Result<Option<Flight>, BookingError> {
        let flight = sqlx::query_as::<_, Flight>(
            r#"
            SELECT id, flight_number, airline, origin, destination, departure_at,
                   base_price, taxes, fees, currency, seats_available
            FROM flights
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(quote_unavailable("flight"))?;

        Ok(flight)
    }

    pub async fn find_room_offer(
        &self,
        hotel_id: Uuid,
        room_type: &str,
    ) -> Result<Option<HotelRoomOffer>, BookingError> {
        let offer = sqlx::query_as::<_, HotelRoomOffer>(
            r#"
            SELECT h.id AS hotel_id, h.name AS hotel_name, h.city,
                   r.room_type, r.base_price, r.taxes, r.fees, r.currency
            FROM hotels h
            JOIN hotel_rooms r ON r.hotel_id = h.id
            WHERE h.id = $1 AND r.room_type = $2
            "#,
        )
        .bind(hotel_id)
        .bind(room_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(quote_unavailable("hotel room"))?;

        Ok(offer)
    }

    pub async fn find_cab(&self, id: Uuid) -> Result<Option<Cab>, BookingError> {
        let cab = sqlx::query_as::<_, Cab>(
            r#"
            SELECT id, vehicle_type, make, model, driver_name,
                   base_rate, per_km_rate, surge_multiplier, currency, is_available
            FROM cabs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(quote_unavailable("cab"))?;

        Ok(cab)
    }

    pub async fn find_package(&self, id: Uuid) -> Result<Option<TourPackage>, BookingError> {
        let package = sqlx::query_as::<_, TourPackage>(
            r#"
            SELECT id, name, destination, duration_days,
                   adult_price, child_price, infant_price, currency,
                   group_min_people, group_discount_percent
            FROM packages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(quote_unavailable("package"))?;

        Ok(package)
    }
}

/// Inventory claimed atomically with booking creation. The decrement and
/// the insert commit or roll back together.
#[derive(Debug, Clone)]
pub enum InventoryClaim {
    FlightSeats { flight_id: Uuid, seats: i32 },
    CabVehicle { cab_id: Uuid },
    None,
}

/// Fields for a new booking row; ids and timestamps come from the database.
#[derive(Debug)]
pub struct NewBooking {
    pub booking_id: String,
    pub user_id: i32,
    pub booking_type: BookingType,
    pub product_name: String,
    pub details: BookingDetails,
    pub pricing: Pricing,
    pub notes: Option<String>,
}

/// Outcome of applying a payment-succeeded event to a booking.
#[derive(Debug)]
pub enum PaymentApplyOutcome {
    /// Booking moved pending -> confirmed.
    Confirmed(Booking),
    /// Payment was already recorded; duplicate delivery, nothing changed.
    AlreadyConfirmed(Booking),
    /// The booking was cancelled before the event arrived; the capture is
    /// recorded so the pending refund can be processed, the cancellation
    /// decision stands.
    CancelledAfterCapture(Booking),
    /// No state change was applicable.
    Unchanged(Booking),
}

/// Repository for booking rows. State transitions are compare-and-swap
/// updates guarded on the current status, so racing writers cannot
/// overwrite a recorded decision.
#[derive(Clone)]
pub struct BookingsRepository {
    pool: PgPool,
}

impl BookingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a booking, claiming inventory in the same transaction.
    /// The decrement is conditional (`seats_available >= n`), never a
    /// read-then-write pair, so concurrent requests cannot oversell.
    pub async fn create(
        &self,
        new: NewBooking,
        claim: InventoryClaim,
    ) -> Result<Booking, BookingError> {
        let mut tx = self.pool.begin().await?;

        match claim {
            InventoryClaim::FlightSeats { flight_id, seats } => {
                let result = sqlx::query(
                    r#"
                    UPDATE flights
                    SET seats_available = seats_available - $1
                    WHERE id = $2 AND seats_available >= $1
                    "#,
                )
                .bind(seats)
                .bind(flight_id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(BookingError::InsufficientAvailability(
                        "Not enough seats available".to_string(),
                    ));
                }
            }
            InventoryClaim::CabVehicle { cab_id } => {
                let result = sqlx::query(
                    "UPDATE cabs SET is_available = FALSE WHERE id = $1 AND is_available = TRUE",
                )
                .bind(cab_id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(BookingError::InsufficientAvailability(
                        "Cab is not available".to_string(),
                    ));
                }
            }
            InventoryClaim::None => {}
        }

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            INSERT INTO bookings
                (booking_id, user_id, booking_type, status, product_name, details,
                 base_price, taxes, fees, discounts, total, currency,
                 payment_status, notes)
            VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, $8, $9, $10, $11, 'pending', $12)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(&new.booking_id)
        .bind(new.user_id)
        .bind(new.booking_type)
        .bind(&new.product_name)
        .bind(Json(&new.details))
        .bind(new.pricing.base_price)
        .bind(new.pricing.taxes)
        .bind(new.pricing.fees)
        .bind(new.pricing.discounts)
        .bind(new.pricing.total)
        .bind(&new.pricing.currency)
        .bind(&new.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Find a booking by its human-readable id, scoped to the owner.
    pub async fn find_for_user(
        &self,
        user_id: i32,
        booking_id: &str,
    ) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE booking_id = $1 AND user_id = $2",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Find a booking by the payment intent recorded on it.
    pub async fn find_by_intent_id(
        &self,
        intent_id: &str,
    ) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE payment_intent_id = $1",
            BOOKING_COLUMNS
        ))
        .bind(intent_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Record the cancellation decision. Compare-and-swap on status: only a
    /// pending or confirmed booking can move to cancelled, so a decision
    /// already recorded by a racing writer is never overwritten.
    /// Returns None when the guard did not match.
    pub async fn mark_cancelled(
        &self,
        id: Uuid,
        cancellation: &Cancellation,
    ) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET status = 'cancelled',
                is_cancelled = TRUE,
                cancelled_at = $2,
                cancelled_by = $3,
                refund_amount = $4,
                refund_status = $5,
                refund_reason = $6,
                updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'confirmed')
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(cancellation.cancelled_at)
        .bind(cancellation.cancelled_by)
        .bind(cancellation.refund_amount)
        .bind(cancellation.refund_status)
        .bind(&cancellation.refund_reason)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Batch transition confirmed -> completed once the service date passes.
    pub async fn mark_completed(&self, id: Uuid) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET status = 'completed', updated_at = NOW()
            WHERE id = $1 AND status = 'confirmed'
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Attach a freshly created payment intent to the booking.
    /// Guarded against bookings that are already paid.
    pub async fn record_payment_intent(
        &self,
        id: Uuid,
        intent_id: &str,
        method: PaymentMethod,
    ) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET payment_intent_id = $2, payment_method = $3, updated_at = NOW()
            WHERE id = $1 AND payment_status <> 'completed'
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(intent_id)
        .bind(method)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Apply a payment-succeeded event. Idempotent under duplicate
    /// delivery, and a cancellation recorded moments earlier is never
    /// reverted to confirmed.
    pub async fn apply_payment_succeeded(
        &self,
        intent_id: &str,
    ) -> Result<Option<PaymentApplyOutcome>, BookingError> {
        // Happy path: pending booking becomes confirmed.
        let confirmed = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET payment_status = 'completed',
                transaction_id = $1,
                paid_at = NOW(),
                status = 'confirmed',
                updated_at = NOW()
            WHERE payment_intent_id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(intent_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = confirmed {
            return Ok(Some(PaymentApplyOutcome::Confirmed(row.into())));
        }

        let Some(booking) = self.find_by_intent_id(intent_id).await? else {
            return Ok(None);
        };

        if booking.status == BookingStatus::Cancelled
            && booking.payment.status == PaymentStatus::Pending
        {
            // The cancellation won the race but money was captured: record
            // the capture so the stored refund can be processed.
            let captured = sqlx::query_as::<_, BookingRow>(&format!(
                r#"
                UPDATE bookings
                SET payment_status = 'completed',
                    transaction_id = $1,
                    paid_at = NOW(),
                    updated_at = NOW()
                WHERE payment_intent_id = $1
                  AND status = 'cancelled'
                  AND payment_status = 'pending'
                RETURNING {}
                "#,
                BOOKING_COLUMNS
            ))
            .bind(intent_id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(row) = captured {
                return Ok(Some(PaymentApplyOutcome::CancelledAfterCapture(row.into())));
            }
        }

        if booking.payment.status == PaymentStatus::Completed {
            return Ok(Some(PaymentApplyOutcome::AlreadyConfirmed(booking)));
        }

        Ok(Some(PaymentApplyOutcome::Unchanged(booking)))
    }

    /// Apply a payment-failed event: the payment is marked failed and a
    /// still-pending booking is cancelled by the system (nothing was
    /// captured, so the refund is zero and immediately settled).
    pub async fn apply_payment_failed(
        &self,
        intent_id: &str,
    ) -> Result<Option<Booking>, BookingError> {
        let failed = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET payment_status = 'failed', updated_at = NOW()
            WHERE payment_intent_id = $1 AND payment_status = 'pending'
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(intent_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = failed else {
            return self.find_by_intent_id(intent_id).await;
        };
        let booking: Booking = row.into();

        if booking.status != BookingStatus::Pending {
            return Ok(Some(booking));
        }

        let cancelled = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET status = 'cancelled',
                is_cancelled = TRUE,
                cancelled_at = NOW(),
                cancelled_by = 'system',
                refund_amount = 0,
                refund_status = 'completed',
                refund_reason = 'Payment failed',
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(Some(cancelled.map(Into::into).unwrap_or(booking)))
    }

    /// Settle a completed provider refund: the stored refund becomes
    /// completed and the booking takes the cancelled -> refunded edge.
    /// Guarded so a second settlement finds no pending refund.
    pub async fn mark_refund_completed(
        &self,
        id: Uuid,
        refund_id: &str,
    ) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET refund_status = 'completed',
                refund_id = $2,
                payment_status = 'refunded',
                status = 'refunded',
                updated_at = NOW()
            WHERE id = $1 AND is_cancelled AND refund_status <> 'completed'
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(refund_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Filtered, paginated listing of a user's bookings, newest first.
    pub async fn list(
        &self,
        user_id: i32,
        builder: &BookingQueryBuilder,
    ) -> Result<(Vec<Booking>, i64), BookingError> {
        let (query_str, params) = builder.build();
        let mut query = sqlx::query_as::<_, BookingRow>(&query_str).bind(user_id);
        for param in &params {
            query = query.bind(param);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let (count_str, params) = builder.build_count();
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_str).bind(user_id);
        for param in &params {
            count_query = count_query.bind(param);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Completed payments for a user, most recently paid first.
    pub async fn payment_history(
        &self,
        user_id: i32,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Booking>, i64), BookingError> {
        let offset = u64::from(page.saturating_sub(1)) * u64::from(limit);
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {} FROM bookings
            WHERE user_id = $1 AND payment_status = 'completed'
            ORDER BY paid_at DESC
            LIMIT {} OFFSET {}
            "#,
            BOOKING_COLUMNS, limit, offset
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookings WHERE user_id = $1 AND payment_status = 'completed'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Aggregate statistics for a user's bookings. Total spend excludes
    /// cancelled bookings (and refunded ones, which were cancelled first).
    pub async fn summary_stats(&self, user_id: i32) -> Result<BookingStats, BookingError> {
        let total_bookings =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let total_spent = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(total), 0)
            FROM bookings
            WHERE user_id = $1 AND status NOT IN ('cancelled', 'refunded')
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let bookings_by_type = sqlx::query_as::<_, TypeCount>(
            r#"
            SELECT booking_type, COUNT(*) AS count
            FROM bookings
            WHERE user_id = $1
            GROUP BY booking_type
            ORDER BY booking_type
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let bookings_by_status = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM bookings
            WHERE user_id = $1
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(BookingStats {
            total_bookings,
            total_spent,
            bookings_by_type,
            bookings_by_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_failures_surface_as_quote_unavailable() {
        let err = quote_unavailable("flight")(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, BookingError::QuoteUnavailable(p) if p == "flight"));
    }
}
