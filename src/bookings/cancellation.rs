use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::bookings::models::BookingType;
use crate::bookings::pricing::round_money;

/// Refund computed by the cancellation policy for one point in time.
/// Once stored on a booking it is a fixed fact and is never recomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refund {
    pub amount: Decimal,
    pub fraction: Decimal,
}

/// Tiered cancellation policy.
///
/// Tiers key off days elapsed since the booking was *created*, not days
/// until the service date. That is the upstream business rule and is kept
/// as-is; see DESIGN.md for the stakeholder flag.
pub struct CancellationPolicy;

impl CancellationPolicy {
    /// Compute the refund owed for cancelling `booking_type` at `now`,
    /// given the creation time and the booked total. Pure and
    /// deterministic; the caller applies the result to the booking.
    pub fn compute_refund(
        booking_type: BookingType,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
        total: Decimal,
    ) -> Refund {
        let days = Self::days_elapsed(created_at, now);
        let fraction = Self::refund_fraction(booking_type, days);
        Refund {
            amount: round_money(total * fraction),
            fraction,
        }
    }

    /// Elapsed days since creation, rounded up (a booking cancelled any
    /// time within its first 24h counts as 1 day).
    pub fn days_elapsed(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let millis = (now - created_at).num_milliseconds();
        (millis as f64 / 86_400_000.0).ceil() as i64
    }

    /// The refund fraction for a booking type at a given elapsed-day count.
    pub fn refund_fraction(booking_type: BookingType, days_elapsed: i64) -> Decimal {
        match booking_type {
            BookingType::Flight => {
                if days_elapsed >= 7 {
                    Decimal::new(80, 2)
                } else if days_elapsed >= 3 {
                    Decimal::new(50, 2)
                } else {
                    Decimal::new(20, 2)
                }
            }
            BookingType::Hotel => {
                if days_elapsed >= 7 {
                    Decimal::new(90, 2)
                } else if days_elapsed >= 3 {
                    Decimal::new(70, 2)
                } else {
                    Decimal::new(30, 2)
                }
            }
            BookingType::Cab => {
                if days_elapsed >= 1 {
                    Decimal::new(80, 2)
                } else {
                    Decimal::new(50, 2)
                }
            }
            BookingType::Package => {
                if days_elapsed >= 14 {
                    Decimal::new(90, 2)
                } else if days_elapsed >= 7 {
                    Decimal::new(70, 2)
                } else {
                    Decimal::new(40, 2)
                }
            }
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn booking_type_strategy() -> impl Strategy<Value = BookingType> {
        prop_oneof![
            Just(BookingType::Flight),
            Just(BookingType::Hotel),
            Just(BookingType::Cab),
            Just(BookingType::Package),
        ]
    }

    /// Refund monotonicity: earlier cancellation (more elapsed days) never
    /// yields a smaller fraction than a later-tier cancellation; i.e. the
    /// fraction is non-decreasing in elapsed days.
    #[test]
    fn prop_refund_fraction_monotonic_in_days() {
        proptest!(|(
            booking_type in booking_type_strategy(),
            d1 in 0i64..=30,
            d2 in 0i64..=30
        )| {
            let (lo, hi) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            let f_lo = CancellationPolicy::refund_fraction(booking_type, lo);
            let f_hi = CancellationPolicy::refund_fraction(booking_type, hi);
            prop_assert!(f_lo <= f_hi, "fraction decreased from day {} to {}", lo, hi);
        });
    }

    /// Refund never exceeds the booked total and is never negative.
    #[test]
    fn prop_refund_bounded_by_total() {
        proptest!(|(
            booking_type in booking_type_strategy(),
            days in 0i64..=60,
            total_units in 0u32..=1_000_000u32
        )| {
            let created = Utc::now();
            let now = created + chrono::Duration::days(days);
            let total = Decimal::from(total_units);
            let refund = CancellationPolicy::compute_refund(booking_type, created, now, total);
            prop_assert!(refund.amount >= Decimal::ZERO);
            prop_assert!(refund.amount <= total);
        });
    }
}
