use chrono::Utc;
use rand::Rng;

use crate::bookings::BookingType;

/// Generate a human-readable booking id:
/// `{2-letter type prefix}{last 6 digits of unix millis}{3-digit random}`,
/// e.g. `FL123456042`.
///
/// Uniqueness is backed by the database unique index on `booking_id`;
/// the timestamp+random suffix makes collisions vanishingly rare.
pub fn generate_booking_id(booking_type: BookingType) -> String {
    let millis = Utc::now().timestamp_millis().to_string();
    let timestamp = &millis[millis.len().saturating_sub(6)..];
    let random: u32 = rand::thread_rng().gen_range(0..1000);
    format!("{}{}{:03}", booking_type.prefix(), timestamp, random)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_id_shape() {
        let id = generate_booking_id(BookingType::Flight);
        assert_eq!(id.len(), 11);
        assert!(id.starts_with("FL"));
        assert!(id[2..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_prefix_tracks_type() {
        assert!(generate_booking_id(BookingType::Hotel).starts_with("HO"));
        assert!(generate_booking_id(BookingType::Cab).starts_with("CA"));
        assert!(generate_booking_id(BookingType::Package).starts_with("PA"));
    }

    #[test]
    fn test_random_suffix_is_zero_padded() {
        // Over many draws the three-digit suffix must always keep length 11.
        for _ in 0..200 {
            let id = generate_booking_id(BookingType::Cab);
            assert_eq!(id.len(), 11, "unexpected id shape: {}", id);
        }
    }
}
