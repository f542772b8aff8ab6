use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_latitude, validate_longitude};

/// Booking product type. The discriminant of the booking payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    Flight,
    Hotel,
    Cab,
    Package,
}

impl BookingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::Flight => "flight",
            BookingType::Hotel => "hotel",
            BookingType::Cab => "cab",
            BookingType::Package => "package",
        }
    }

    /// Two-letter prefix used in human-readable booking ids.
    pub fn prefix(&self) -> &'static str {
        match self {
            BookingType::Flight => "FL",
            BookingType::Hotel => "HO",
            BookingType::Cab => "CA",
            BookingType::Package => "PA",
        }
    }
}

impl std::fmt::Display for BookingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Booking lifecycle status, governed by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    Refunded,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::Refunded => "refunded",
        }
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Pending
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        };
        write!(f, "{}", s)
    }
}

/// Payment methods accepted at intent creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
}

/// Who initiated a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CancelledBy {
    User,
    Admin,
    System,
}

/// State of the refund owed after a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Pending,
    Processed,
    Completed,
    Failed,
}

/// Geographic point used for cab pickup/dropoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A flight passenger captured on the booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_preference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_preference: Option<String>,
}

/// A seat chosen at flight booking time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatSelection {
    pub seat_number: String,
    pub class: String,
    pub price: Decimal,
}

/// Carry-on / checked baggage counts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Baggage {
    pub carry_on: i32,
    pub checked: i32,
}

impl Default for Baggage {
    fn default() -> Self {
        Self {
            carry_on: 1,
            checked: 0,
        }
    }
}

/// Hotel guest counts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GuestCounts {
    pub adults: i32,
    #[serde(default)]
    pub children: i32,
    #[serde(default)]
    pub infants: i32,
}

/// Package traveler pricing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelerType {
    Adult,
    Child,
    Infant,
}

/// A package traveler captured on the booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Traveler {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    #[serde(rename = "type")]
    pub traveler_type: TravelerType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
}

/// Cab pickup point with a scheduled time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupPoint {
    pub address: String,
    pub coordinates: Coordinates,
    pub datetime: DateTime<Utc>,
}

/// Cab dropoff point. Absent for open-ended trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropoffPoint {
    pub address: String,
    pub coordinates: Coordinates,
}

/// Type-specific booking payload. Exactly one variant per booking,
/// keyed by the same discriminant as `Booking::booking_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BookingDetails {
    Flight {
        flight_id: Uuid,
        passengers: Vec<Passenger>,
        #[serde(default)]
        seats: Vec<SeatSelection>,
        #[serde(default)]
        baggage: Baggage,
    },
    Hotel {
        hotel_id: Uuid,
        room_type: String,
        rooms: i32,
        guests: GuestCounts,
        check_in: NaiveDate,
        check_out: NaiveDate,
        #[serde(skip_serializing_if = "Option::is_none")]
        special_requests: Option<String>,
    },
    Cab {
        cab_id: Uuid,
        pickup: PickupPoint,
        #[serde(skip_serializing_if = "Option::is_none")]
        dropoff: Option<DropoffPoint>,
        passengers: i32,
        #[serde(default)]
        luggage: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        special_requests: Option<String>,
    },
    Package {
        package_id: Uuid,
        travelers: Vec<Traveler>,
        departure_date: NaiveDate,
        #[serde(skip_serializing_if = "Option::is_none")]
        return_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        special_requests: Option<String>,
    },
}

impl BookingDetails {
    /// The discriminant matching this payload shape.
    pub fn booking_type(&self) -> BookingType {
        match self {
            BookingDetails::Flight { .. } => BookingType::Flight,
            BookingDetails::Hotel { .. } => BookingType::Hotel,
            BookingDetails::Cab { .. } => BookingType::Cab,
            BookingDetails::Package { .. } => BookingType::Package,
        }
    }
}

/// Price breakdown fixed at booking creation.
/// Invariant: `total == base_price + taxes + fees - discounts`,
/// rounded once to whole currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pricing {
    pub base_price: Decimal,
    pub taxes: Decimal,
    pub fees: Decimal,
    pub discounts: Decimal,
    pub total: Decimal,
    pub currency: String,
}

/// Payment state carried on a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<PaymentMethod>,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

/// Cancellation record. Present exactly when the booking was cancelled.
/// The refund amount is computed once at cancellation time and never
/// recomputed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cancellation {
    pub cancelled_at: DateTime<Utc>,
    pub cancelled_by: CancelledBy,
    pub refund_amount: Decimal,
    pub refund_status: RefundStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<String>,
}

/// The booking aggregate root.
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub booking_id: String,
    pub user_id: i32,
    #[serde(rename = "type")]
    pub booking_type: BookingType,
    pub status: BookingStatus,
    pub product_name: String,
    pub details: BookingDetails,
    pub pricing: Pricing,
    pub payment: PaymentInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<Cancellation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat database row for a booking. Assembled into [`Booking`] via `From`.
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub booking_id: String,
    pub user_id: i32,
    pub booking_type: BookingType,
    pub status: BookingStatus,
    pub product_name: String,
    pub details: Json<BookingDetails>,
    pub base_price: Decimal,
    pub taxes: Decimal,
    pub fees: Decimal,
    pub discounts: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_cancelled: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<CancelledBy>,
    pub refund_amount: Option<Decimal>,
    pub refund_status: Option<RefundStatus>,
    pub refund_reason: Option<String>,
    pub refund_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        let cancellation = if row.is_cancelled {
            Some(Cancellation {
                cancelled_at: row.cancelled_at.unwrap_or(row.updated_at),
                cancelled_by: row.cancelled_by.unwrap_or(CancelledBy::System),
                refund_amount: row.refund_amount.unwrap_or(Decimal::ZERO),
                refund_status: row.refund_status.unwrap_or(RefundStatus::Pending),
                refund_reason: row.refund_reason,
                refund_id: row.refund_id,
            })
        } else {
            None
        };

        Booking {
            id: row.id,
            booking_id: row.booking_id,
            user_id: row.user_id,
            booking_type: row.booking_type,
            status: row.status,
            product_name: row.product_name,
            details: row.details.0,
            pricing: Pricing {
                base_price: row.base_price,
                taxes: row.taxes,
                fees: row.fees,
                discounts: row.discounts,
                total: row.total,
                currency: row.currency,
            },
            payment: PaymentInfo {
                method: row.payment_method,
                status: row.payment_status,
                transaction_id: row.transaction_id,
                payment_intent_id: row.payment_intent_id,
                paid_at: row.paid_at,
            },
            cancellation,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Passenger fields accepted at flight booking time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PassengerRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    #[validate(length(min = 1, message = "Gender is required"))]
    pub gender: String,
    pub passport_number: Option<String>,
    pub nationality: Option<String>,
    pub seat_preference: Option<String>,
    pub meal_preference: Option<String>,
}

impl From<PassengerRequest> for Passenger {
    fn from(req: PassengerRequest) -> Self {
        Passenger {
            first_name: req.first_name,
            last_name: req.last_name,
            date_of_birth: req.date_of_birth,
            gender: req.gender,
            passport_number: req.passport_number,
            nationality: req.nationality,
            seat_preference: req.seat_preference,
            meal_preference: req.meal_preference,
        }
    }
}

/// Request DTO for booking a flight.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFlightBookingRequest {
    pub flight_id: Uuid,
    #[validate(length(min = 1, message = "At least one passenger is required"))]
    pub passengers: Vec<PassengerRequest>,
    #[serde(default)]
    pub seats: Vec<SeatSelection>,
    pub baggage: Option<Baggage>,
    pub special_requests: Option<String>,
}

/// Request DTO for booking a hotel room.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateHotelBookingRequest {
    pub hotel_id: Uuid,
    #[validate(length(min = 1, message = "Room type is required"))]
    pub room_type: String,
    #[validate(range(min = 1, message = "At least one room is required"))]
    pub rooms: i32,
    pub guests: GuestCounts,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub special_requests: Option<String>,
}

/// Location fields accepted at cab booking time.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationRequest {
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(custom = "validate_latitude")]
    pub latitude: f64,
    #[validate(custom = "validate_longitude")]
    pub longitude: f64,
}

impl LocationRequest {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Request DTO for booking a cab.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCabBookingRequest {
    pub cab_id: Uuid,
    pub pickup: LocationRequest,
    pub pickup_datetime: DateTime<Utc>,
    pub dropoff: Option<LocationRequest>,
    #[validate(range(min = 1, message = "At least one passenger is required"))]
    pub passengers: i32,
    #[serde(default)]
    pub luggage: i32,
    pub special_requests: Option<String>,
}

/// Traveler fields accepted at package booking time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TravelerRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    #[validate(length(min = 1, message = "Gender is required"))]
    pub gender: String,
    #[serde(rename = "type")]
    pub traveler_type: TravelerType,
    pub passport_number: Option<String>,
    pub nationality: Option<String>,
}

impl From<TravelerRequest> for Traveler {
    fn from(req: TravelerRequest) -> Self {
        Traveler {
            first_name: req.first_name,
            last_name: req.last_name,
            date_of_birth: req.date_of_birth,
            gender: req.gender,
            traveler_type: req.traveler_type,
            passport_number: req.passport_number,
            nationality: req.nationality,
        }
    }
}

/// Request DTO for booking a package.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePackageBookingRequest {
    pub package_id: Uuid,
    #[validate(length(min = 1, message = "At least one traveler is required"))]
    pub travelers: Vec<TravelerRequest>,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub special_requests: Option<String>,
}

/// Request DTO for cancelling a booking.
#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// Response for a successful booking creation.
#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    pub booking_id: String,
    pub booking: Booking,
}

/// Response for a successful cancellation.
#[derive(Debug, Serialize)]
pub struct CancelBookingResponse {
    pub booking: Booking,
    pub refund_amount: Decimal,
}

/// Pagination block mirrored in list responses.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub current: u32,
    pub pages: u32,
    pub total: i64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let pages = if total == 0 {
            0
        } else {
            ((total as u64).div_ceil(limit.max(1) as u64)) as u32
        };
        Self {
            current: page,
            pages,
            total,
        }
    }
}

/// Response for the paginated booking listing.
#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
    pub pagination: Pagination,
}

/// Per-type booking count in the stats summary.
#[derive(Debug, Serialize, FromRow)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub booking_type: BookingType,
    pub count: i64,
}

/// Per-status booking count in the stats summary.
#[derive(Debug, Serialize, FromRow)]
pub struct StatusCount {
    pub status: BookingStatus,
    pub count: i64,
}

/// Aggregate statistics over a user's bookings.
#[derive(Debug, Serialize)]
pub struct BookingStats {
    pub total_bookings: i64,
    pub total_spent: Decimal,
    pub bookings_by_type: Vec<TypeCount>,
    pub bookings_by_status: Vec<StatusCount>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_details_tag_matches_booking_type() {
        let details = BookingDetails::Cab {
            cab_id: Uuid::new_v4(),
            pickup: PickupPoint {
                address: "1 Main St".to_string(),
                coordinates: Coordinates {
                    latitude: 40.0,
                    longitude: -74.0,
                },
                datetime: Utc::now(),
            },
            dropoff: None,
            passengers: 2,
            luggage: 1,
            special_requests: None,
        };
        assert_eq!(details.booking_type(), BookingType::Cab);

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["type"], "cab");
    }

    #[test]
    fn test_details_roundtrip_preserves_variant() {
        let details = BookingDetails::Package {
            package_id: Uuid::new_v4(),
            travelers: vec![Traveler {
                first_name: "Ana".to_string(),
                last_name: "Silva".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
                gender: "female".to_string(),
                traveler_type: TravelerType::Adult,
                passport_number: None,
                nationality: None,
            }],
            departure_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            return_date: None,
            special_requests: None,
        };

        let json = serde_json::to_string(&details).unwrap();
        let back: BookingDetails = serde_json::from_str(&json).unwrap();
        assert_eq!(back.booking_type(), BookingType::Package);
    }

    #[test]
    fn test_mismatched_tag_is_rejected() {
        // A flight-shaped body claiming to be a hotel must not deserialize.
        let json = serde_json::json!({
            "type": "hotel",
            "flight_id": Uuid::new_v4(),
            "passengers": []
        });
        assert!(serde_json::from_value::<BookingDetails>(json).is_err());
    }

    #[test]
    fn test_booking_type_prefixes() {
        assert_eq!(BookingType::Flight.prefix(), "FL");
        assert_eq!(BookingType::Hotel.prefix(), "HO");
        assert_eq!(BookingType::Cab.prefix(), "CA");
        assert_eq!(BookingType::Package.prefix(), "PA");
    }

    #[test]
    fn test_pagination_page_count() {
        let p = Pagination::new(1, 10, 25);
        assert_eq!(p.pages, 3);
        assert_eq!(p.total, 25);

        let empty = Pagination::new(1, 10, 0);
        assert_eq!(empty.pages, 0);
    }

    #[test]
    fn test_cancellation_assembled_from_row_flags() {
        let row = BookingRow {
            id: Uuid::new_v4(),
            booking_id: "FL123456789".to_string(),
            user_id: 1,
            booking_type: BookingType::Flight,
            status: BookingStatus::Cancelled,
            product_name: "AA 100".to_string(),
            details: Json(BookingDetails::Flight {
                flight_id: Uuid::new_v4(),
                passengers: vec![],
                seats: vec![],
                baggage: Baggage::default(),
            }),
            base_price: dec!(500),
            taxes: dec!(0),
            fees: dec!(0),
            discounts: dec!(0),
            total: dec!(500),
            currency: "USD".to_string(),
            payment_method: None,
            payment_status: PaymentStatus::Pending,
            transaction_id: None,
            payment_intent_id: None,
            paid_at: None,
            is_cancelled: true,
            cancelled_at: Some(Utc::now()),
            cancelled_by: Some(CancelledBy::User),
            refund_amount: Some(dec!(400)),
            refund_status: Some(RefundStatus::Pending),
            refund_reason: Some("change of plans".to_string()),
            refund_id: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let booking: Booking = row.into();
        let cancellation = booking.cancellation.expect("cancellation present");
        assert_eq!(cancellation.refund_amount, dec!(400));
        assert_eq!(cancellation.cancelled_by, CancelledBy::User);
    }

    #[test]
    fn test_flight_request_requires_a_passenger() {
        use validator::Validate;

        let request: CreateFlightBookingRequest = serde_json::from_value(serde_json::json!({
            "flight_id": Uuid::new_v4(),
            "passengers": []
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_package_request_requires_a_traveler() {
        use validator::Validate;

        let request: CreatePackageBookingRequest = serde_json::from_value(serde_json::json!({
            "package_id": Uuid::new_v4(),
            "travelers": [],
            "departure_date": "2025-06-01"
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }
}
