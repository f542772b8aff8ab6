use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::bookings::pricing::{GroupDiscount, PackageRates, Quote};

/// A bookable flight from the product catalog. Stands in for the upstream
/// flight search provider; pricing fields are per seat (economy).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub airline: String,
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTime<Utc>,
    pub base_price: Decimal,
    pub taxes: Decimal,
    pub fees: Decimal,
    pub currency: String,
    pub seats_available: i32,
}

impl Flight {
    pub fn quote(&self) -> Quote {
        Quote {
            base_price: Some(self.base_price),
            taxes: self.taxes,
            fees: self.fees,
            currency: self.currency.clone(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.airline, self.flight_number)
    }
}

/// A hotel room offer joined with its hotel, priced per room-night.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HotelRoomOffer {
    pub hotel_id: Uuid,
    pub hotel_name: String,
    pub city: String,
    pub room_type: String,
    pub base_price: Decimal,
    pub taxes: Decimal,
    pub fees: Decimal,
    pub currency: String,
}

impl HotelRoomOffer {
    pub fn quote(&self) -> Quote {
        Quote {
            base_price: Some(self.base_price),
            taxes: self.taxes,
            fees: self.fees,
            currency: self.currency.clone(),
        }
    }
}

/// A cab from the fleet catalog with its fare parameters.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cab {
    pub id: Uuid,
    pub vehicle_type: String,
    pub make: String,
    pub model: String,
    pub driver_name: String,
    pub base_rate: Decimal,
    pub per_km_rate: Decimal,
    pub surge_multiplier: Decimal,
    pub currency: String,
    pub is_available: bool,
}

impl Cab {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.make, self.model)
    }
}

/// A tour package with per-traveler-type unit prices and optional group
/// discount terms.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TourPackage {
    pub id: Uuid,
    pub name: String,
    pub destination: String,
    pub duration_days: i32,
    pub adult_price: Decimal,
    pub child_price: Decimal,
    pub infant_price: Decimal,
    pub currency: String,
    pub group_min_people: Option<i32>,
    pub group_discount_percent: Option<Decimal>,
}

impl TourPackage {
    pub fn rates(&self) -> PackageRates {
        let group_discount = match (self.group_min_people, self.group_discount_percent) {
            (Some(min_people), Some(discount_percent)) => Some(GroupDiscount {
                min_people,
                discount_percent,
            }),
            _ => None,
        };
        PackageRates {
            adult: self.adult_price,
            child: self.child_price,
            infant: self.infant_price,
            currency: self.currency.clone(),
            group_discount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_package_without_threshold_has_no_group_terms() {
        let pkg = TourPackage {
            id: Uuid::new_v4(),
            name: "Alps Trek".to_string(),
            destination: "Switzerland".to_string(),
            duration_days: 7,
            adult_price: dec!(1200),
            child_price: dec!(800),
            infant_price: dec!(0),
            currency: "USD".to_string(),
            group_min_people: None,
            group_discount_percent: Some(dec!(10)),
        };
        // A percent without a threshold is incomplete and ignored.
        assert!(pkg.rates().group_discount.is_none());
    }

    #[test]
    fn test_flight_quote_carries_unit_prices() {
        let flight = Flight {
            id: Uuid::new_v4(),
            flight_number: "AA100".to_string(),
            airline: "American".to_string(),
            origin: "JFK".to_string(),
            destination: "LAX".to_string(),
            departure_at: Utc::now(),
            base_price: dec!(250),
            taxes: dec!(40),
            fees: dec!(12),
            currency: "USD".to_string(),
            seats_available: 12,
        };
        let quote = flight.quote();
        assert_eq!(quote.base_price, Some(dec!(250)));
        assert_eq!(quote.taxes, dec!(40));
        assert_eq!(flight.display_name(), "American AA100");
    }
}
