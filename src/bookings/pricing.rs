use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::bookings::error::BookingError;
use crate::bookings::models::{Coordinates, Pricing, TravelerType};

/// Mean Earth radius in kilometres, used by the haversine fare distance.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A per-unit quote sourced from the product catalog.
#[derive(Debug, Clone)]
pub struct Quote {
    pub base_price: Option<Decimal>,
    pub taxes: Decimal,
    pub fees: Decimal,
    pub currency: String,
}

/// Per-traveler-type unit prices for a package, with an optional
/// group discount.
#[derive(Debug, Clone)]
pub struct PackageRates {
    pub adult: Decimal,
    pub child: Decimal,
    pub infant: Decimal,
    pub currency: String,
    pub group_discount: Option<GroupDiscount>,
}

impl PackageRates {
    fn unit_price(&self, traveler_type: TravelerType) -> Decimal {
        match traveler_type {
            TravelerType::Adult => self.adult,
            TravelerType::Child => self.child,
            TravelerType::Infant => self.infant,
        }
    }
}

/// Group discount terms: applies when the traveler count reaches
/// `min_people`.
#[derive(Debug, Clone)]
pub struct GroupDiscount {
    pub min_people: i32,
    pub discount_percent: Decimal,
}

/// Round a currency amount to whole units, half away from zero.
/// The catalog quotes whole-unit prices, so rounding happens once,
/// on the final total.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Service for deriving a booking's price breakdown from a catalog
/// quote and the product-specific quantity multipliers. Pure: no I/O,
/// no side effects.
pub struct PricingCalculator;

impl PricingCalculator {
    /// Flight pricing: per-seat quote multiplied by the passenger count.
    pub fn flight(quote: &Quote, passengers: usize) -> Result<Pricing, BookingError> {
        if passengers == 0 {
            return Err(BookingError::InvalidQuantity(
                "At least one passenger is required".to_string(),
            ));
        }
        let base = quote.base_price.ok_or(BookingError::MissingQuote)?;
        let n = Decimal::from(passengers as u64);

        Ok(Self::compose(
            base * n,
            quote.taxes * n,
            quote.fees * n,
            Decimal::ZERO,
            &quote.currency,
        ))
    }

    /// Hotel pricing: per-room-night quote multiplied by rooms and nights.
    pub fn hotel(quote: &Quote, rooms: i32, nights: i64) -> Result<Pricing, BookingError> {
        if rooms <= 0 {
            return Err(BookingError::InvalidQuantity(
                "At least one room is required".to_string(),
            ));
        }
        if nights <= 0 {
            return Err(BookingError::InvalidQuantity(
                "Check-out must be after check-in".to_string(),
            ));
        }
        let base = quote.base_price.ok_or(BookingError::MissingQuote)?;
        let n = Decimal::from(rooms) * Decimal::from(nights);

        Ok(Self::compose(
            base * n,
            quote.taxes * n,
            quote.fees * n,
            Decimal::ZERO,
            &quote.currency,
        ))
    }

    /// Cab fare: `(base_rate + distance * per_km_rate) * surge_multiplier`.
    /// Distance is the haversine great-circle distance between pickup and
    /// dropoff; with no dropoff the fare reflects the base rate only.
    pub fn cab(
        base_rate: Decimal,
        per_km_rate: Decimal,
        surge_multiplier: Decimal,
        pickup: &Coordinates,
        dropoff: Option<&Coordinates>,
        currency: &str,
    ) -> Pricing {
        let distance_km = dropoff.map_or(0.0, |d| haversine_km(pickup, d));
        let distance = Decimal::from_f64(distance_km).unwrap_or(Decimal::ZERO);
        let fare = (base_rate + distance * per_km_rate) * surge_multiplier;

        Self::compose(fare, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, currency)
    }

    /// Package pricing: sum of per-traveler-type unit prices, with the
    /// group discount applied only when the traveler count reaches the
    /// threshold.
    pub fn package(
        rates: &PackageRates,
        travelers: &[TravelerType],
    ) -> Result<Pricing, BookingError> {
        if travelers.is_empty() {
            return Err(BookingError::InvalidQuantity(
                "At least one traveler is required".to_string(),
            ));
        }

        let base: Decimal = travelers.iter().map(|t| rates.unit_price(*t)).sum();

        let discounts = match &rates.group_discount {
            Some(gd) if travelers.len() as i32 >= gd.min_people => {
                base * gd.discount_percent / Decimal::from(100)
            }
            _ => Decimal::ZERO,
        };

        Ok(Self::compose(
            base,
            Decimal::ZERO,
            Decimal::ZERO,
            discounts,
            &rates.currency,
        ))
    }

    /// Assemble the breakdown. Components stay exact; only the total is
    /// rounded, once.
    fn compose(
        base_price: Decimal,
        taxes: Decimal,
        fees: Decimal,
        discounts: Decimal,
        currency: &str,
    ) -> Pricing {
        let total = round_money(base_price + taxes + fees - discounts);
        Pricing {
            base_price,
            taxes,
            fees,
            discounts,
            total,
            currency: currency.to_string(),
        }
    }
}

/// Great-circle distance in kilometres between two coordinate pairs.
pub fn haversine_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote(base: Decimal, taxes: Decimal, fees: Decimal) -> Quote {
        Quote {
            base_price: Some(base),
            taxes,
            fees,
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn test_flight_pricing_scales_with_passengers() {
        let pricing = PricingCalculator::flight(&quote(dec!(200), dec!(30), dec!(10)), 3).unwrap();
        assert_eq!(pricing.base_price, dec!(600));
        assert_eq!(pricing.taxes, dec!(90));
        assert_eq!(pricing.fees, dec!(30));
        assert_eq!(pricing.total, dec!(720));
    }

    #[test]
    fn test_flight_pricing_zero_passengers_rejected() {
        let err = PricingCalculator::flight(&quote(dec!(200), dec!(0), dec!(0)), 0).unwrap_err();
        assert!(matches!(err, BookingError::InvalidQuantity(_)));
    }

    #[test]
    fn test_flight_pricing_missing_quote() {
        let q = Quote {
            base_price: None,
            taxes: dec!(10),
            fees: dec!(0),
            currency: "USD".to_string(),
        };
        let err = PricingCalculator::flight(&q, 1).unwrap_err();
        assert!(matches!(err, BookingError::MissingQuote));
    }

    #[test]
    fn test_hotel_pricing_rooms_times_nights() {
        let pricing = PricingCalculator::hotel(&quote(dec!(100), dec!(12), dec!(8)), 2, 3).unwrap();
        assert_eq!(pricing.base_price, dec!(600));
        assert_eq!(pricing.taxes, dec!(72));
        assert_eq!(pricing.fees, dec!(48));
        assert_eq!(pricing.total, dec!(720));
    }

    #[test]
    fn test_hotel_pricing_invalid_nights() {
        let err = PricingCalculator::hotel(&quote(dec!(100), dec!(0), dec!(0)), 1, 0).unwrap_err();
        assert!(matches!(err, BookingError::InvalidQuantity(_)));
    }

    #[test]
    fn test_cab_fare_without_dropoff_is_base_rate_only() {
        let pickup = Coordinates {
            latitude: 40.7128,
            longitude: -74.0060,
        };
        let pricing =
            PricingCalculator::cab(dec!(5), dec!(2), dec!(1), &pickup, None, "USD");
        assert_eq!(pricing.total, dec!(5));
    }

    #[test]
    fn test_cab_fare_applies_surge() {
        let pickup = Coordinates {
            latitude: 0.0,
            longitude: 0.0,
        };
        // ~111.19 km along a meridian per degree of latitude.
        let dropoff = Coordinates {
            latitude: 1.0,
            longitude: 0.0,
        };
        let pricing = PricingCalculator::cab(
            dec!(10),
            dec!(2),
            dec!(1.5),
            &pickup,
            Some(&dropoff),
            "USD",
        );
        // fare = (10 + 111.19 * 2) * 1.5 ~= 348.6 -> 349
        assert_eq!(pricing.total, dec!(349));
    }

    #[test]
    fn test_package_pricing_group_discount_threshold() {
        let rates = PackageRates {
            adult: dec!(400),
            child: dec!(200),
            infant: dec!(0),
            currency: "USD".to_string(),
            group_discount: Some(GroupDiscount {
                min_people: 4,
                discount_percent: dec!(10),
            }),
        };

        // Below threshold: no discount.
        let small = PricingCalculator::package(
            &rates,
            &[TravelerType::Adult, TravelerType::Adult, TravelerType::Child],
        )
        .unwrap();
        assert_eq!(small.discounts, dec!(0));
        assert_eq!(small.total, dec!(1000));

        // Five travelers clear the threshold: 10% off the pre-discount sum.
        let travelers = [
            TravelerType::Adult,
            TravelerType::Adult,
            TravelerType::Adult,
            TravelerType::Adult,
            TravelerType::Child,
        ];
        let large = PricingCalculator::package(&rates, &travelers).unwrap();
        assert_eq!(large.base_price, dec!(1800));
        assert_eq!(large.discounts, dec!(180));
        assert_eq!(large.total, dec!(1620));
    }

    #[test]
    fn test_package_pricing_empty_travelers_rejected() {
        let rates = PackageRates {
            adult: dec!(400),
            child: dec!(200),
            infant: dec!(0),
            currency: "USD".to_string(),
            group_discount: None,
        };
        let err = PricingCalculator::package(&rates, &[]).unwrap_err();
        assert!(matches!(err, BookingError::InvalidQuantity(_)));
    }

    #[test]
    fn test_haversine_known_distance() {
        // New York -> Los Angeles, great-circle ~3936 km.
        let nyc = Coordinates {
            latitude: 40.7128,
            longitude: -74.0060,
        };
        let la = Coordinates {
            latitude: 34.0522,
            longitude: -118.2437,
        };
        let d = haversine_km(&nyc, &la);
        assert!((d - 3936.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn test_haversine_zero_distance() {
        let p = Coordinates {
            latitude: 12.5,
            longitude: 99.9,
        };
        assert_eq!(haversine_km(&p, &p), 0.0);
    }
}
